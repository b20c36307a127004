//! Model context
//!
//! Everything a model or query needs to reach the remote store: the store
//! handle and the privilege flag used for calls. A context is built once at
//! startup and handed to every factory and query explicitly.

use crate::entity::Entity;
use crate::query_builder::Query;
use remote_client::ObjectStore;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ModelContext {
    store: Arc<dyn ObjectStore>,
    use_master_key: bool,
}

impl ModelContext {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            use_master_key: false,
        }
    }

    /// Same store, different privilege flag
    pub fn with_master_key(&self, use_master_key: bool) -> Self {
        Self {
            store: Arc::clone(&self.store),
            use_master_key,
        }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn shared_store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    pub fn use_master_key(&self) -> bool {
        self.use_master_key
    }

    pub(crate) fn set_use_master_key(&mut self, use_master_key: bool) {
        self.use_master_key = use_master_key;
    }

    /// Start a query on `E`
    pub fn query<E: Entity>(&self) -> Query<E> {
        Query::new(self.clone())
    }
}
