//! Core ParseHaus functionality
//!
//! [`ParseHaus`] turns an [`AppConfig`] into the store connection and the
//! [`ModelContext`] every model and query is built with.

use std::sync::Arc;

use crate::errors::ParseHausError;
use config::AppConfig;
use object_model::context::ModelContext;
use remote_client::{HttpStore, ObjectStore};

/// Entry point holding the configured store and default model context
#[derive(Debug, Clone)]
pub struct ParseHaus {
    config: AppConfig,
    context: ModelContext,
}

impl ParseHaus {
    /// Connect to the server described by `config`
    pub fn new(config: AppConfig) -> Result<Self, ParseHausError> {
        config.validate()?;
        let store = HttpStore::new(&config.server)?;
        tracing::info!(
            app_id = %config.server.app_id,
            base_url = %config.server.base_url(),
            "ParseHaus configured"
        );
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Load the configuration file and connect
    pub fn from_env() -> Result<Self, ParseHausError> {
        Self::new(AppConfig::load()?)
    }

    /// Use `store` instead of the HTTP client, e.g. a
    /// [`MemoryStore`](remote_client::MemoryStore) in tests
    pub fn with_store(config: AppConfig, store: Arc<dyn ObjectStore>) -> Self {
        let context =
            ModelContext::new(store).with_master_key(config.model.default_use_master_key);
        Self { config, context }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Context new models and queries start from
    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.context.shared_store()
    }

    /// Check that the server answers
    pub async fn health(&self) -> Result<(), ParseHausError> {
        self.context.store().health().await?;
        Ok(())
    }
}
