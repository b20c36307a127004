//! Operands of an `$or` composition

use super::Query;
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use remote_client::RemoteQuery;

/// Deferred query construction; receives a fresh query of the same context
pub type QueryBuilderFn<E> = Box<dyn FnOnce(Query<E>) -> ObjectModelResult<Query<E>> + Send>;

pub enum OrOperand<E: Entity> {
    Query(Query<E>),
    Remote(RemoteQuery),
    Builder(QueryBuilderFn<E>),
}

impl<E: Entity> OrOperand<E> {
    pub fn builder<F>(build: F) -> Self
    where
        F: FnOnce(Query<E>) -> ObjectModelResult<Query<E>> + Send + 'static,
    {
        OrOperand::Builder(Box::new(build))
    }
}

impl<E: Entity> From<Query<E>> for OrOperand<E> {
    fn from(query: Query<E>) -> Self {
        OrOperand::Query(query)
    }
}

impl<E: Entity> From<RemoteQuery> for OrOperand<E> {
    fn from(query: RemoteQuery) -> Self {
        OrOperand::Remote(query)
    }
}

/// Borrow the remote query behind a query-like value
pub trait AsRemoteQuery {
    fn as_remote_query(&self) -> &RemoteQuery;
}

impl AsRemoteQuery for RemoteQuery {
    fn as_remote_query(&self) -> &RemoteQuery {
        self
    }
}

impl<E: Entity> AsRemoteQuery for Query<E> {
    fn as_remote_query(&self) -> &RemoteQuery {
        self.remote()
    }
}
