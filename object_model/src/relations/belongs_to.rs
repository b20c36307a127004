use super::{Relation, RelationValue};
use crate::context::ModelContext;
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use crate::model::ObjectModel;
use async_trait::async_trait;
use remote_client::{AttrValue, RemoteObject};
use std::marker::PhantomData;

/// Single pointer from the parent to a `T`
pub struct BelongsTo<T: Entity> {
    key: String,
    target: Option<RemoteObject>,
    context: ModelContext,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> BelongsTo<T> {
    pub fn new<P: Entity>(parent: &ObjectModel<P>, key: &str) -> Self {
        let target = match parent.attribute(key) {
            Some(AttrValue::Pointer(object)) => Some(object.as_ref().clone()),
            Some(other) => {
                tracing::warn!(
                    model = P::CLASS_NAME,
                    key,
                    "belongs-to key holds {} instead of a pointer",
                    other.type_name()
                );
                None
            }
            None => None,
        };
        Self {
            key: key.to_string(),
            target,
            context: parent.context().clone(),
            _entity: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The related model, fetched unless its data is already loaded
    pub async fn resolve(&self) -> ObjectModelResult<Option<ObjectModel<T>>> {
        let Some(target) = &self.target else {
            return Ok(None);
        };
        let mut model = ObjectModel::<T>::from_remote(target.clone(), &self.context);
        model.fetch(false).await?;
        Ok(Some(model))
    }
}

#[async_trait]
impl<T: Entity> Relation for BelongsTo<T> {
    async fn get_results(&mut self) -> ObjectModelResult<RelationValue> {
        Ok(match self.resolve().await? {
            Some(model) => RelationValue::one_of(model),
            None => RelationValue::Empty,
        })
    }
}
