use super::{Relation, RelationValue, RelationWithQuery};
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use crate::model::ObjectModel;
use crate::query_builder::Query;
use async_trait::async_trait;
use remote_client::{AttrValue, RemoteObject};

/// Children whose foreign key points at the parent
pub struct HasMany<T: Entity> {
    query: Query<T>,
    parent: RemoteObject,
    foreign_key: String,
}

impl<T: Entity> HasMany<T> {
    pub fn new<P: Entity>(query: Query<T>, parent: &ObjectModel<P>, foreign_key: &str) -> Self {
        let parent = parent.remote().clone();
        let query = query.where_eq(foreign_key, &parent);
        Self {
            query,
            parent,
            foreign_key: foreign_key.to_string(),
        }
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    fn parent_pointer(&self) -> AttrValue {
        AttrValue::from(&self.parent)
    }

    pub async fn results(&self) -> ObjectModelResult<Vec<ObjectModel<T>>> {
        self.query.get(None).await
    }

    /// Build a child from `data`, link it to the parent and save it
    pub async fn create<I, K, V>(&self, data: I) -> ObjectModelResult<ObjectModel<T>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let model = ObjectModel::with_data(self.query.context(), data);
        self.save(model).await
    }

    /// Point the child's foreign key at the parent and save it
    pub async fn save(&self, mut model: ObjectModel<T>) -> ObjectModelResult<ObjectModel<T>> {
        model.set(&self.foreign_key, self.parent_pointer());
        model.save().await?;
        Ok(model)
    }
}

#[async_trait]
impl<T: Entity> Relation for HasMany<T> {
    async fn get_results(&mut self) -> ObjectModelResult<RelationValue> {
        Ok(RelationValue::many_of(self.results().await?))
    }
}

impl<T: Entity> RelationWithQuery<T> for HasMany<T> {
    fn query(&self) -> &Query<T> {
        &self.query
    }

    fn query_mut(&mut self) -> &mut Query<T> {
        &mut self.query
    }
}
