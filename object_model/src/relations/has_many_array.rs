use super::{Relation, RelationValue, RelationWithQuery};
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use crate::model::ObjectModel;
use crate::query_builder::Query;
use async_trait::async_trait;
use remote_client::AttrValue;

/// Children whose foreign key holds an array of parent pointers
pub struct HasManyArray<T: Entity> {
    query: Query<T>,
    parent: AttrValue,
    foreign_key: String,
}

impl<T: Entity> HasManyArray<T> {
    pub fn new<P: Entity>(query: Query<T>, parent: &ObjectModel<P>, foreign_key: &str) -> Self {
        let parent = AttrValue::from(parent.remote());
        let query = query.contained_in(foreign_key, vec![parent.clone()]);
        Self {
            query,
            parent,
            foreign_key: foreign_key.to_string(),
        }
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub async fn results(&self) -> ObjectModelResult<Vec<ObjectModel<T>>> {
        self.query.get(None).await
    }

    pub async fn create<I, K, V>(&self, data: I) -> ObjectModelResult<ObjectModel<T>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let model = ObjectModel::with_data(self.query.context(), data);
        self.save(model).await
    }

    /// Add the parent to the child's foreign key array, once, and save it
    pub async fn save(&self, mut model: ObjectModel<T>) -> ObjectModelResult<ObjectModel<T>> {
        model.add_unique(&self.foreign_key, vec![self.parent.clone()]);
        model.save().await?;
        Ok(model)
    }
}

#[async_trait]
impl<T: Entity> Relation for HasManyArray<T> {
    async fn get_results(&mut self) -> ObjectModelResult<RelationValue> {
        Ok(RelationValue::many_of(self.results().await?))
    }
}

impl<T: Entity> RelationWithQuery<T> for HasManyArray<T> {
    fn query(&self) -> &Query<T> {
        &self.query
    }

    fn query_mut(&mut self) -> &mut Query<T> {
        &mut self.query
    }
}
