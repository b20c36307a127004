//! Pointer-array relation
//!
//! The parent keeps an array of pointers at `key`. Every pointer is wrapped
//! when the relation is built, so resolving it needs no round-trip.

use super::{Relation, RelationValue};
use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use crate::model::ObjectModel;
use async_trait::async_trait;
use remote_client::AttrValue;

pub struct BelongsToMany<'a, P: Entity, T: Entity> {
    parent: &'a mut ObjectModel<P>,
    key: String,
    collection: Vec<ObjectModel<T>>,
    children_queue: Vec<ObjectModel<T>>,
}

impl<'a, P: Entity, T: Entity> BelongsToMany<'a, P, T> {
    pub fn new(parent: &'a mut ObjectModel<P>, key: &str) -> Self {
        let mut collection = Vec::new();
        if let Some(AttrValue::Array(items)) = parent.attribute(key) {
            for item in items {
                match item {
                    AttrValue::Pointer(object) => collection.push(ObjectModel::from_remote(
                        object.as_ref().clone(),
                        parent.context(),
                    )),
                    other => tracing::warn!(
                        model = P::CLASS_NAME,
                        key,
                        "skipping {} in pointer array",
                        other.type_name()
                    ),
                }
            }
        }

        Self {
            parent,
            key: key.to_string(),
            collection,
            children_queue: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Members in stored order, including ones added through this relation
    pub fn collection(&self) -> &[ObjectModel<T>] {
        &self.collection
    }

    /// Members added through this relation
    pub fn children_queue(&self) -> &[ObjectModel<T>] {
        &self.children_queue
    }

    pub fn parent(&self) -> &ObjectModel<P> {
        self.parent
    }

    fn array_len(&self) -> usize {
        self.parent
            .attribute(&self.key)
            .map(AttrValue::array_len)
            .unwrap_or(0)
    }

    /// Append `others` to the parent's array and save the parent.
    ///
    /// With `unique` a member already in the array is not added again. A
    /// member counts as added when the array grew.
    pub async fn save<I>(&mut self, others: I, unique: bool) -> ObjectModelResult<()>
    where
        I: IntoIterator<Item = ObjectModel<T>>,
        I::IntoIter: Send,
    {
        for mut other in others {
            // pointers can only be stored for saved objects
            if other.id().is_none() {
                other.save().await?;
            }
            self.add_one(other, unique);
        }
        self.parent.save().await?;
        Ok(())
    }

    fn add_one(&mut self, other: ObjectModel<T>, unique: bool) {
        let before = self.array_len();
        let pointer = AttrValue::from(&other);
        if unique {
            self.parent.add_unique(&self.key, vec![pointer]);
        } else {
            self.parent.add(&self.key, vec![pointer]);
        }

        if before < self.array_len() {
            self.children_queue.push(other.clone());
            self.collection.push(other);
        }
    }
}

#[async_trait]
impl<'a, P: Entity, T: Entity> Relation for BelongsToMany<'a, P, T> {
    async fn get_results(&mut self) -> ObjectModelResult<RelationValue> {
        Ok(RelationValue::many_of(self.collection.clone()))
    }
}
