//! Relations between entities
//!
//! A relation is bound to one parent model and one key. Resolving it yields a
//! [`RelationValue`] that the parent caches under the relation's name.

pub mod belongs_to;
pub mod belongs_to_many;
pub mod has_many;
pub mod has_many_array;
pub mod value;

pub use belongs_to::BelongsTo;
pub use belongs_to_many::BelongsToMany;
pub use has_many::HasMany;
pub use has_many_array::HasManyArray;
pub use value::{Model, RelationValue};

use crate::entity::Entity;
use crate::errors::ObjectModelResult;
use crate::model::ObjectModel;
use crate::naming::{lcfirst, pluralize};
use crate::query_builder::Query;
use async_trait::async_trait;

#[async_trait]
pub trait Relation: Send {
    async fn get_results(&mut self) -> ObjectModelResult<RelationValue>;

    fn boxed<'a>(self) -> Box<dyn Relation + 'a>
    where
        Self: Sized + 'a,
    {
        Box::new(self)
    }
}

/// A relation resolved by running a constrained query
pub trait RelationWithQuery<T: Entity>: Relation {
    fn query(&self) -> &Query<T>;

    fn query_mut(&mut self) -> &mut Query<T>;

    /// Narrow the relation's query further before it runs
    fn constrain<F>(&mut self, build: F) -> &mut Self
    where
        Self: Sized,
        F: FnOnce(Query<T>) -> Query<T>,
    {
        let query = self.query().clone();
        *self.query_mut() = build(query);
        self
    }
}

impl<E: Entity> ObjectModel<E> {
    /// The single `T` the pointer at `key` references
    pub fn belongs_to<T: Entity>(&self, key: &str) -> BelongsTo<T> {
        BelongsTo::new(self, key)
    }

    /// Every `T` in the pointer array at `key`
    pub fn belongs_to_many<T: Entity>(&mut self, key: &str) -> BelongsToMany<'_, E, T> {
        BelongsToMany::new(self, key)
    }

    /// Every `T` whose `foreign_key` points at this model. The key defaults to
    /// this entity's class name with a lowercase first letter.
    pub fn has_many<T: Entity>(&self, foreign_key: Option<&str>) -> HasMany<T> {
        let foreign_key = foreign_key
            .map(str::to_string)
            .unwrap_or_else(|| lcfirst(E::CLASS_NAME));
        HasMany::new(Query::new(self.context().clone()), self, &foreign_key)
    }

    /// Every `T` whose `foreign_key` array contains this model. The key
    /// defaults to the plural of the has-many default.
    pub fn has_many_array<T: Entity>(&self, foreign_key: Option<&str>) -> HasManyArray<T> {
        let foreign_key = foreign_key
            .map(str::to_string)
            .unwrap_or_else(|| pluralize(&lcfirst(E::CLASS_NAME)));
        HasManyArray::new(Query::new(self.context().clone()), self, &foreign_key)
    }
}
