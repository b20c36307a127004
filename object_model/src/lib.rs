//! Entity models for Parse-style object stores
//!
//! An [`Entity`] names a remote class and declares its relations. Models of
//! that entity are read and written as [`ObjectModel`]s, found through
//! [`Query`] and linked to each other through the relation types in
//! [`relations`].

pub mod context;
pub mod entity;
pub mod errors;
pub mod model;
pub mod naming;
pub mod prelude;
pub mod query_builder;
pub mod relations;

pub use context::ModelContext;
pub use entity::{Entity, ParseUser, RelationDef, RelationFactory, UserEntity};
pub use errors::{ObjectModelError, ObjectModelResult};
pub use model::{Attribute, ObjectModel};
pub use query_builder::{AsRemoteQuery, IntoKeys, Operator, OrOperand, Query, QueryBuilderFn};
pub use relations::{
    BelongsTo, BelongsToMany, HasMany, HasManyArray, Model, Relation, RelationValue,
    RelationWithQuery,
};
