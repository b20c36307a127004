//! Convenience re-exports for declaring entities and working with models

// Entities and models
pub use crate::context::ModelContext;
pub use crate::entity::{Entity, ParseUser, RelationDef, UserEntity};
pub use crate::model::{Attribute, ObjectModel};

// Queries
pub use crate::query_builder::{Operator, OrOperand, Query};

// Relations
pub use crate::relations::{
    BelongsTo, BelongsToMany, HasMany, HasManyArray, Relation, RelationValue, RelationWithQuery,
};

// Error types
pub use crate::errors::{ObjectModelError, ObjectModelResult};

// Values from the remote client
pub use remote_client::prelude::*;
