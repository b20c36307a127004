//! Convenience re-exports for common remote-client usage

// Values and objects
pub use crate::acl::{Acl, Permissions};
pub use crate::object::RemoteObject;
pub use crate::operation::FieldOperation;
pub use crate::value::{AttrValue, FileRef};

// Queries
pub use crate::query::RemoteQuery;

// Stores
pub use crate::http::HttpStore;
pub use crate::memory::{MemoryStore, RequestRecord};
pub use crate::store::{JsonMap, ObjectStore, QueryParams, SaveResponse};
pub use crate::USER_CLASS;

// Error types
pub use crate::errors::{ClientError, ClientResult};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
