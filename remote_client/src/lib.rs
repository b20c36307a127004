//! Remote client for Parse-style object stores
//!
//! This crate is the collaborator every ParseHaus model talks to. It knows the
//! REST dialect (constraint JSON, typed values, field operations) and nothing
//! about entities or relations.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod acl;
pub mod errors;
pub mod http;
pub mod memory;
pub mod object;
pub mod operation;
pub mod prelude;
pub mod query;
pub mod store;
pub mod value;

pub use acl::{Acl, Permissions};
pub use errors::{ClientError, ClientResult};
pub use http::HttpStore;
pub use memory::{MemoryStore, RequestRecord};
pub use object::RemoteObject;
pub use operation::FieldOperation;
pub use query::RemoteQuery;
pub use store::{JsonMap, ObjectStore, QueryParams, SaveResponse};
pub use value::{AttrValue, FileRef};

/// Remote class holding user accounts
pub const USER_CLASS: &str = "_User";
