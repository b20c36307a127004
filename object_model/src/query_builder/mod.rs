//! Query builder utilities
//!
//! This module provides entity query construction on top of remote queries.

pub mod builder;
pub mod keys;
pub mod operator;
pub mod or_query;

#[cfg(test)]
mod tests;

pub use builder::Query;
pub use keys::IntoKeys;
pub use operator::Operator;
pub use or_query::{AsRemoteQuery, OrOperand, QueryBuilderFn};
