//! Convenience re-exports for common ParseHaus usage
//!
//! This prelude module re-exports the most commonly used items from the ParseHaus ecosystem,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use parsehaus::prelude::*;
//!
//! // Entities, models, queries, relations and stores are now in scope
//! ```

// Core ParseHaus components
pub use crate::core::ParseHaus;
pub use crate::errors::ParseHausError;

// Re-export centralized config
pub use config::{AppConfig, ModelConfig, ServerConfig};

// Models, queries and relations
pub use object_model::prelude::*;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
