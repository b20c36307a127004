//! # ParseHaus
//!
//! An ORM layer for Parse-style object stores: entity queries, relations
//! resolved on first access, and plain-mapping serialization.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parsehaus::prelude::*;
//! use std::sync::Arc;
//!
//! struct Post;
//!
//! impl Entity for Post {
//!     const CLASS_NAME: &'static str = "Post";
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::new(
//!         ServerConfig::new(
//!             "my-app".to_string(),
//!             Some("rest-key".to_string()),
//!             None,
//!             "https://api.example.com".to_string(),
//!             "parse".to_string(),
//!         ),
//!         ModelConfig::default(),
//!     );
//!     let parsehaus = ParseHaus::with_store(config, Arc::new(MemoryStore::new()));
//!     let ctx = parsehaus.context();
//!
//!     let post = ObjectModel::<Post>::create(ctx, [("title", "Hello")]).await?;
//!     let found = Post::query(ctx).where_eq("title", "Hello").first_or_fail(None).await?;
//!     assert_eq!(found.id(), post.id());
//!     println!("{}", found.to_json());
//!
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::ParseHaus;
pub use errors::ParseHausError;

// Re-export centralized config
pub use config::{AppConfig, ModelConfig, ServerConfig};

// Re-export the member crates and their logging macros
pub use object_model;
pub use remote_client;
pub use remote_client::{debug_log, trace_log};

// Re-export external dependencies used in public API
pub use async_trait;
