//! Error types for the ParseHaus crate
//!
//! Model and query operations return [`object_model::ObjectModelError`];
//! this type covers setting ParseHaus itself up.

use config::ConfigError;
use remote_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseHausError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote client error: {0}")]
    Client(#[from] ClientError),
}
