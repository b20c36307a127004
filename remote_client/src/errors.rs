//! Error types for remote store operations

use thiserror::Error;

/// Error code the server uses for a missing object or class
pub const OBJECT_NOT_FOUND: i64 = 101;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Server error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Object of class {0} has no objectId")]
    MissingObjectId(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl ClientError {
    pub fn server(code: i64, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    pub fn object_not_found() -> Self {
        Self::server(OBJECT_NOT_FOUND, "Object not found.")
    }

    /// Server error code, if the failure came from the remote side
    pub fn code(&self) -> Option<i64> {
        match self {
            ClientError::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
