use remote_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ObjectModelError {
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    #[error("No query results for model [{model}]")]
    NotFound { model: &'static str },

    #[error(transparent)]
    RemoteService(#[from] ClientError),

    #[error("Malformed argument: {0}")]
    MalformedArgument(String),
}

impl ObjectModelError {
    pub fn not_found<E: 'static>() -> Self {
        Self::NotFound {
            model: std::any::type_name::<E>(),
        }
    }
}

pub type ObjectModelResult<T> = Result<T, ObjectModelError>;
