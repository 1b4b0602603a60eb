use querymcp_core::errors::StorageError;
use thiserror::Error;

pub mod invocation_log;

pub use invocation_log::SqlInvocationLog;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for StorageError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) => StorageError::Database(error.to_string()),
            RepositoryError::Decode(message) => StorageError::Serialization(message),
        }
    }
}
