use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Invalid storage account key: {0}")]
    InvalidAccountKey(#[from] base64::DecodeError),

    #[error("Failed to {operation}: {message}")]
    Request { operation: String, message: String },

    #[error("Failed to {operation} (status {status}): {message}")]
    Status {
        operation: String,
        status: u16,
        message: String,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub(crate) fn request(operation: &str, err: impl std::fmt::Display) -> Self {
        StorageError::Request {
            operation: operation.to_string(),
            message: err.to_string(),
        }
    }
}
