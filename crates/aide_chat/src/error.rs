//! Error types for the chat layer.

use thiserror::Error;

/// Result type alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors that can occur during conversation handling.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Completion service error: {0}")]
    Completion(String),

    #[error(transparent)]
    Store(#[from] aide_store::StoreError),
}
