//! Error types for the build pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that can occur while planning, generating or previewing.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to clean directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No free preview port available")]
    NoFreePort,

    #[error("Preview server did not become ready on port {port}")]
    PreviewNotReady { port: u16 },

    #[error("Preview copy failed: {0}")]
    PreviewCopy(#[from] fs_extra::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] aide_store::StoreError),
}
