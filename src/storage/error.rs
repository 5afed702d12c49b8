use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("failed to finalize {path}: {source}")]
    Finalize {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to scan artifact directory: {0}")]
    Scan(#[from] walkdir::Error),
}
