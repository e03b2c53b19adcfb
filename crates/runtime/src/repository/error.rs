//! Error types raised by turn log implementations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted turn log: {0}")]
    CorruptedData(String),

    #[error("turn log {0} could not be rolled back after a failed flush")]
    Poisoned(String),

    #[error("log already exists: {0}")]
    LogAlreadyExists(String),

    #[error("invalid offset {offset} for log size {size}")]
    InvalidOffset { offset: u64, size: u64 },

    #[error("truncated entry at offset {offset}: expected {expected} bytes, found {actual}")]
    PartialWrite {
        offset: u64,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
