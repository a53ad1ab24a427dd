use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the imorg library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source directory missing or not a directory
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A copied file's size does not match its source
    #[error("Copy verification failed for {path}: wrote {written} bytes, expected {expected}")]
    CopyVerification {
        path: PathBuf,
        written: u64,
        expected: u64,
    },

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}
