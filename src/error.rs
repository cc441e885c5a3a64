//! Error types for the Tessera library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`TesseraError`] enum.
//!
//! # Examples
//!
//! ```
//! use tessera::error::{Result, TesseraError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TesseraError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Tessera operations.
#[derive(Error, Debug)]
pub enum TesseraError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors (writer, transaction, store)
    #[error("Index error: {0}")]
    Index(String),

    /// Field conversion errors
    #[error("Field error: {0}")]
    Field(String),

    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Index definition errors
    #[error("Schema error: {0}")]
    Schema(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Error raised by user-supplied code (map transforms, batchers)
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TesseraError.
pub type Result<T> = std::result::Result<T, TesseraError>;

impl TesseraError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        TesseraError::Index(msg.into())
    }

    /// Create a new field error.
    pub fn field<S: Into<String>>(msg: S) -> Self {
        TesseraError::Field(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TesseraError::InvalidArgument(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        TesseraError::Storage(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        TesseraError::Schema(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        TesseraError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TesseraError::Other(msg.into())
    }
}

impl From<bincode::Error> for TesseraError {
    fn from(err: bincode::Error) -> Self {
        TesseraError::Serialization(err.to_string())
    }
}
