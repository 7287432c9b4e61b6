//! Error types for the textcat library.
//!
//! Every fallible operation returns [`Result`], whose error side is the
//! [`TextCatError`] enum. All failures in the training and inference core are
//! deterministic for a given input, so nothing here is meant to be retried.
//!
//! # Examples
//!
//! ```
//! use textcat::error::{Result, TextCatError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TextCatError::config("feature count must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for textcat operations.
#[derive(Error, Debug)]
pub enum TextCatError {
    /// I/O errors (record files, index files, result files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index-related errors.
    #[error("Index error: {0}")]
    Index(String),

    /// Malformed record line.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A document key the index cannot resolve.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// A posting referencing a term outside the vocabulary.
    #[error("Term id {term_id} is outside the vocabulary [0, {vocabulary_size}]")]
    TermOutOfRange { term_id: u32, vocabulary_size: u32 },

    /// The training stream produced no documents.
    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// A label other than 0 or 1.
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Internal failures such as thread pool construction.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with TextCatError.
pub type Result<T> = std::result::Result<T, TextCatError>;

impl TextCatError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        TextCatError::Config(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        TextCatError::Index(msg.into())
    }

    /// Create a new parse error for the given 1-based line number.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        TextCatError::Parse {
            line,
            message: msg.into(),
        }
    }

    /// Create a new document-not-found error.
    pub fn document_not_found<S: Into<String>>(key: S) -> Self {
        TextCatError::DocumentNotFound(key.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        TextCatError::Internal(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TextCatError::Other(msg.into())
    }
}
