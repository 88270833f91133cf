//! Error types for the Solace library.
//!
//! All fallible operations in the training pipeline, the artifact store and
//! the agent context return [`SolaceError`]. Failures of the external emotion
//! service are deliberately *not* part of this enum: they are recoverable and
//! live in [`crate::responder::ServiceError`].
//!
//! # Examples
//!
//! ```
//! use solace::error::{SolaceError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SolaceError::missing_input("data/tweets.csv"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Solace operations.
#[derive(Error, Debug)]
pub enum SolaceError {
    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A dataset file is absent, unreadable, or lacks required rows/columns.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// A named artifact is absent from the artifact store.
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// A label that was never seen while fitting the encoder.
    #[error("Unseen label: {0:?}")]
    UnseenLabel(String),

    /// Artifacts that do not belong together (dimension or vocabulary mismatch).
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for operations that may fail with SolaceError.
pub type Result<T> = std::result::Result<T, SolaceError>;

impl SolaceError {
    /// Create a new missing input error.
    pub fn missing_input<S: Into<String>>(msg: S) -> Self {
        SolaceError::MissingInput(msg.into())
    }

    /// Create a new missing artifact error.
    pub fn missing_artifact<S: Into<String>>(name: S) -> Self {
        SolaceError::MissingArtifact(name.into())
    }

    /// Create a new unseen label error.
    pub fn unseen_label<S: Into<String>>(label: S) -> Self {
        SolaceError::UnseenLabel(label.into())
    }

    /// Create a new schema mismatch error.
    pub fn schema_mismatch<S: Into<String>>(msg: S) -> Self {
        SolaceError::SchemaMismatch(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        SolaceError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SolaceError::Storage(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SolaceError::InvalidConfig(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SolaceError::InvalidArgument(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        SolaceError::InvalidOperation(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SolaceError::SerializationError(msg.into())
    }

    /// Whether this error means a pipeline stage ran before its inputs existed.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            SolaceError::MissingInput(_) | SolaceError::MissingArtifact(_)
        )
    }
}

impl From<bincode::Error> for SolaceError {
    fn from(err: bincode::Error) -> Self {
        SolaceError::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = SolaceError::missing_input("data.csv");
        assert_eq!(error.to_string(), "Missing input: data.csv");

        let error = SolaceError::missing_artifact("classifier");
        assert_eq!(error.to_string(), "Missing artifact: classifier");

        let error = SolaceError::unseen_label("mystery");
        assert_eq!(error.to_string(), "Unseen label: \"mystery\"");

        let error = SolaceError::schema_mismatch("expected 5 features, found 3");
        assert_eq!(
            error.to_string(),
            "Schema mismatch: expected 5 features, found 3"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let solace_error = SolaceError::from(io_error);

        match solace_error {
            SolaceError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_codec_error_conversion() {
        let truncated: std::result::Result<Vec<String>, bincode::Error> = bincode::deserialize(&[1]);
        let error = SolaceError::from(truncated.unwrap_err());
        assert!(matches!(error, SolaceError::SerializationError(_)));

        let error = SolaceError::from(serde_json::from_str::<u32>("{").unwrap_err());
        assert!(matches!(error, SolaceError::Json(_)));
    }

    #[test]
    fn test_is_missing() {
        assert!(SolaceError::missing_input("x").is_missing());
        assert!(SolaceError::missing_artifact("x").is_missing());
        assert!(!SolaceError::unseen_label("x").is_missing());
    }
}
