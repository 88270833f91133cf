//! Storage abstraction trait and common types.

use std::io::{Read, Write};

use crate::error::{Result, SolaceError};

/// A backend that stores opaque blobs under exact names.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a blob for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a blob for writing. Its contents are complete
    /// only once the output is closed.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    fn file_exists(&self, name: &str) -> bool;

    /// Delete a blob. Deleting a missing blob is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// Names of all stored blobs, sorted.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Size of a blob in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;

    /// Rename a blob, replacing any blob already under `new_name`.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;
}

/// A readable blob.
pub trait StorageInput: Read + Send + std::fmt::Debug {}

impl<T: Read + Send + std::fmt::Debug> StorageInput for T {}

/// A writable blob.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffered bytes and make them durable.
    fn close(&mut self) -> Result<()>;
}

/// Configuration for storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Buffer size for reads and writes.
    pub buffer_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 64 * 1024,
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Blob not found.
    FileNotFound(String),

    /// I/O error.
    IoError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for SolaceError {
    fn from(err: StorageError) -> Self {
        SolaceError::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        assert_eq!(StorageConfig::default().buffer_size, 65536);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("classifier".to_string());
        assert_eq!(err.to_string(), "File not found: classifier");

        let err = StorageError::IoError("disk full".to_string());
        assert_eq!(err.to_string(), "I/O error: disk full");

        let err: SolaceError = StorageError::IoError("disk full".to_string()).into();
        assert_eq!(err.to_string(), "Storage error: I/O error: disk full");
    }
}
