//! Storage held in process memory, used by tests and throwaway stores.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::storage::traits::{Storage, StorageError, StorageInput, StorageOutput};

type Blobs = Arc<RwLock<BTreeMap<String, Arc<[u8]>>>>;

/// Blobs kept in a shared map.
///
/// A blob is published when its output is closed or dropped; until then
/// readers see the previous contents, if any.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Blobs,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let blob = self
            .blobs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;

        Ok(Box::new(Cursor::new(blob)))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput {
            name: name.to_string(),
            pending: Some(Vec::new()),
            blobs: Arc::clone(&self.blobs),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.blobs.read().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.blobs.write().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        Ok(self.blobs.read().keys().cloned().collect())
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        self.blobs
            .read()
            .get(name)
            .map(|blob| blob.len() as u64)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()).into())
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut blobs = self.blobs.write();
        let blob = blobs
            .remove(old_name)
            .ok_or_else(|| StorageError::FileNotFound(old_name.to_string()))?;

        blobs.insert(new_name.to_string(), blob);
        Ok(())
    }
}

/// Collects bytes and publishes them as one blob.
#[derive(Debug)]
struct MemoryOutput {
    name: String,
    /// `None` once published.
    pending: Option<Vec<u8>>,
    blobs: Blobs,
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(std::io::Error::other(format!("{} is already closed", self.name))),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn close(&mut self) -> Result<()> {
        if let Some(pending) = self.pending.take() {
            self.blobs.write().insert(self.name.clone(), pending.into());
        }
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
