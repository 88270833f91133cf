//! Directory-backed storage: one file per blob.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SolaceError};
use crate::storage::traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};

/// Stores each blob as a regular file directly under `directory`.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
    config: StorageConfig,
}

impl FileStorage {
    /// Storage over `directory`, creating it if needed.
    pub fn new<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).map_err(|e| {
            SolaceError::storage(format!("cannot create {}: {e}", directory.display()))
        })?;

        Self::open(directory, config)
    }

    /// Storage over an existing directory.
    ///
    /// Training and serving only read artifacts, so a mistyped path must
    /// surface as a missing input rather than as an empty store.
    pub fn open<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.is_dir() {
            return Err(SolaceError::missing_input(format!(
                "artifact directory {} does not exist",
                directory.display()
            )));
        }

        Ok(FileStorage { directory, config })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn io_error(name: &str, e: std::io::Error) -> StorageError {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::FileNotFound(name.to_string()),
            _ => StorageError::IoError(format!("{name}: {e}")),
        }
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let file = File::open(self.path(name)).map_err(|e| Self::io_error(name, e))?;
        Ok(Box::new(BufReader::with_capacity(self.config.buffer_size, file)))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        let file = File::create(self.path(name)).map_err(|e| Self::io_error(name, e))?;
        Ok(Box::new(FileOutput {
            writer: BufWriter::with_capacity(self.config.buffer_size, file),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(name, e).into()),
        }
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.directory)
            .map_err(|e| StorageError::IoError(format!("{}: {e}", self.directory.display())))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::IoError(e.to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            // Names that are not UTF-8 cannot be artifacts.
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let metadata = fs::metadata(self.path(name)).map_err(|e| Self::io_error(name, e))?;
        Ok(metadata.len())
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        fs::rename(self.path(old_name), self.path(new_name))
            .map_err(|e| Self::io_error(old_name, e))?;
        Ok(())
    }
}

/// Buffered writer that fsyncs on close.
#[derive(Debug)]
struct FileOutput {
    writer: BufWriter<File>,
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn close(&mut self) -> Result<()> {
        self.writer
            .flush()
            .and_then(|()| self.writer.get_ref().sync_all())
            .map_err(|e| SolaceError::storage(format!("failed to persist output: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_file_storage_write_read() {
        let (_temp_dir, storage) = create_test_storage();

        let mut output = storage.create_output("vectorizer").unwrap();
        output.write_all(b"Hello, World!").unwrap();
        output.close().unwrap();

        assert!(storage.file_exists("vectorizer"));
        assert_eq!(storage.file_size("vectorizer").unwrap(), 13);

        let mut input = storage.open_input("vectorizer").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();
        assert_eq!(buffer, b"Hello, World!");
    }

    #[test]
    fn test_small_buffer_flushes_on_close() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path(), StorageConfig { buffer_size: 4 }).unwrap();

        let mut output = storage.create_output("train_labels").unwrap();
        output.write_all(b"depression,anxiety").unwrap();
        output.close().unwrap();

        let content = std::fs::read(temp_dir.path().join("train_labels")).unwrap();
        assert_eq!(content, b"depression,anxiety");
    }

    #[test]
    fn test_file_storage_missing_file() {
        let (_temp_dir, storage) = create_test_storage();

        assert!(!storage.file_exists("classifier"));
        let err = storage.open_input("classifier").unwrap_err();
        assert!(err.to_string().contains("File not found: classifier"));
        assert!(storage.file_size("classifier").is_err());
    }

    #[test]
    fn test_file_storage_rename_and_list() {
        let (temp_dir, storage) = create_test_storage();

        let mut output = storage.create_output("a.tmp").unwrap();
        output.write_all(b"x").unwrap();
        output.close().unwrap();
        storage.rename_file("a.tmp", "a").unwrap();

        let mut output = storage.create_output("b").unwrap();
        output.write_all(b"y").unwrap();
        output.close().unwrap();

        // Subdirectories are not blobs
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["a", "b"]);

        storage.delete_file("a").unwrap();
        storage.delete_file("a").unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_open_requires_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = FileStorage::open(&missing, StorageConfig::default()).unwrap_err();
        assert!(err.is_missing());
        assert!(!missing.exists());
    }
}
