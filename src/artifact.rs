//! Named, bincode-encoded artifacts produced by the training pipeline.
//!
//! Every artifact lives under one exact name in a [`Storage`] backend. Writes
//! go to a temporary name first and are renamed into place once complete, so
//! a failed write never leaves a partial artifact under the real name.
//!
//! # Example
//!
//! ```
//! use solace::artifact::{ArtifactKey, ArtifactStore};
//!
//! let store = ArtifactStore::in_memory();
//! store.save(ArtifactKey::TrainLabels, &vec!["anxiety".to_string()]).unwrap();
//!
//! let labels: Vec<String> = store.load(ArtifactKey::TrainLabels).unwrap();
//! assert_eq!(labels, vec!["anxiety"]);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SolaceError};
use crate::storage::{FileStorage, MemoryStorage, Storage, StorageConfig};

/// Suffix for in-flight writes.
const TEMP_SUFFIX: &str = ".tmp";

/// The artifacts exchanged between pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    Vectorizer,
    LabelEncoder,
    Classifier,
    TrainMatrix,
    TestMatrix,
    TrainLabels,
    TestLabels,
}

impl ArtifactKey {
    /// Every key, in pipeline order.
    pub const ALL: [ArtifactKey; 7] = [
        ArtifactKey::Vectorizer,
        ArtifactKey::TrainMatrix,
        ArtifactKey::TestMatrix,
        ArtifactKey::TrainLabels,
        ArtifactKey::TestLabels,
        ArtifactKey::LabelEncoder,
        ArtifactKey::Classifier,
    ];

    /// Outputs of the feature builder.
    pub const FEATURES: [ArtifactKey; 5] = [
        ArtifactKey::Vectorizer,
        ArtifactKey::TrainMatrix,
        ArtifactKey::TestMatrix,
        ArtifactKey::TrainLabels,
        ArtifactKey::TestLabels,
    ];

    /// Artifacts the agent loads at startup.
    pub const SERVING: [ArtifactKey; 3] = [
        ArtifactKey::Vectorizer,
        ArtifactKey::LabelEncoder,
        ArtifactKey::Classifier,
    ];

    /// The exact storage name.
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactKey::Vectorizer => "vectorizer",
            ArtifactKey::LabelEncoder => "label_encoder",
            ArtifactKey::Classifier => "classifier",
            ArtifactKey::TrainMatrix => "train_matrix",
            ArtifactKey::TestMatrix => "test_matrix",
            ArtifactKey::TrainLabels => "train_labels",
            ArtifactKey::TestLabels => "test_labels",
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArtifactKey {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        ArtifactKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| SolaceError::invalid_argument(format!("unknown artifact {s:?}")))
    }
}

/// Reads and writes artifacts through a storage backend.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    storage: Arc<dyn Storage>,
}

impl ArtifactStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ArtifactStore { storage }
    }

    /// A store over a directory, created if it does not exist.
    pub fn create_dir<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let storage = FileStorage::new(directory, StorageConfig::default())?;
        Ok(Self::new(Arc::new(storage)))
    }

    /// A store over an existing directory. A missing directory is a missing input.
    pub fn open_dir<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let storage = FileStorage::open(directory, StorageConfig::default())?;
        Ok(Self::new(Arc::new(storage)))
    }

    /// A store backed by memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Encode `value` and publish it under `key`, replacing any previous value.
    pub fn save<T: Serialize + ?Sized>(&self, key: ArtifactKey, value: &T) -> Result<()> {
        let temp_name = format!("{}{TEMP_SUFFIX}", key.name());

        let written = (|| -> Result<()> {
            let mut output = self.storage.create_output(&temp_name)?;
            bincode::serialize_into(&mut output, value)
                .map_err(|e| SolaceError::serialization(format!("artifact {key}: {e}")))?;
            output.close()
        })();

        if let Err(e) = written {
            if let Err(cleanup) = self.storage.delete_file(&temp_name) {
                log::warn!("could not remove {temp_name} after failed write: {cleanup}");
            }
            return Err(e);
        }

        self.storage.rename_file(&temp_name, key.name())?;
        log::debug!(
            "saved artifact {key} ({} bytes)",
            self.storage.file_size(key.name()).unwrap_or(0)
        );
        Ok(())
    }

    /// Load and decode the artifact under `key`.
    pub fn load<T: DeserializeOwned>(&self, key: ArtifactKey) -> Result<T> {
        if !self.contains(key) {
            return Err(SolaceError::missing_artifact(key.name()));
        }

        let input = self.storage.open_input(key.name())?;
        let value = bincode::deserialize_from(input)
            .map_err(|e| SolaceError::serialization(format!("artifact {key}: {e}")))?;
        log::debug!("loaded artifact {key}");
        Ok(value)
    }

    /// Whether an artifact exists under `key`.
    pub fn contains(&self, key: ArtifactKey) -> bool {
        self.storage.file_exists(key.name())
    }

    /// Fail with [`SolaceError::MissingArtifact`] naming the first absent key.
    pub fn require(&self, keys: &[ArtifactKey]) -> Result<()> {
        match keys.iter().find(|&&key| !self.contains(key)) {
            Some(key) => Err(SolaceError::missing_artifact(key.name())),
            None => Ok(()),
        }
    }

    /// Keys currently present, in pipeline order. Unrelated blobs and
    /// in-flight temporaries are skipped.
    pub fn list(&self) -> Result<Vec<ArtifactKey>> {
        let mut keys: Vec<ArtifactKey> = self
            .storage
            .list_files()?
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        keys.sort_by_key(|key| ArtifactKey::ALL.iter().position(|k| k == key));
        Ok(keys)
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}
