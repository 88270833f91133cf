//! Configuration for the pipeline and the agent.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "features": { "sample_size": 2000 },
//!   "trainer": { "solver": "sgd", "max_iter": 50 }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dataset::{DEFAULT_LABEL_COLUMN, DEFAULT_TEXT_COLUMN};
use crate::error::{Result, SolaceError};
use crate::ml::logistic::LogisticConfig;
use crate::pipeline::features::FeatureConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolaceConfig {
    pub dataset: DatasetConfig,
    pub features: FeaturesConfig,
    pub trainer: LogisticConfig,
    pub artifacts: ArtifactsConfig,
    pub agent: AgentConfig,
}

/// Where the labelled dataset lives and which columns to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub text_column: String,
    pub label_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            path: PathBuf::from("data/MH_Campaigns1723.csv"),
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
        }
    }
}

/// Sampling, splitting and vectorizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub sample_size: usize,
    pub test_fraction: f64,
    pub seed: u64,
    pub max_features: usize,
    pub ngram_range: (usize, usize),
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        let defaults = FeatureConfig::default();
        FeaturesConfig {
            sample_size: defaults.sample_size,
            test_fraction: defaults.test_fraction,
            seed: defaults.seed,
            max_features: defaults.max_features,
            ngram_range: defaults.ngram_range,
        }
    }
}

/// Artifact store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub directory: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        ArtifactsConfig {
            directory: PathBuf::from("models"),
        }
    }
}

/// Runtime settings for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Seed for fallback replies; OS entropy when unset.
    pub seed: Option<u64>,
    /// Deadline for one emotion-service call.
    pub service_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            seed: None,
            service_timeout_ms: 5000,
        }
    }
}

impl AgentConfig {
    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(self.service_timeout_ms)
    }
}

impl SolaceConfig {
    /// Read and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SolaceError::missing_input(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&content)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate JSON config text.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SolaceConfig = serde_json::from_str(json)
            .map_err(|e| SolaceError::invalid_config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.text_column.is_empty() || self.dataset.label_column.is_empty() {
            return Err(SolaceError::invalid_config("dataset column names must not be empty"));
        }
        if self.artifacts.directory.as_os_str().is_empty() {
            return Err(SolaceError::invalid_config("artifacts.directory must not be empty"));
        }
        if self.agent.service_timeout_ms == 0 {
            return Err(SolaceError::invalid_config(
                "agent.service_timeout_ms must be at least 1",
            ));
        }
        self.feature_config().validate()?;
        self.trainer.validate()
    }

    /// Feature builder settings from the `dataset` and `features` sections.
    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            sample_size: self.features.sample_size,
            test_fraction: self.features.test_fraction,
            seed: self.features.seed,
            max_features: self.features.max_features,
            ngram_range: self.features.ngram_range,
            text_column: self.dataset.text_column.clone(),
            label_column: self.dataset.label_column.clone(),
        }
    }
}
