//! Feature building: dataset → sample → split → TF-IDF matrices.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactKey, ArtifactStore};
use crate::dataset::{DEFAULT_LABEL_COLUMN, DEFAULT_TEXT_COLUMN, Dataset, DatasetReader};
use crate::error::{Result, SolaceError};
use crate::ml::sparse::SparseMatrix;
use crate::ml::tfidf::{TfIdfVectorizer, VectorizerConfig};

/// Settings for [`FeatureBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rows drawn from the dataset before splitting.
    pub sample_size: usize,
    /// Share of the sample held out for evaluation.
    pub test_fraction: f64,
    /// Seed for both sampling and splitting.
    pub seed: u64,
    /// Vocabulary cap.
    pub max_features: usize,
    /// Inclusive n-gram range.
    pub ngram_range: (usize, usize),
    pub text_column: String,
    pub label_column: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            sample_size: 10_000,
            test_fraction: 0.2,
            seed: 42,
            max_features: 5000,
            ngram_range: (1, 2),
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_size < 2 {
            return Err(SolaceError::invalid_config(
                "sample_size must be at least 2 to allow a train/test split",
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(SolaceError::invalid_config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        self.vectorizer_config().validate()
    }

    /// Vectorizer settings derived from this config.
    pub fn vectorizer_config(&self) -> VectorizerConfig {
        VectorizerConfig {
            max_features: Some(self.max_features),
            ngram_range: self.ngram_range,
            ..VectorizerConfig::default()
        }
    }
}

/// Everything the feature builder produces.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub train_matrix: SparseMatrix,
    pub test_matrix: SparseMatrix,
    pub train_labels: Vec<String>,
    pub test_labels: Vec<String>,
    pub vectorizer: TfIdfVectorizer,
}

impl FeatureSet {
    /// Write all five feature artifacts.
    pub fn persist(&self, store: &ArtifactStore) -> Result<()> {
        store.save(ArtifactKey::Vectorizer, &self.vectorizer)?;
        store.save(ArtifactKey::TrainMatrix, &self.train_matrix)?;
        store.save(ArtifactKey::TestMatrix, &self.test_matrix)?;
        store.save(ArtifactKey::TrainLabels, &self.train_labels)?;
        store.save(ArtifactKey::TestLabels, &self.test_labels)?;
        Ok(())
    }
}

/// Turns a labelled CSV dataset into TF-IDF train/test matrices.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    pub fn new(config: FeatureConfig) -> Self {
        FeatureBuilder { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Load the dataset at `dataset_path` and build features from it.
    pub fn build<P: AsRef<Path>>(&self, dataset_path: P) -> Result<FeatureSet> {
        self.config.validate()?;

        let dataset = DatasetReader::new()
            .with_columns(&self.config.text_column, &self.config.label_column)
            .read_path(dataset_path)?;
        self.build_from_dataset(&dataset)
    }

    /// Sample, split and vectorize an in-memory dataset.
    ///
    /// The vectorizer is fit on the training texts only; the test texts are
    /// transformed with the same frozen vocabulary.
    pub fn build_from_dataset(&self, dataset: &Dataset) -> Result<FeatureSet> {
        self.config.validate()?;

        let sample = dataset.sample(self.config.sample_size, self.config.seed)?;
        log::info!("using a sample of {} rows", sample.len());

        let split = sample.train_test_split(self.config.test_fraction, self.config.seed)?;
        log::info!(
            "split into {} training and {} test rows",
            split.train.len(),
            split.test.len()
        );

        let mut vectorizer = TfIdfVectorizer::new(self.config.vectorizer_config())?;
        let train_matrix = vectorizer.fit_transform(&split.train.texts())?;
        let test_matrix = vectorizer.transform_batch(&split.test.texts())?;
        log::info!(
            "vectorized with {} features ({} non-zeros in training matrix)",
            vectorizer.vocabulary_size(),
            train_matrix.nnz()
        );

        let owned = |labels: Vec<&str>| -> Vec<String> { labels.into_iter().map(str::to_string).collect() };
        Ok(FeatureSet {
            train_matrix,
            test_matrix,
            train_labels: owned(split.train.labels()),
            test_labels: owned(split.test.labels()),
            vectorizer,
        })
    }

    /// Build features and write them to `store`.
    pub fn build_and_persist<P: AsRef<Path>>(&self, dataset_path: P, store: &ArtifactStore) -> Result<FeatureSet> {
        let features = self.build(dataset_path)?;
        features.persist(store)?;
        log::info!("preprocessing complete; feature artifacts saved");
        Ok(features)
    }
}

/// Build features from a CSV file with the default `tweet` / `campaign` columns.
pub fn build_features<P: AsRef<Path>>(
    dataset_path: P,
    sample_size: usize,
    test_fraction: f64,
    seed: u64,
    max_features: usize,
    ngram_range: (usize, usize),
) -> Result<FeatureSet> {
    FeatureBuilder::new(FeatureConfig {
        sample_size,
        test_fraction,
        seed,
        max_features,
        ngram_range,
        ..FeatureConfig::default()
    })
    .build(dataset_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetRow;

    fn corpus() -> Dataset {
        let texts = [
            ("I feel so hopeless and sad", "depression"),
            ("nothing matters anymore sad", "depression"),
            ("cannot sleep worrying again", "anxiety"),
            ("panic attack before the meeting", "anxiety"),
            ("deadline stress is crushing me", "stress"),
            ("too much work stress today", "stress"),
            ("sad and empty inside", "depression"),
            ("worrying about everything", "anxiety"),
            ("stress at work again", "stress"),
            ("heart racing panic", "anxiety"),
        ];
        texts.iter().map(|(t, l)| DatasetRow::new(*t, *l)).collect()
    }

    fn small_config() -> FeatureConfig {
        FeatureConfig {
            sample_size: 10,
            test_fraction: 0.2,
            seed: 42,
            max_features: 50,
            ..FeatureConfig::default()
        }
    }

    #[test]
    fn test_build_from_dataset() {
        let features = FeatureBuilder::new(small_config()).build_from_dataset(&corpus()).unwrap();

        assert_eq!(features.train_matrix.n_rows(), 8);
        assert_eq!(features.test_matrix.n_rows(), 2);
        assert_eq!(features.train_labels.len(), 8);
        assert_eq!(features.test_labels.len(), 2);

        let dim = features.vectorizer.vocabulary_size();
        assert!(dim <= 50);
        assert_eq!(features.train_matrix.n_cols(), dim);
        assert_eq!(features.test_matrix.n_cols(), dim);
    }

    #[test]
    fn test_build_is_reproducible() {
        let builder = FeatureBuilder::new(small_config());
        let first = builder.build_from_dataset(&corpus()).unwrap();
        let second = builder.build_from_dataset(&corpus()).unwrap();

        assert_eq!(first.train_labels, second.train_labels);
        assert_eq!(first.test_matrix, second.test_matrix);
        assert_eq!(first.vectorizer.fingerprint(), second.vectorizer.fingerprint());
    }

    #[test]
    fn test_sample_larger_than_dataset() {
        let config = FeatureConfig {
            sample_size: 11,
            ..small_config()
        };
        let err = FeatureBuilder::new(config).build_from_dataset(&corpus()).unwrap_err();
        assert!(matches!(err, SolaceError::MissingInput(_)));
    }

    #[test]
    fn test_invalid_fraction() {
        let config = FeatureConfig {
            test_fraction: 1.5,
            ..small_config()
        };
        let err = FeatureBuilder::new(config).build_from_dataset(&corpus()).unwrap_err();
        assert!(matches!(err, SolaceError::InvalidConfig(_)));
    }

    #[test]
    fn test_persist_writes_all_feature_artifacts() {
        let store = ArtifactStore::in_memory();
        let features = FeatureBuilder::new(small_config()).build_from_dataset(&corpus()).unwrap();
        features.persist(&store).unwrap();

        assert!(store.require(&ArtifactKey::FEATURES).is_ok());
        let labels: Vec<String> = store.load(ArtifactKey::TestLabels).unwrap();
        assert_eq!(labels, features.test_labels);
    }
}
