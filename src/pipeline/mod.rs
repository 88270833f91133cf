//! Offline training pipeline.
//!
//! Two stages exchange data only through the [`ArtifactStore`](crate::artifact::ArtifactStore):
//!
//! ```text
//! dataset.csv ─► FeatureBuilder ─► {vectorizer, train/test matrices, train/test labels}
//!             ─► ClassifierTrainer ─► {label_encoder, classifier}
//! ```

pub mod features;
pub mod trainer;

pub use features::{FeatureBuilder, FeatureConfig, FeatureSet, build_features};
pub use trainer::{ClassifierTrainer, TrainerConfig, TrainingOutcome, train_classifier};
