//! Machine learning for Solace.
//!
//! This module provides the feature extraction and classification pieces of
//! the training pipeline: sparse TF-IDF features, label encoding, a
//! regularized logistic regression classifier and its evaluation report.

pub mod label_encoder;
pub mod logistic;
pub mod metrics;
pub mod sparse;
pub mod tfidf;

pub use label_encoder::LabelEncoder;
pub use logistic::{LogisticConfig, LogisticRegression, Solver};
pub use metrics::{ClassificationReport, ClassMetrics};
pub use sparse::{SparseMatrix, SparseVector};
pub use tfidf::{TfIdfVectorizer, VectorizerConfig};
