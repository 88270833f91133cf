//! # Solace
//!
//! An emotion-aware supportive agent and the offline pipeline that trains its
//! campaign classifier.
//!
//! ## Features
//!
//! - CSV dataset loading, seeded sampling and train/test splitting
//! - TF-IDF vectorization over word n-grams
//! - Logistic regression with gradient descent or mini-batch SGD
//! - Classification reports with per-class precision, recall and F1
//! - Flat-file artifact store for trained models
//! - Threshold-priority reply selection from emotion scores
//! - A pluggable emotion-analysis service with a deadline wrapper

pub mod agent;
pub mod analysis;
pub mod artifact;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod ml;
pub mod pipeline;
pub mod responder;
pub mod storage;

pub mod prelude {
    pub use crate::agent::{Agent, AgentContext, Reply, ReplyKind};
    pub use crate::artifact::{ArtifactKey, ArtifactStore};
    pub use crate::config::SolaceConfig;
    pub use crate::error::{Result, SolaceError};
    pub use crate::pipeline::{ClassifierTrainer, FeatureBuilder};
    pub use crate::responder::{Emotion, EmotionScores, EmotionService, select_response};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
