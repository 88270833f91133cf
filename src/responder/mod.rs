//! Emotion-aware reply selection.
//!
//! An [`EmotionService`] scores the user's text, and an [`EmotionResponder`]
//! maps the scores to one templated supportive reply.

pub mod emotion;
pub mod selector;
pub mod service;

pub use emotion::{Emotion, EmotionScores};
pub use selector::{EmotionResponder, ResponseRule, Selection, select_response};
pub use service::{
    AnalysisResponse, EmotionService, LexiconEmotionService, ServiceError, ServiceResult,
    TimeoutEmotionService,
};
