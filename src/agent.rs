//! The supportive agent: text in, one reply out.
//!
//! Trained artifacts are loaded once into an immutable [`AgentContext`] that
//! is shared by `Arc`. Each request is independent: the text is scored by an
//! [`EmotionService`] and the scores are mapped to a reply by an
//! [`EmotionResponder`]. Service failures become an apology reply and never
//! stop the agent.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactKey, ArtifactStore};
use crate::error::{Result, SolaceError};
use crate::ml::label_encoder::LabelEncoder;
use crate::ml::logistic::LogisticRegression;
use crate::ml::tfidf::TfIdfVectorizer;
use crate::responder::{Emotion, EmotionResponder, EmotionScores, EmotionService};

/// Reply for empty or whitespace-only input.
pub const PROMPT_FOR_INPUT_REPLY: &str = "Please provide some text so I can understand how you're feeling.";

/// Reply when the emotion service fails.
pub const SERVICE_UNAVAILABLE_REPLY: &str =
    "I'm sorry, I'm having trouble connecting to my service. Please try again later.";

/// Trained artifacts, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AgentContext {
    vectorizer: TfIdfVectorizer,
    label_encoder: LabelEncoder,
    classifier: LogisticRegression,
}

/// Classifier output for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    /// `(label, probability)` for every class, in class order.
    pub probabilities: Vec<(String, f64)>,
}

impl AgentContext {
    /// Load the vectorizer, label encoder and classifier from `store`.
    ///
    /// Any missing artifact is fatal, as is a classifier that was not trained
    /// on this vectorizer's features or this encoder's classes.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        store.require(&ArtifactKey::SERVING)?;

        let context = Self::from_parts(
            store.load(ArtifactKey::Vectorizer)?,
            store.load(ArtifactKey::LabelEncoder)?,
            store.load(ArtifactKey::Classifier)?,
        )?;
        log::info!(
            "models loaded: {} features, {} classes",
            context.vectorizer.vocabulary_size(),
            context.label_encoder.n_classes()
        );
        Ok(context)
    }

    /// Assemble a context, verifying that the three artifacts belong together.
    pub fn from_parts(
        vectorizer: TfIdfVectorizer,
        label_encoder: LabelEncoder,
        classifier: LogisticRegression,
    ) -> Result<Self> {
        classifier.check_features(vectorizer.vocabulary_size(), vectorizer.fingerprint())?;
        if classifier.n_classes() != label_encoder.n_classes() {
            return Err(SolaceError::schema_mismatch(format!(
                "classifier predicts {} classes, label encoder knows {}",
                classifier.n_classes(),
                label_encoder.n_classes()
            )));
        }

        Ok(AgentContext {
            vectorizer,
            label_encoder,
            classifier,
        })
    }

    /// Classify `text` with the trained model.
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let features = self.vectorizer.transform(text)?;
        let probs = self.classifier.predict_proba(&features)?;

        let mut best = 0;
        for (i, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = i;
            }
        }

        let probabilities = self
            .label_encoder
            .classes()
            .iter()
            .cloned()
            .zip(probs.iter().copied())
            .collect();

        Ok(Prediction {
            label: self.label_encoder.decode_one(best)?.to_string(),
            confidence: probs.get(best).copied().unwrap_or(0.0),
            probabilities,
        })
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn label_encoder(&self) -> &LabelEncoder {
        &self.label_encoder
    }

    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }
}

/// What kind of reply the agent produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// The input was empty.
    PromptForInput,
    /// The emotion service failed.
    ServiceUnavailable,
    /// A reply chosen from the emotion scores.
    Emotional,
}

/// One agent reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub kind: ReplyKind,
    pub text: String,
    /// The emotion rule that fired, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
    /// Scores reported by the emotion service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<EmotionScores>,
}

impl Reply {
    fn fixed(kind: ReplyKind, text: &str) -> Self {
        Reply {
            kind,
            text: text.to_string(),
            emotion: None,
            scores: None,
        }
    }
}

/// Answers user text with a supportive reply.
pub struct Agent {
    context: Arc<AgentContext>,
    service: Arc<dyn EmotionService>,
    responder: EmotionResponder,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("service", &self.service.name())
            .field("responder", &self.responder)
            .finish()
    }
}

impl Agent {
    /// Create an agent whose fallback replies are drawn from OS entropy.
    pub fn new(context: Arc<AgentContext>, service: Arc<dyn EmotionService>) -> Self {
        Self::with_rng(context, service, StdRng::from_os_rng())
    }

    /// Create an agent with reproducible fallback replies.
    pub fn with_seed(context: Arc<AgentContext>, service: Arc<dyn EmotionService>, seed: u64) -> Self {
        Self::with_rng(context, service, StdRng::seed_from_u64(seed))
    }

    fn with_rng(context: Arc<AgentContext>, service: Arc<dyn EmotionService>, rng: StdRng) -> Self {
        Agent {
            context,
            service,
            responder: EmotionResponder::default(),
            rng: Mutex::new(rng),
        }
    }

    /// Replace the reply rules.
    pub fn with_responder(mut self, responder: EmotionResponder) -> Self {
        self.responder = responder;
        self
    }

    /// Produce a reply for `text`.
    pub fn respond(&self, text: &str) -> Reply {
        if text.trim().is_empty() {
            return Reply::fixed(ReplyKind::PromptForInput, PROMPT_FOR_INPUT_REPLY);
        }

        let scores = match self.service.analyze(text) {
            Ok(scores) => scores,
            Err(e) => {
                log::warn!("emotion analysis via {} failed: {e}", self.service.name());
                return Reply::fixed(ReplyKind::ServiceUnavailable, SERVICE_UNAVAILABLE_REPLY);
            }
        };

        let selection = {
            let mut rng = self.rng.lock();
            self.responder.select(&scores, &mut *rng)
        };
        log::debug!(
            "selected {} reply",
            selection.emotion.map(|e| e.name()).unwrap_or("fallback")
        );

        Reply {
            kind: ReplyKind::Emotional,
            text: selection.reply.to_string(),
            emotion: selection.emotion,
            scores: Some(scores),
        }
    }

    pub fn context(&self) -> &Arc<AgentContext> {
        &self.context
    }

    pub fn responder(&self) -> &EmotionResponder {
        &self.responder
    }
}
