//! Emotion-analysis providers.
//!
//! The agent only depends on the [`EmotionService`] trait. A provider either
//! returns scores or a recoverable [`ServiceError`]; the agent turns errors
//! into an apology reply instead of failing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::analyzer::{Analyzer, StandardAnalyzer};
use crate::responder::emotion::{Emotion, EmotionScores};

/// Recoverable failures of an emotion-analysis provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The provider is not configured or cannot be reached.
    #[error("emotion service unavailable: {0}")]
    Unavailable(String),

    /// The provider did not answer within the deadline.
    #[error("emotion service timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with an error.
    #[error("emotion analysis failed: {0}")]
    Failed(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Anything that can score the emotional tone of a text.
pub trait EmotionService: Send + Sync {
    /// Score `text`. Implementations must not panic on empty input.
    fn analyze(&self, text: &str) -> ServiceResult<EmotionScores>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// The `{success, emotions}` / `{success: false, error}` shape used on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotions: Option<EmotionScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn into_result(self) -> ServiceResult<EmotionScores> {
        match (self.success, self.emotions) {
            (true, Some(emotions)) => Ok(emotions),
            (true, None) => Err(ServiceError::Failed("response carried no emotions".to_string())),
            (false, _) => Err(ServiceError::Failed(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

impl From<ServiceResult<EmotionScores>> for AnalysisResponse {
    fn from(result: ServiceResult<EmotionScores>) -> Self {
        match result {
            Ok(emotions) => AnalysisResponse {
                success: true,
                emotions: Some(emotions),
                error: None,
            },
            Err(e) => AnalysisResponse {
                success: false,
                emotions: None,
                error: Some(e.to_string()),
            },
        }
    }
}

const SADNESS_WORDS: &[&str] = &[
    "sad", "sadness", "unhappy", "depressed", "depressing", "lonely", "alone", "hopeless",
    "cry", "crying", "cried", "tears", "miserable", "heartbroken", "grief", "grieving",
    "empty", "gloomy", "worthless", "hurt", "hurting", "broken",
];

const FEAR_WORDS: &[&str] = &[
    "afraid", "scared", "fear", "fearful", "worried", "worry", "worrying", "anxious",
    "anxiety", "nervous", "panic", "panicking", "terrified", "frightened", "dread",
    "uneasy", "stressed", "overwhelmed", "scary",
];

const ANGER_WORDS: &[&str] = &[
    "angry", "anger", "mad", "furious", "hate", "hated", "annoyed", "irritated", "rage",
    "frustrated", "frustrating", "outraged", "resent", "livid", "pissed",
];

const JOY_WORDS: &[&str] = &[
    "happy", "happiness", "joy", "joyful", "glad", "great", "wonderful", "excited",
    "love", "loved", "amazing", "grateful", "thankful", "proud", "fantastic", "delighted",
    "cheerful", "awesome", "best", "good",
];

const DISGUST_WORDS: &[&str] = &[
    "disgusted", "disgusting", "gross", "revolting", "nasty", "vile", "sickening", "repulsive",
];

/// Offline provider that scores emotions by keyword hits.
///
/// Text runs through the analysis pipeline and each token found in the
/// lexicon counts one hit for its emotion. An emotion's score is its share of
/// all hits, so a text whose only emotional word is "sad" scores sadness 1.0.
/// Text without any lexicon word yields empty scores.
pub struct LexiconEmotionService {
    lexicon: HashMap<String, Emotion>,
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for LexiconEmotionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexiconEmotionService")
            .field("lexicon_size", &self.lexicon.len())
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl LexiconEmotionService {
    /// Create a service with the built-in English lexicon.
    pub fn new() -> crate::error::Result<Self> {
        let analyzer: Arc<dyn Analyzer> = Arc::new(StandardAnalyzer::new()?);
        let mut service = Self::with_analyzer(analyzer);

        for (emotion, words) in [
            (Emotion::Sadness, SADNESS_WORDS),
            (Emotion::Fear, FEAR_WORDS),
            (Emotion::Anger, ANGER_WORDS),
            (Emotion::Joy, JOY_WORDS),
            (Emotion::Disgust, DISGUST_WORDS),
        ] {
            service.add_words(emotion, words.iter().copied());
        }

        Ok(service)
    }

    /// Create a service with an empty lexicon.
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        LexiconEmotionService {
            lexicon: HashMap::new(),
            analyzer,
        }
    }

    /// Map `words` to `emotion`. Words are lowercased; later entries win.
    pub fn add_words<I, S>(&mut self, emotion: Emotion, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.lexicon.insert(word.as_ref().to_lowercase(), emotion);
        }
    }

    pub fn lexicon_size(&self) -> usize {
        self.lexicon.len()
    }
}

impl EmotionService for LexiconEmotionService {
    fn analyze(&self, text: &str) -> ServiceResult<EmotionScores> {
        let tokens = self
            .analyzer
            .analyze(text)
            .map_err(|e| ServiceError::Failed(e.to_string()))?;

        let mut hits: HashMap<Emotion, usize> = HashMap::new();
        for token in tokens {
            if let Some(&emotion) = self.lexicon.get(&token.text) {
                *hits.entry(emotion).or_insert(0) += 1;
            }
        }

        let total: usize = hits.values().sum();
        let scores = hits
            .into_iter()
            .fold(EmotionScores::new(), |scores, (emotion, count)| {
                scores.with(emotion, count as f64 / total as f64)
            });

        Ok(scores)
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

/// Workers a [`TimeoutEmotionService`] lets run at once by default.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Bounds every call of an inner service by a deadline.
///
/// Each call runs on a short-lived worker thread; if no answer arrives in
/// time the caller gets [`ServiceError::Timeout`] and the worker's late
/// result is discarded.
///
/// A thread cannot be cancelled, so a timed-out worker keeps running until
/// the inner service returns. At most `max_in_flight` workers exist at once;
/// calls beyond that fail with [`ServiceError::Unavailable`] without
/// spawning, so a stalled provider cannot pile up threads.
pub struct TimeoutEmotionService {
    inner: Arc<dyn EmotionService>,
    timeout: Duration,
    max_in_flight: usize,
    in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for TimeoutEmotionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutEmotionService")
            .field("inner", &self.inner.name())
            .field("timeout", &self.timeout)
            .field("max_in_flight", &self.max_in_flight)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl TimeoutEmotionService {
    pub fn new(inner: Arc<dyn EmotionService>, timeout: Duration) -> Self {
        TimeoutEmotionService {
            inner,
            timeout,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Limit concurrent workers, including timed-out ones still running.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Workers currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn acquire_slot(&self) -> Option<WorkerSlot> {
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_in_flight).then_some(n + 1)
            })
            .ok()
            .map(|_| WorkerSlot(Arc::clone(&self.in_flight)))
    }
}

/// Releases a worker slot when dropped, even if the worker panics.
struct WorkerSlot(Arc<AtomicUsize>);

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EmotionService for TimeoutEmotionService {
    fn analyze(&self, text: &str) -> ServiceResult<EmotionScores> {
        let Some(slot) = self.acquire_slot() else {
            log::warn!(
                "{} emotion service has {} unfinished calls, not starting another",
                self.inner.name(),
                self.max_in_flight
            );
            return Err(ServiceError::Unavailable(format!(
                "{} earlier calls are still running",
                self.max_in_flight
            )));
        };

        let (tx, rx) = bounded(1);
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();

        std::thread::Builder::new()
            .name("emotion-service".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(inner.analyze(&text));
            })
            .map_err(|e| ServiceError::Unavailable(format!("cannot start worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{} emotion service did not answer within {:?}",
                    self.inner.name(),
                    self.timeout
                );
                Err(ServiceError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ServiceError::Failed(
                "emotion service worker stopped without answering".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowService(Duration);

    impl EmotionService for SlowService {
        fn analyze(&self, _text: &str) -> ServiceResult<EmotionScores> {
            std::thread::sleep(self.0);
            Ok(EmotionScores::new().with(Emotion::Joy, 1.0))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct PanickingService;

    impl EmotionService for PanickingService {
        fn analyze(&self, _text: &str) -> ServiceResult<EmotionScores> {
            panic!("provider crashed");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_lexicon_scores() {
        let service = LexiconEmotionService::new().unwrap();

        let scores = service.analyze("I feel so SAD and lonely today").unwrap();
        assert_eq!(scores.get(Emotion::Sadness), 1.0);
        assert_eq!(scores.get(Emotion::Joy), 0.0);

        let mixed = service.analyze("sad but also happy").unwrap();
        assert_eq!(mixed.get(Emotion::Sadness), 0.5);
        assert_eq!(mixed.get(Emotion::Joy), 0.5);
    }

    #[test]
    fn test_lexicon_matches_common_words() {
        let service = LexiconEmotionService::new().unwrap();
        let scores = service.analyze("I am all alone and empty").unwrap();
        assert_eq!(scores.get(Emotion::Sadness), 1.0);
        assert_eq!(scores.len(), 1);
    }

    #[test]
    fn test_lexicon_no_hits() {
        let service = LexiconEmotionService::new().unwrap();
        assert!(service.analyze("the meeting is at noon").unwrap().is_empty());
        assert!(service.analyze("").unwrap().is_empty());
    }

    #[test]
    fn test_custom_lexicon() {
        let analyzer: Arc<dyn Analyzer> = Arc::new(StandardAnalyzer::new().unwrap());
        let mut service = LexiconEmotionService::with_analyzer(analyzer);
        service.add_words(Emotion::Anger, ["Grr"]);

        assert_eq!(service.lexicon_size(), 1);
        assert_eq!(service.analyze("grr").unwrap().get(Emotion::Anger), 1.0);
    }

    #[test]
    fn test_timeout_passes_fast_results() {
        let service = TimeoutEmotionService::new(
            Arc::new(SlowService(Duration::from_millis(1))),
            Duration::from_secs(5),
        );
        assert_eq!(service.analyze("hi").unwrap().get(Emotion::Joy), 1.0);
        assert_eq!(service.name(), "slow");
    }

    #[test]
    fn test_timeout_expires() {
        let service = TimeoutEmotionService::new(
            Arc::new(SlowService(Duration::from_millis(500))),
            Duration::from_millis(20),
        );
        assert_eq!(
            service.analyze("hi").unwrap_err(),
            ServiceError::Timeout(Duration::from_millis(20))
        );
    }

    #[test]
    fn test_stalled_workers_are_capped() {
        let service = TimeoutEmotionService::new(
            Arc::new(SlowService(Duration::from_millis(300))),
            Duration::from_millis(10),
        )
        .with_max_in_flight(2);

        for _ in 0..2 {
            assert!(matches!(service.analyze("hi"), Err(ServiceError::Timeout(_))));
        }
        assert_eq!(service.in_flight(), 2);
        for _ in 0..5 {
            assert!(matches!(service.analyze("hi"), Err(ServiceError::Unavailable(_))));
        }
        assert_eq!(service.in_flight(), 2);

        // Slots free up once the stalled calls return
        std::thread::sleep(Duration::from_millis(600));
        assert_eq!(service.in_flight(), 0);
        assert!(matches!(service.analyze("hi"), Err(ServiceError::Timeout(_))));
    }

    #[test]
    fn test_worker_panic_is_failure() {
        let service = TimeoutEmotionService::new(Arc::new(PanickingService), Duration::from_secs(5));
        assert!(matches!(service.analyze("hi").unwrap_err(), ServiceError::Failed(_)));
        assert_eq!(service.in_flight(), 0);
    }

    #[test]
    fn test_analysis_response_shape() {
        let ok: AnalysisResponse = Ok(EmotionScores::new().with(Emotion::Fear, 0.6)).into();
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["emotions"]["fear"], 0.6);
        assert!(json.get("error").is_none());

        let failed: AnalysisResponse =
            serde_json::from_str(r#"{"success": false, "error": "credentials not set up"}"#).unwrap();
        assert_eq!(
            failed.into_result().unwrap_err(),
            ServiceError::Failed("credentials not set up".to_string())
        );
    }
}
