//! Threshold-priority reply selection.
//!
//! Rules are checked in order and the first rule whose emotion score is
//! strictly above its threshold wins. When no rule fires, one reply is drawn
//! uniformly from the fallback pool using the caller's random source.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use solace::responder::{Emotion, EmotionResponder, EmotionScores};
//!
//! let responder = EmotionResponder::default();
//! let scores = EmotionScores::new().with(Emotion::Joy, 0.9);
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! assert_eq!(
//!     responder.select_response(&scores, &mut rng),
//!     "That sounds wonderful! I'm glad to hear you are having a good day."
//! );
//! ```

use std::sync::LazyLock;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};
use crate::responder::emotion::{Emotion, EmotionScores};

pub const SADNESS_REPLY: &str = "I hear sadness in your words. It's okay to feel this way, and I'm here to listen. You can talk to me about anything.";
pub const FEAR_REPLY: &str = "I'm sensing some fear or worry. Remember to take a deep breath. It's brave to share what you're feeling.";
pub const ANGER_REPLY: &str = "I'm sensing a lot of anger, and I'm sorry you're feeling that way. It might help to take a moment to cool down.";
pub const JOY_REPLY: &str = "That sounds wonderful! I'm glad to hear you are having a good day.";

pub const FALLBACK_REPLIES: [&str; 3] = [
    "I'm here to listen. You can always talk to me.",
    "I hear you. Thank you for sharing.",
    "It's okay to not have all the answers. Let's just talk.",
];

/// Negative emotions fire above this score.
pub const NEGATIVE_THRESHOLD: f64 = 0.4;

/// Joy fires above this score.
pub const JOY_THRESHOLD: f64 = 0.5;

static DEFAULT_RESPONDER: LazyLock<EmotionResponder> = LazyLock::new(EmotionResponder::default);

/// "Reply with `reply` when `emotion` scores above `threshold`."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRule {
    pub emotion: Emotion,
    pub threshold: f64,
    pub reply: String,
}

impl ResponseRule {
    pub fn new<S: Into<String>>(emotion: Emotion, threshold: f64, reply: S) -> Self {
        ResponseRule {
            emotion,
            threshold,
            reply: reply.into(),
        }
    }

    fn matches(&self, scores: &EmotionScores) -> bool {
        scores.get(self.emotion) > self.threshold
    }
}

/// The outcome of a selection: the reply and the rule emotion that produced
/// it, or `None` for a fallback reply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub emotion: Option<Emotion>,
    pub reply: &'a str,
}

/// Maps emotion scores to one canned reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResponder {
    rules: Vec<ResponseRule>,
    fallback: Vec<String>,
}

impl Default for EmotionResponder {
    /// Sadness, fear and anger above 0.4, then joy above 0.5.
    fn default() -> Self {
        EmotionResponder {
            rules: vec![
                ResponseRule::new(Emotion::Sadness, NEGATIVE_THRESHOLD, SADNESS_REPLY),
                ResponseRule::new(Emotion::Fear, NEGATIVE_THRESHOLD, FEAR_REPLY),
                ResponseRule::new(Emotion::Anger, NEGATIVE_THRESHOLD, ANGER_REPLY),
                ResponseRule::new(Emotion::Joy, JOY_THRESHOLD, JOY_REPLY),
            ],
            fallback: FALLBACK_REPLIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl EmotionResponder {
    /// Build a responder with custom rules. The fallback pool must not be empty.
    pub fn new(rules: Vec<ResponseRule>, fallback: Vec<String>) -> Result<Self> {
        if fallback.is_empty() {
            return Err(SolaceError::invalid_config("fallback reply pool must not be empty"));
        }
        Ok(EmotionResponder { rules, fallback })
    }

    /// Pick a reply and report which rule, if any, fired.
    pub fn select<R: Rng + ?Sized>(&self, scores: &EmotionScores, rng: &mut R) -> Selection<'_> {
        if let Some(rule) = self.rules.iter().find(|rule| rule.matches(scores)) {
            return Selection {
                emotion: Some(rule.emotion),
                reply: &rule.reply,
            };
        }

        Selection {
            emotion: None,
            reply: self.fallback.choose(rng).map(String::as_str).unwrap_or_default(),
        }
    }

    /// Pick a reply for `scores`.
    pub fn select_response<R: Rng + ?Sized>(&self, scores: &EmotionScores, rng: &mut R) -> &str {
        self.select(scores, rng).reply
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }
}

/// Pick a reply with the default rules and replies.
pub fn select_response<R: Rng + ?Sized>(scores: &EmotionScores, rng: &mut R) -> &'static str {
    DEFAULT_RESPONDER.select_response(scores, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scores(pairs: &[(Emotion, f64)]) -> EmotionScores {
        pairs
            .iter()
            .fold(EmotionScores::new(), |s, &(e, v)| s.with(e, v))
    }

    #[test]
    fn test_sadness_wins_over_joy() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = select_response(&scores(&[(Emotion::Sadness, 0.7), (Emotion::Joy, 0.9)]), &mut rng);
        assert_eq!(reply, SADNESS_REPLY);
    }

    #[test]
    fn test_priority_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let all_high = scores(&[
            (Emotion::Anger, 0.9),
            (Emotion::Fear, 0.9),
            (Emotion::Joy, 0.9),
        ]);
        assert_eq!(select_response(&all_high, &mut rng), FEAR_REPLY);

        let anger_and_joy = scores(&[(Emotion::Anger, 0.41), (Emotion::Joy, 0.99)]);
        assert_eq!(select_response(&anger_and_joy, &mut rng), ANGER_REPLY);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut rng = StdRng::seed_from_u64(1);

        let at_threshold = scores(&[
            (Emotion::Sadness, 0.4),
            (Emotion::Fear, 0.4),
            (Emotion::Anger, 0.4),
            (Emotion::Joy, 0.5),
        ]);
        let selection = DEFAULT_RESPONDER.select(&at_threshold, &mut rng);
        assert_eq!(selection.emotion, None);
        assert!(FALLBACK_REPLIES.contains(&selection.reply));

        let joy = scores(&[(Emotion::Joy, 0.51)]);
        assert_eq!(select_response(&joy, &mut rng), JOY_REPLY);
    }

    #[test]
    fn test_fallback_for_empty_scores() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = select_response(&EmotionScores::new(), &mut rng);
            assert!(FALLBACK_REPLIES.contains(&reply));
        }
    }

    #[test]
    fn test_fallback_is_reproducible_and_covers_pool() {
        let draw = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..60)
                .map(|_| select_response(&EmotionScores::new(), &mut rng))
                .collect::<Vec<_>>()
        };

        let first = draw(3);
        assert_eq!(first, draw(3));
        for reply in FALLBACK_REPLIES {
            assert!(first.contains(&reply));
        }
    }

    #[test]
    fn test_absent_scores_behave_as_zero() {
        let explicit =
            EmotionScores::from_json(r#"{"sadness": 0, "fear": 0, "anger": 0, "joy": 0}"#).unwrap();
        let draw = |scores: &EmotionScores| {
            let mut rng = StdRng::seed_from_u64(21);
            (0..30)
                .map(|_| select_response(scores, &mut rng))
                .collect::<Vec<_>>()
        };

        assert_eq!(draw(&EmotionScores::new()), draw(&explicit));
    }

    #[test]
    fn test_disgust_is_ignored() {
        let mut rng = StdRng::seed_from_u64(1);
        let selection = DEFAULT_RESPONDER.select(&scores(&[(Emotion::Disgust, 0.99)]), &mut rng);
        assert_eq!(selection.emotion, None);
    }

    #[test]
    fn test_custom_responder() {
        let responder = EmotionResponder::new(
            vec![ResponseRule::new(Emotion::Disgust, 0.2, "yuck")],
            vec!["ok".to_string()],
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            responder.select_response(&scores(&[(Emotion::Disgust, 0.3)]), &mut rng),
            "yuck"
        );
        assert_eq!(responder.select_response(&EmotionScores::new(), &mut rng), "ok");
        assert!(EmotionResponder::new(Vec::new(), Vec::new()).is_err());
    }
}
