//! Emotion vocabulary and score maps.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};

/// The five emotions reported by emotion-analysis providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Sadness,
    Joy,
    Fear,
    Disgust,
    Anger,
}

impl Emotion {
    pub const ALL: [Emotion; 5] = [
        Emotion::Sadness,
        Emotion::Joy,
        Emotion::Fear,
        Emotion::Disgust,
        Emotion::Anger,
    ];

    /// Key used in score maps.
    pub fn name(&self) -> &'static str {
        match self {
            Emotion::Sadness => "sadness",
            Emotion::Joy => "joy",
            Emotion::Fear => "fear",
            Emotion::Disgust => "disgust",
            Emotion::Anger => "anger",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Emotion {
    type Err = SolaceError;

    fn from_str(s: &str) -> Result<Self> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.name() == s)
            .ok_or_else(|| SolaceError::invalid_argument(format!("unknown emotion {s:?}")))
    }
}

/// Emotion name → score in `[0, 1]`.
///
/// Keys outside the five known emotions are kept but never consulted by the
/// responder. Missing keys read as 0.0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionScores {
    scores: HashMap<String, f64>,
}

impl EmotionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, emotion: Emotion, score: f64) -> Self {
        self.set(emotion, score);
        self
    }

    pub fn set(&mut self, emotion: Emotion, score: f64) {
        self.scores.insert(emotion.name().to_string(), score);
    }

    /// Score for `emotion`, 0.0 when absent.
    pub fn get(&self, emotion: Emotion) -> f64 {
        self.get_named(emotion.name())
    }

    /// Score for an arbitrary key, 0.0 when absent.
    pub fn get_named(&self, name: &str) -> f64 {
        self.scores.get(name).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Parse a JSON object such as `{"sadness": 0.7, "joy": 0.1}`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        EmotionScores {
            scores: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_zero() {
        let scores = EmotionScores::new().with(Emotion::Joy, 0.8);
        assert_eq!(scores.get(Emotion::Joy), 0.8);
        assert_eq!(scores.get(Emotion::Fear), 0.0);
        assert_eq!(scores.get_named("surprise"), 0.0);
    }

    #[test]
    fn test_from_json() {
        let scores = EmotionScores::from_json(r#"{"sadness": 0.7, "surprise": 0.2}"#).unwrap();
        assert_eq!(scores.get(Emotion::Sadness), 0.7);
        assert_eq!(scores.get_named("surprise"), 0.2);
        assert_eq!(scores.len(), 2);

        assert!(EmotionScores::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_collect_from_pairs() {
        let scores: EmotionScores = [("fear", 0.3), ("anger", 0.6)].into_iter().collect();
        assert_eq!(scores.get(Emotion::Anger), 0.6);
        assert_eq!(scores.get(Emotion::Joy), 0.0);
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn test_emotion_names() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.name().parse::<Emotion>().unwrap(), emotion);
        }
        assert!("surprise".parse::<Emotion>().is_err());
    }
}
