//! Label encoding between class names and contiguous integer ids.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolaceError};

/// Bijection between the distinct training labels and `0..k`.
///
/// Classes are kept in sorted order, so the id of a label depends only on
/// the set of labels seen during [`LabelEncoder::fit`] and lookups are a
/// binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the class set from training labels.
    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<()> {
        if labels.is_empty() {
            return Err(SolaceError::invalid_argument(
                "cannot fit label encoder on zero labels",
            ));
        }

        let classes: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        self.classes = classes.into_iter().map(str::to_string).collect();
        Ok(())
    }

    /// Build an encoder fitted on `labels`.
    pub fn fitted<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let mut encoder = Self::new();
        encoder.fit(labels)?;
        Ok(encoder)
    }

    /// Map one label to its id.
    pub fn encode_one(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .map_err(|_| SolaceError::unseen_label(label))
    }

    /// Map labels to ids. Fails on the first label not seen during fitting.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode_one(l.as_ref())).collect()
    }

    /// Map an id back to its label.
    pub fn decode_one(&self, id: usize) -> Result<&str> {
        self.classes.get(id).map(String::as_str).ok_or_else(|| {
            SolaceError::invalid_argument(format!(
                "class id {id} out of range for {} classes",
                self.classes.len()
            ))
        })
    }

    /// Map ids back to labels.
    pub fn decode(&self, ids: &[usize]) -> Result<Vec<String>> {
        ids.iter()
            .map(|&id| self.decode_one(id).map(str::to_string))
            .collect()
    }

    /// Sorted class names.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_classes() {
        let encoder = LabelEncoder::fitted(&["stress", "anxiety", "depression", "anxiety"]).unwrap();
        assert_eq!(encoder.classes(), &["anxiety", "depression", "stress"]);
        assert_eq!(encoder.n_classes(), 3);
    }

    #[test]
    fn test_encode_decode() {
        let encoder = LabelEncoder::fitted(&["b", "a", "c"]).unwrap();

        let ids = encoder.encode(&["c", "a", "a"]).unwrap();
        assert_eq!(ids, vec![2, 0, 0]);
        assert_eq!(encoder.decode(&ids).unwrap(), vec!["c", "a", "a"]);
    }

    #[test]
    fn test_unseen_label() {
        let encoder = LabelEncoder::fitted(&["a", "b"]).unwrap();
        let err = encoder.encode(&["a", "zzz"]).unwrap_err();

        match err {
            SolaceError::UnseenLabel(label) => assert_eq!(label, "zzz"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_out_of_range() {
        let encoder = LabelEncoder::fitted(&["a"]).unwrap();
        assert!(encoder.decode_one(1).is_err());
    }

    #[test]
    fn test_fit_empty() {
        let mut encoder = LabelEncoder::new();
        assert!(encoder.fit::<&str>(&[]).is_err());
    }

    #[test]
    fn test_bincode_roundtrip() {
        let encoder = LabelEncoder::fitted(&["joy", "fear"]).unwrap();
        let bytes = bincode::serialize(&encoder).unwrap();
        let restored: LabelEncoder = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored, encoder);
        assert_eq!(restored.encode_one("joy").unwrap(), 1);
        assert!(restored.encode_one("anger").is_err());
    }
}
