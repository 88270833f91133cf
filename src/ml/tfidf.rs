//! TF-IDF vectorizer for text feature extraction.
//!
//! The vectorizer is fit once on training texts and then frozen: the
//! vocabulary, its ordering and the IDF weights never change afterwards, so
//! every transformed vector has the same dimension. Terms that were not seen
//! during fitting are ignored.
//!
//! Weighting follows the usual smoothed scheme:
//!
//! ```text
//! idf(t)     = ln((1 + n) / (1 + df(t))) + 1
//! tfidf(t,d) = count(t, d) * idf(t), then L2-normalized per document
//! ```
//!
//! # Example
//!
//! ```
//! use solace::ml::tfidf::{TfIdfVectorizer, VectorizerConfig};
//!
//! let docs = ["I feel so alone", "such a happy day", "alone again today"];
//! let mut vectorizer = TfIdfVectorizer::new(VectorizerConfig::default()).unwrap();
//! let train = vectorizer.fit_transform(&docs).unwrap();
//!
//! assert_eq!(train.n_rows(), 3);
//! assert_eq!(train.n_cols(), vectorizer.vocabulary_size());
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::token_filter::LowercaseFilter;
use crate::analysis::tokenizer::RegexTokenizer;
use crate::analysis::tokenizer::regex::WORD_PATTERN;
use crate::error::{Result, SolaceError};
use crate::ml::sparse::{SparseMatrix, SparseVector};

/// Settings that shape the vocabulary. Frozen together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Keep at most this many terms, ranked by document frequency.
    pub max_features: Option<usize>,
    /// Inclusive range of n-gram lengths (in tokens).
    pub ngram_range: (usize, usize),
    /// Regex used to extract tokens.
    pub token_pattern: String,
    /// Lowercase tokens before counting.
    pub lowercase: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        VectorizerConfig {
            max_features: Some(5000),
            ngram_range: (1, 2),
            token_pattern: WORD_PATTERN.to_string(),
            lowercase: true,
        }
    }
}

impl VectorizerConfig {
    /// Check the n-gram range and feature cap.
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SolaceError::invalid_config(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if self.max_features == Some(0) {
            return Err(SolaceError::invalid_config("max_features must be at least 1"));
        }
        Ok(())
    }
}

/// TF-IDF vectorizer for text feature extraction.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "TfIdfState", into = "TfIdfState")]
pub struct TfIdfVectorizer {
    config: VectorizerConfig,
    /// Vocabulary: term -> column index.
    vocabulary: HashMap<String, usize>,
    /// Column index -> term, in lexicographic order.
    terms: Vec<String>,
    /// Inverse document frequency for each column.
    idf: Vec<f64>,
    /// Total number of documents seen during fitting. Zero until fitted.
    n_documents: usize,
    /// Analyzer for tokenization, rebuilt from `config` on load.
    analyzer: Arc<dyn Analyzer>,
}

/// Serialized form of a fitted vectorizer.
#[derive(Serialize, Deserialize)]
struct TfIdfState {
    config: VectorizerConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl TryFrom<TfIdfState> for TfIdfVectorizer {
    type Error = SolaceError;

    fn try_from(state: TfIdfState) -> Result<Self> {
        if state.terms.len() != state.idf.len() {
            return Err(SolaceError::serialization(format!(
                "vectorizer has {} terms but {} idf weights",
                state.terms.len(),
                state.idf.len()
            )));
        }

        let mut vectorizer = TfIdfVectorizer::new(state.config)?;
        vectorizer.vocabulary = state
            .terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        vectorizer.terms = state.terms;
        vectorizer.idf = state.idf;
        vectorizer.n_documents = state.n_documents;
        Ok(vectorizer)
    }
}

impl From<TfIdfVectorizer> for TfIdfState {
    fn from(vectorizer: TfIdfVectorizer) -> Self {
        TfIdfState {
            config: vectorizer.config,
            terms: vectorizer.terms,
            idf: vectorizer.idf,
            n_documents: vectorizer.n_documents,
        }
    }
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("ngram_range", &self.config.ngram_range)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = Self::build_analyzer(&config)?;

        Ok(Self {
            config,
            vocabulary: HashMap::new(),
            terms: Vec::new(),
            idf: Vec::new(),
            n_documents: 0,
            analyzer,
        })
    }

    fn build_analyzer(config: &VectorizerConfig) -> Result<Arc<dyn Analyzer>> {
        let tokenizer = Arc::new(RegexTokenizer::with_pattern(&config.token_pattern)?);
        let mut analyzer = PipelineAnalyzer::new(tokenizer).with_name("tfidf");
        if config.lowercase {
            analyzer = analyzer.add_filter(Arc::new(LowercaseFilter::new()));
        }
        Ok(Arc::new(analyzer))
    }

    /// Fit the vocabulary and IDF weights on training documents.
    ///
    /// A vectorizer can only be fit once; fitting again (for example on test
    /// data) is rejected.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<()> {
        if self.is_fitted() {
            return Err(SolaceError::invalid_operation(
                "vectorizer is already fitted; create a new one to re-fit",
            ));
        }
        if documents.is_empty() {
            return Err(SolaceError::invalid_argument(
                "cannot fit vectorizer on zero documents",
            ));
        }

        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = self.extract_terms(doc.as_ref())?.into_iter().collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(SolaceError::invalid_argument(
                "empty vocabulary; documents contain no usable tokens",
            ));
        }

        // Highest document frequency first, ties broken by the term itself
        let mut ranked: Vec<(String, usize)> = document_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(max_features) = self.config.max_features {
            ranked.truncate(max_features);
        }
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n_documents = documents.len() as f64;
        self.idf = ranked
            .iter()
            .map(|(_, df)| ((n_documents + 1.0) / (*df as f64 + 1.0)).ln() + 1.0)
            .collect();
        self.terms = ranked.into_iter().map(|(term, _)| term).collect();
        self.vocabulary = self
            .terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        self.n_documents = documents.len();

        log::debug!(
            "fitted tf-idf vocabulary of {} terms on {} documents",
            self.terms.len(),
            self.n_documents
        );

        Ok(())
    }

    /// Transform a document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        self.ensure_fitted()?;

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.extract_terms(document)? {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();
        let mut vector = SparseVector::from_pairs(self.vocabulary_size(), pairs)?;
        vector.normalize();

        Ok(vector)
    }

    /// Transform many documents into a matrix, one row per document.
    pub fn transform_batch<S: AsRef<str>>(&self, documents: &[S]) -> Result<SparseMatrix> {
        self.ensure_fitted()?;

        let mut matrix = SparseMatrix::new(self.vocabulary_size());
        for doc in documents {
            matrix.push_row(self.transform(doc.as_ref())?)?;
        }
        Ok(matrix)
    }

    /// Fit on `documents` and return their transformed matrix.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<SparseMatrix> {
        self.fit(documents)?;
        self.transform_batch(documents)
    }

    /// Tokenize with the analyzer and expand into the configured n-grams.
    fn extract_terms(&self, text: &str) -> Result<Vec<String>> {
        let tokens: Vec<String> = self.analyzer.analyze(text)?.map(|token| token.text).collect();
        Ok(ngrams(&tokens, self.config.ngram_range))
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.is_fitted() {
            Ok(())
        } else {
            Err(SolaceError::invalid_operation(
                "vectorizer must be fitted before transform",
            ))
        }
    }

    /// Whether `fit` has run.
    pub fn is_fitted(&self) -> bool {
        self.n_documents > 0
    }

    /// Get the size of the vocabulary (the feature dimension).
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Column index of a term, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Terms in column order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// IDF weight per column.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of documents the vectorizer was fitted on.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// The frozen configuration.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// CRC32 over the ordered vocabulary.
    ///
    /// Classifiers record this value so a model is never paired with a
    /// vectorizer whose columns mean something else.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for term in &self.terms {
            hasher.update(term.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize()
    }
}

/// Contiguous token windows for every length in `range`, joined by a space.
fn ngrams(tokens: &[String], (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n > tokens.len() {
            break;
        }
        terms.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    terms
}
