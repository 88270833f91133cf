//! Standard analyzer: regex word tokens, lowercased.
//!
//! # Examples
//!
//! ```
//! use solace::analysis::analyzer::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new().unwrap();
//! let tokens: Vec<_> = analyzer.analyze("I feel SO alone").unwrap().collect();
//!
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[0].text, "feel");
//! assert_eq!(tokens[1].text, "so");
//! assert_eq!(tokens[2].text, "alone");
//! ```

use std::sync::Arc;

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::error::Result;

/// Word tokenizer plus lowercasing.
///
/// No stop words are removed: lexicon entries such as "alone" or "empty"
/// would otherwise never match.
pub struct StandardAnalyzer {
    inner: PipelineAnalyzer,
}

impl StandardAnalyzer {
    pub fn new() -> Result<Self> {
        let tokenizer = Arc::new(RegexTokenizer::new()?);
        let analyzer = PipelineAnalyzer::new(tokenizer)
            .add_filter(Arc::new(LowercaseFilter::new()))
            .with_name("standard");

        Ok(StandardAnalyzer { inner: analyzer })
    }

    /// Get the inner pipeline analyzer.
    pub fn inner(&self) -> &PipelineAnalyzer {
        &self.inner
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

impl std::fmt::Debug for StandardAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardAnalyzer")
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_analyzer_keeps_function_words() {
        let analyzer = StandardAnalyzer::new().unwrap();

        let tokens: Vec<String> = analyzer
            .analyze("Hello the EMPTY world")
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(tokens, vec!["hello", "the", "empty", "world"]);
        assert_eq!(analyzer.name(), "standard");
    }
}
