//! Core analyzer trait definition.
//!
//! Analyzers are the complete text processing pipeline used by the crate:
//!
//! ```text
//! Raw Text → Analyzer → Token Stream → TF-IDF vectorizer / lexicon service
//!             ↓
//!         Tokenizer
//!             ↓
//!         Filter 1 … Filter N
//! ```
//!
//! # Examples
//!
//! ```
//! use solace::analysis::analyzer::{Analyzer, StandardAnalyzer};
//!
//! let analyzer = StandardAnalyzer::new().unwrap();
//! let tokens: Vec<_> = analyzer.analyze("Hello World").unwrap().collect();
//!
//! assert_eq!(tokens[0].text, "hello");
//! assert_eq!(tokens[1].text, "world");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// The trait requires `Send + Sync` so a single analyzer can sit inside the
/// shared, immutable agent context.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and logging).
    fn name(&self) -> &str;
}
