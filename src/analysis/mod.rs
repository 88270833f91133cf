//! Text analysis module for Solace.
//!
//! Tokenization and filtering shared by the TF-IDF vectorizer and the
//! lexicon emotion service.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
