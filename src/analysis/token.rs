//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows through the analysis pipeline, from the
//! tokenizer through each filter and finally into the TF-IDF vectorizer or
//! the lexicon emotion service.
//!
//! # Examples
//!
//! ```
//! use solace::analysis::token::Token;
//!
//! let token = Token::new("world");
//! assert_eq!(token.text, "world");
//! assert_eq!(token.to_string(), "world");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,
}

impl Token {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Token { text: text.into() }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A token stream represents a sequence of tokens from the analysis pipeline.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new("hello");
        assert_eq!(token.text, "hello");
        assert_eq!(format!("{token}"), "hello");
    }
}
