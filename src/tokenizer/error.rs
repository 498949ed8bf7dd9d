//! Tokenizer error types.

use thiserror::Error;

/// Tokenizer errors
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("Vocabulary is empty")]
    NotTrained,

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Invalid token ID: {0}")]
    InvalidTokenId(u32),

    #[error("Duplicate token in vocabulary: {0}")]
    DuplicateToken(String),

    #[error("Sequence of {len} tokens does not fit max_length {max_length} with {special} special tokens")]
    MaxLengthTooSmall {
        len: usize,
        max_length: usize,
        special: usize,
    },
}

/// Result type for tokenizer operations
pub type Result<T> = std::result::Result<T, TokenizerError>;
