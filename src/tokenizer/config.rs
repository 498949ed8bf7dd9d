//! Tokenizer configuration types.

use serde::{Deserialize, Serialize};

/// Special tokens (BERT-style)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    /// Unknown token
    pub unk: String,
    /// Classification token prepended to every input
    pub cls: String,
    /// Separator appended after each segment
    pub sep: String,
    /// Padding token
    pub pad: String,
    /// Mask token (for MLM)
    pub mask: String,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            pad: "[PAD]".to_string(),
            unk: "[UNK]".to_string(),
            cls: "[CLS]".to_string(),
            sep: "[SEP]".to_string(),
            mask: "[MASK]".to_string(),
        }
    }
}

impl SpecialTokens {
    /// All special tokens in vocabulary order
    pub fn all(&self) -> [&str; 5] {
        [&self.pad, &self.unk, &self.cls, &self.sep, &self.mask]
    }
}

/// Tokenizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Special tokens
    pub special_tokens: SpecialTokens,
    /// Whether to lowercase input
    pub lowercase: bool,
    /// Prefix marking a continuation subtoken
    pub continuation_prefix: String,
    /// Words longer than this map straight to the unknown token
    pub max_chars_per_word: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            special_tokens: SpecialTokens::default(),
            lowercase: false,
            continuation_prefix: "##".to_string(),
            max_chars_per_word: 100,
        }
    }
}

impl TokenizerConfig {
    /// Create a WordPiece tokenizer config
    pub fn wordpiece() -> Self {
        Self::default()
    }

    /// Enable lowercase preprocessing
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Set the continuation prefix
    pub fn with_continuation_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.continuation_prefix = prefix.into();
        self
    }
}

/// How to shorten a sequence pair that exceeds `max_length`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Remove one token at a time from the longer segment
    #[default]
    LongestFirst,
    /// Only truncate the first segment
    OnlyFirst,
    /// Only truncate the second segment
    OnlySecond,
    /// Never truncate
    DoNotTruncate,
}

/// Padding and truncation settings for model-input assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddingConfig {
    /// Maximum assembled length, special tokens included
    pub max_length: usize,
    /// Pad every input up to `max_length`
    pub pad_to_max_length: bool,
    /// Truncation strategy
    pub truncation: TruncationStrategy,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            max_length: 512,
            pad_to_max_length: true,
            truncation: TruncationStrategy::LongestFirst,
        }
    }
}

impl PaddingConfig {
    /// Set maximum length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Enable or disable padding to `max_length`
    pub fn with_padding(mut self, pad: bool) -> Self {
        self.pad_to_max_length = pad;
        self
    }

    /// Set truncation strategy
    pub fn with_truncation(mut self, truncation: TruncationStrategy) -> Self {
        self.truncation = truncation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_config_default() {
        let config = TokenizerConfig::default();
        assert_eq!(config.continuation_prefix, "##");
        assert!(!config.lowercase);
    }

    #[test]
    fn test_special_tokens_default() {
        let special = SpecialTokens::default();
        assert_eq!(special.cls, "[CLS]");
        assert_eq!(special.sep, "[SEP]");
        assert_eq!(special.all()[0], "[PAD]");
    }

    #[test]
    fn test_padding_config_builder() {
        let cfg = PaddingConfig::default()
            .with_max_length(16)
            .with_padding(false)
            .with_truncation(TruncationStrategy::OnlyFirst);
        assert_eq!(cfg.max_length, 16);
        assert!(!cfg.pad_to_max_length);
        assert_eq!(cfg.truncation, TruncationStrategy::OnlyFirst);
    }

    #[test]
    fn test_truncation_strategy_serde() {
        let s: TruncationStrategy = serde_json::from_str("\"only_second\"").unwrap();
        assert_eq!(s, TruncationStrategy::OnlySecond);
    }
}
