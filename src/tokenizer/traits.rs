//! Tokenizer trait definition.

use serde::{Deserialize, Serialize};

use super::config::{PaddingConfig, TruncationStrategy};
use super::error::{Result, TokenizerError};

/// Token ID type
pub type TokenId = u32;

/// Ids of the structural tokens a tokenizer inserts around content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialIds {
    pub cls: TokenId,
    pub sep: TokenId,
    pub pad: TokenId,
}

/// An assembled (and possibly padded) model input
///
/// All four vectors have the same length. `special_tokens_mask` is 1 for
/// structural and padding positions and 0 for real content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedInput {
    pub input_ids: Vec<TokenId>,
    pub attention_mask: Vec<u8>,
    pub token_type_ids: Vec<u8>,
    pub special_tokens_mask: Vec<u8>,
}

impl EncodedInput {
    /// Assembled length
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Whether the input is empty
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of real content positions
    pub fn content_len(&self) -> usize {
        self.special_tokens_mask.iter().filter(|&&m| m == 0).count()
    }
}

/// Tokenizer capability consumed by the alignment codec and metrics pipeline
pub trait Tokenizer: Send + Sync {
    /// Split text into subword pieces
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Get ID for token
    fn token_to_id(&self, token: &str) -> Option<TokenId>;

    /// Get token for ID
    fn id_to_token(&self, id: TokenId) -> Option<&str>;

    /// Get vocabulary size
    fn vocab_size(&self) -> usize;

    /// Structural token ids
    fn special_ids(&self) -> SpecialIds;

    /// Whether `id` is a special token
    fn is_special(&self, id: TokenId) -> bool;

    /// Join pieces back into text
    fn join_tokens(&self, tokens: &[String]) -> String;

    /// Encode text to token IDs (no special tokens)
    fn encode(&self, text: &str) -> Result<Vec<TokenId>> {
        self.tokenize(text)?
            .iter()
            .map(|t| {
                self.token_to_id(t)
                    .ok_or_else(|| TokenizerError::UnknownToken(t.clone()))
            })
            .collect()
    }

    /// Map ids back to their token strings
    fn ids_to_tokens(&self, ids: &[TokenId], skip_special: bool) -> Result<Vec<String>> {
        let mut tokens = Vec::with_capacity(ids.len());
        for &id in ids {
            if skip_special && self.is_special(id) {
                continue;
            }
            let tok = self
                .id_to_token(id)
                .ok_or(TokenizerError::InvalidTokenId(id))?;
            tokens.push(tok.to_string());
        }
        Ok(tokens)
    }

    /// Decode ids into text
    fn decode(&self, ids: &[TokenId], skip_special: bool, clean_spaces: bool) -> Result<String> {
        let tokens = self.ids_to_tokens(ids, skip_special)?;
        let text = self.join_tokens(&tokens);
        Ok(if clean_spaces {
            clean_up_tokenization(&text)
        } else {
            text
        })
    }

    /// Decode a batch of id sequences
    fn batch_decode(
        &self,
        sequences: &[Vec<TokenId>],
        skip_special: bool,
        clean_spaces: bool,
    ) -> Result<Vec<String>> {
        sequences
            .iter()
            .map(|ids| self.decode(ids, skip_special, clean_spaces))
            .collect()
    }

    /// Number of subword pieces each whitespace-separated word splits into
    fn word_subtoken_counts(&self, words: &[&str]) -> Result<Vec<usize>> {
        words
            .iter()
            .map(|w| self.tokenize(w).map(|pieces| pieces.len()))
            .collect()
    }

    /// Assemble `[CLS] a [SEP] (b [SEP])`, truncating and padding per `padding`
    fn prepare_for_model(
        &self,
        a: &[TokenId],
        b: Option<&[TokenId]>,
        padding: &PaddingConfig,
    ) -> Result<EncodedInput> {
        let special = if b.is_some() { 3 } else { 2 };
        let mut a = a.to_vec();
        let mut b = b.map(<[TokenId]>::to_vec);
        truncate_pair(&mut a, &mut b, special, padding)?;

        let ids = self.special_ids();
        let mut out = EncodedInput::default();
        let mut push = |id: TokenId, type_id: u8, is_special: bool| {
            out.input_ids.push(id);
            out.attention_mask.push(1);
            out.token_type_ids.push(type_id);
            out.special_tokens_mask.push(u8::from(is_special));
        };

        push(ids.cls, 0, true);
        for &id in &a {
            push(id, 0, false);
        }
        push(ids.sep, 0, true);
        if let Some(b) = &b {
            for &id in b {
                push(id, 1, false);
            }
            push(ids.sep, 1, true);
        }

        if padding.pad_to_max_length {
            while out.input_ids.len() < padding.max_length {
                out.input_ids.push(ids.pad);
                out.attention_mask.push(0);
                out.token_type_ids.push(0);
                out.special_tokens_mask.push(1);
            }
        }
        Ok(out)
    }
}

fn truncate_pair(
    a: &mut Vec<TokenId>,
    b: &mut Option<Vec<TokenId>>,
    special: usize,
    padding: &PaddingConfig,
) -> Result<()> {
    let b_len = b.as_ref().map_or(0, Vec::len);
    let total = a.len() + b_len + special;
    if total <= padding.max_length || padding.truncation == TruncationStrategy::DoNotTruncate {
        return Ok(());
    }
    let too_small = TokenizerError::MaxLengthTooSmall {
        len: a.len() + b_len,
        max_length: padding.max_length,
        special,
    };
    let budget = padding.max_length.checked_sub(special).ok_or(too_small)?;

    match padding.truncation {
        TruncationStrategy::LongestFirst => {
            while a.len() + b.as_ref().map_or(0, Vec::len) > budget {
                match b {
                    Some(b) if b.len() >= a.len() => {
                        b.pop();
                    }
                    _ => {
                        a.pop();
                    }
                }
            }
        }
        TruncationStrategy::OnlyFirst => {
            let keep = budget.checked_sub(b_len).ok_or(TokenizerError::MaxLengthTooSmall {
                len: a.len() + b_len,
                max_length: padding.max_length,
                special,
            })?;
            a.truncate(keep);
        }
        TruncationStrategy::OnlySecond => {
            let keep = budget.checked_sub(a.len());
            match (b.as_mut(), keep) {
                (Some(b), Some(keep)) => b.truncate(keep),
                _ => {
                    return Err(TokenizerError::MaxLengthTooSmall {
                        len: a.len() + b_len,
                        max_length: padding.max_length,
                        special,
                    })
                }
            }
        }
        TruncationStrategy::DoNotTruncate => {}
    }
    Ok(())
}

/// Remove spaces the tokenizer introduced before punctuation and contractions.
pub fn clean_up_tokenization(text: &str) -> String {
    const REPLACEMENTS: [(&str, &str); 10] = [
        (" .", "."),
        (" ?", "?"),
        (" !", "!"),
        (" ,", ","),
        (" ' ", "'"),
        (" n't", "n't"),
        (" 'm", "'m"),
        (" 's", "'s"),
        (" 've", "'ve"),
        (" 're", "'re"),
    ];
    REPLACEMENTS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}
