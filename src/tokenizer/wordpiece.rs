//! Vocabulary-driven WordPiece tokenizer.
//!
//! Greedy longest-match-first subword splitting over a fixed vocabulary,
//! with BERT-style structural tokens. Used as the reference implementation
//! of the [`Tokenizer`] capability.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::TokenizerConfig;
use super::error::{Result, TokenizerError};
use super::traits::{SpecialIds, TokenId, Tokenizer};

/// WordPiece tokenizer over a fixed vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPieceTokenizer {
    config: TokenizerConfig,
    vocab: HashMap<String, TokenId>,
    id_to_token: Vec<String>,
    special: SpecialIds,
    unk_id: TokenId,
    mask_id: TokenId,
}

impl WordPieceTokenizer {
    /// Build a tokenizer from a token list.
    ///
    /// Special tokens missing from `tokens` are prepended, so ids of the
    /// given tokens shift by the number of inserted specials.
    pub fn from_vocab<'a>(
        config: TokenizerConfig,
        tokens: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let tokens: Vec<&str> = tokens.into_iter().collect();
        let mut id_to_token: Vec<String> = config
            .special_tokens
            .all()
            .iter()
            .filter(|s| !tokens.contains(s))
            .map(|s| (*s).to_string())
            .collect();
        id_to_token.extend(tokens.iter().map(|t| (*t).to_string()));

        if id_to_token.is_empty() {
            return Err(TokenizerError::NotTrained);
        }

        let mut vocab = HashMap::with_capacity(id_to_token.len());
        for (id, tok) in id_to_token.iter().enumerate() {
            if vocab.insert(tok.clone(), id as TokenId).is_some() {
                return Err(TokenizerError::DuplicateToken(tok.clone()));
            }
        }

        let lookup = |t: &str| {
            vocab
                .get(t)
                .copied()
                .ok_or_else(|| TokenizerError::UnknownToken(t.to_string()))
        };
        let st = &config.special_tokens;
        let special = SpecialIds {
            cls: lookup(&st.cls)?,
            sep: lookup(&st.sep)?,
            pad: lookup(&st.pad)?,
        };
        let unk_id = lookup(&st.unk)?;
        let mask_id = lookup(&st.mask)?;

        Ok(Self {
            config,
            vocab,
            id_to_token,
            special,
            unk_id,
            mask_id,
        })
    }

    /// Unknown-token id
    pub fn unk_id(&self) -> TokenId {
        self.unk_id
    }

    /// Split a single pre-tokenized word into pieces
    fn split_word(&self, word: &str) -> Vec<String> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() > self.config.max_chars_per_word {
            return vec![self.config.special_tokens.unk.clone()];
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let mut end = chars.len();
            let mut found = None;
            while start < end {
                let mut candidate: String = chars[start..end].iter().collect();
                if start > 0 {
                    candidate.insert_str(0, &self.config.continuation_prefix);
                }
                if self.vocab.contains_key(&candidate) {
                    found = Some(candidate);
                    break;
                }
                end -= 1;
            }
            match found {
                Some(piece) => {
                    pieces.push(piece);
                    start = end;
                }
                None => return vec![self.config.special_tokens.unk.clone()],
            }
        }
        pieces
    }
}

/// Whitespace split, then split ASCII punctuation into standalone words
fn pre_tokenize(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in text.split_whitespace() {
        let mut current = String::new();
        for c in chunk.chars() {
            if c.is_ascii_punctuation() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                words.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

impl Tokenizer for WordPieceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        Ok(pre_tokenize(&text)
            .iter()
            .flat_map(|w| self.split_word(w))
            .collect())
    }

    fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.vocab.get(token).copied()
    }

    fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    fn vocab_size(&self) -> usize {
        self.id_to_token.len()
    }

    fn special_ids(&self) -> SpecialIds {
        self.special
    }

    fn is_special(&self, id: TokenId) -> bool {
        id == self.special.cls
            || id == self.special.sep
            || id == self.special.pad
            || id == self.unk_id
            || id == self.mask_id
    }

    fn join_tokens(&self, tokens: &[String]) -> String {
        let prefix = self.config.continuation_prefix.as_str();
        let mut out = String::new();
        for tok in tokens {
            match tok.strip_prefix(prefix) {
                Some(rest) if !prefix.is_empty() => out.push_str(rest),
                _ => {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(tok);
                }
            }
        }
        out
    }
}
