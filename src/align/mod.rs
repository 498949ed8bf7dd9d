//! Subword-to-word label alignment.
//!
//! Subword tokenization splits one labelled word into several pieces. Only
//! the first piece should contribute to the loss, so:
//!
//! - [`SubwordLabelCodec`] encodes `(label, subtoken count)` units into an
//!   id sequence with the ignore id on continuation pieces, and decodes it
//!   back to word labels
//! - [`SpecialTokenAligner`] places per-position targets onto the content
//!   positions of an assembled input using the tokenizer's special-token mask
//! - [`build_model_input`] picks the alignment path from the [`TaskKind`]
//!
//! # Example
//!
//! ```
//! use evaluar::align::{CategoryVocab, LabelUnit, SubwordLabelCodec, IGNORE_INDEX};
//!
//! let codec = SubwordLabelCodec::with_vocab(CategoryVocab::new(["O", "PER", "ORG"]));
//! let ids = codec.encode(&[LabelUnit::new("PER", 3)]).unwrap();
//! assert_eq!(ids, vec![1, IGNORE_INDEX, IGNORE_INDEX]);
//! assert_eq!(codec.decode(&ids).unwrap(), vec!["PER"]);
//! ```

mod codec;
mod input;
mod special;
mod vocab;


pub use codec::{LabelUnit, SubwordLabelCodec};
pub use input::{build_model_input, collate_targets, units_from_words, ModelInput, TaskKind};
pub use special::SpecialTokenAligner;
pub use vocab::CategoryVocab;

use crate::error::{EvaluarError, Result};

/// Cross-entropy ignore id
pub const IGNORE_INDEX: i64 = -100;

/// A negative sentinel id excluded from loss and decoded output
///
/// Negative by construction, so it never collides with a vocab id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IgnoreIndex(i64);

impl IgnoreIndex {
    /// Validate a custom ignore id
    pub fn new(id: i64) -> Result<Self> {
        if id >= 0 {
            return Err(EvaluarError::config(
                "ignore_token_id",
                format!("{id} can collide with a category or token id"),
                "use a negative value such as -100",
            ));
        }
        Ok(Self(id))
    }

    /// Raw id
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for IgnoreIndex {
    fn default() -> Self {
        Self(IGNORE_INDEX)
    }
}
