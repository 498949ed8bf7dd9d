//! Target alignment driven by the tokenizer's special-token mask.

use super::IgnoreIndex;
use crate::error::{EvaluarError, Result};
use crate::tokenizer::{EncodedInput, TokenId};

/// Distributes per-position targets onto the content positions of an
/// assembled input.
///
/// Structural and padding positions (mask = 1) get the ignore id; the k-th
/// content position (mask = 0) gets the k-th target.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialTokenAligner {
    ignore: IgnoreIndex,
}

impl SpecialTokenAligner {
    pub fn new(ignore: IgnoreIndex) -> Self {
        Self { ignore }
    }

    /// Align `targets` to `input_ids` using `special_tokens_mask`.
    ///
    /// Fails when the mask and input disagree in length, or when the number
    /// of content positions differs from the number of targets.
    pub fn align(
        &self,
        input_ids: &[TokenId],
        special_tokens_mask: &[u8],
        targets: &[i64],
    ) -> Result<Vec<i64>> {
        if input_ids.len() != special_tokens_mask.len() {
            return Err(EvaluarError::MaskLengthMismatch {
                mask_len: special_tokens_mask.len(),
                input_len: input_ids.len(),
            });
        }
        let content_positions = special_tokens_mask.iter().filter(|&&m| m == 0).count();
        if content_positions != targets.len() {
            return Err(EvaluarError::TargetCountMismatch {
                content_positions,
                targets: targets.len(),
            });
        }

        let ignore = self.ignore.get();
        let mut next = targets.iter().copied();
        Ok(special_tokens_mask
            .iter()
            .map(|&m| if m == 0 { next.next().unwrap_or(ignore) } else { ignore })
            .collect())
    }

    /// Align against an [`EncodedInput`]
    pub fn align_encoded(&self, input: &EncodedInput, targets: &[i64]) -> Result<Vec<i64>> {
        self.align(&input.input_ids, &input.special_tokens_mask, targets)
    }
}
