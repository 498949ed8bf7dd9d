//! Per-pass buffer of generated and reference id sequences.

use ndarray::ArrayView2;

use super::metric::{InputKind, MetricInputs};
use crate::align::IgnoreIndex;
use crate::error::{EvaluarError, Result};
use crate::tokenizer::{TokenId, Tokenizer};

/// Generated and reference sequences of one validation pass.
///
/// Index `i` of both sides always comes from the same example.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationCollector {
    generated: Vec<Vec<TokenId>>,
    references: Vec<Vec<TokenId>>,
}

impl GenerationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop everything collected so far
    pub fn reset(&mut self) {
        self.generated.clear();
        self.references.clear();
    }

    /// Append one batch.
    ///
    /// `targets` holds one row per example; ignore-id positions are
    /// stripped to recover the reference sequence. Nothing is appended
    /// when the row counts disagree.
    pub fn push_batch(
        &mut self,
        generated: Vec<Vec<TokenId>>,
        targets: ArrayView2<'_, i64>,
        ignore: IgnoreIndex,
    ) -> Result<()> {
        if generated.len() != targets.nrows() {
            return Err(EvaluarError::GenerationShape {
                generated: generated.len(),
                expected: targets.nrows(),
            });
        }

        let offset = self.references.len();
        let mut references = Vec::with_capacity(targets.nrows());
        for (row_idx, row) in targets.rows().into_iter().enumerate() {
            let reference = row
                .iter()
                .filter(|&&id| id != ignore.get())
                .map(|&id| {
                    TokenId::try_from(id).map_err(|_| EvaluarError::InvalidReferenceId {
                        example: offset + row_idx,
                        id,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            references.push(reference);
        }

        self.generated.extend(generated);
        self.references.extend(references);
        Ok(())
    }

    /// Number of collected examples
    pub fn len(&self) -> usize {
        self.generated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generated.is_empty()
    }

    pub fn generated(&self) -> &[Vec<TokenId>] {
        &self.generated
    }

    pub fn references(&self) -> &[Vec<TokenId>] {
        &self.references
    }

    /// Move the buffer out, leaving it empty
    pub fn take(&mut self) -> (Vec<Vec<TokenId>>, Vec<Vec<TokenId>>) {
        (
            std::mem::take(&mut self.generated),
            std::mem::take(&mut self.references),
        )
    }

    /// Convert the buffer into the four metric-facing collections
    pub fn render(&self, tokenizer: &dyn Tokenizer) -> Result<RenderedSequences> {
        RenderedSequences::new(tokenizer, &self.generated, &self.references)
    }
}

/// Token and text views of one pass, index-aligned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedSequences {
    pub generated_tokens: Vec<Vec<String>>,
    pub generated_text: Vec<String>,
    /// Reference tokens, each wrapped in a one-element list
    pub reference_tokens: Vec<Vec<Vec<String>>>,
    /// Reference text, each wrapped in a one-element list
    pub reference_text: Vec<Vec<String>>,
}

impl RenderedSequences {
    pub fn new(
        tokenizer: &dyn Tokenizer,
        generated: &[Vec<TokenId>],
        references: &[Vec<TokenId>],
    ) -> Result<Self> {
        let to_tokens = |seqs: &[Vec<TokenId>]| -> Result<Vec<Vec<String>>> {
            seqs.iter()
                .map(|ids| Ok(tokenizer.ids_to_tokens(ids, true)?))
                .collect()
        };

        Ok(Self {
            generated_tokens: to_tokens(generated)?,
            generated_text: tokenizer.batch_decode(generated, true, true)?,
            reference_tokens: to_tokens(references)?
                .into_iter()
                .map(|r| vec![r])
                .collect(),
            reference_text: tokenizer
                .batch_decode(references, true, true)?
                .into_iter()
                .map(|r| vec![r])
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.generated_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generated_text.is_empty()
    }

    /// Predictions and references in the shape `kind` expects
    pub fn inputs_for(&self, kind: InputKind) -> MetricInputs<'_> {
        match kind {
            InputKind::Tokens => MetricInputs::Tokens {
                predictions: &self.generated_tokens,
                references: &self.reference_tokens,
            },
            InputKind::Text | InputKind::MultiReferenceText => MetricInputs::Text {
                predictions: &self.generated_text,
                references: &self.reference_text,
            },
        }
    }
}
