//! Word-label to subword-label codec.

use std::sync::OnceLock;

use super::vocab::CategoryVocab;
use super::IgnoreIndex;
use crate::error::{EvaluarError, Result};

/// One original word: its label and how many subtokens it became
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelUnit {
    pub label: String,
    pub subtokens: usize,
}

impl LabelUnit {
    pub fn new(label: impl Into<String>, subtokens: usize) -> Self {
        Self {
            label: label.into(),
            subtokens,
        }
    }
}

/// Reversible encoding of per-word labels onto subword positions.
///
/// Only the first subtoken of each word carries the label id; continuation
/// subtokens carry the ignore id so they drop out of the loss.
#[derive(Debug, Default)]
pub struct SubwordLabelCodec {
    vocab: OnceLock<CategoryVocab>,
    ignore: IgnoreIndex,
}

impl SubwordLabelCodec {
    /// Codec with the default ignore id and no vocab yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with a prebuilt vocab
    pub fn with_vocab(vocab: CategoryVocab) -> Self {
        let codec = Self::new();
        codec.build_with(vocab);
        codec
    }

    /// Replace the ignore id
    pub fn with_ignore_index(mut self, ignore: IgnoreIndex) -> Self {
        self.ignore = ignore;
        self
    }

    /// Build the vocab from the label universe in the given order.
    ///
    /// The first build wins; later calls return the existing vocab.
    pub fn build<I, S>(&self, label_universe: I) -> &CategoryVocab
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocab.get_or_init(|| CategoryVocab::new(label_universe))
    }

    /// Install a constructed vocab unless one is already built.
    pub fn build_with(&self, vocab: CategoryVocab) -> &CategoryVocab {
        self.vocab.get_or_init(|| vocab)
    }

    /// The built vocab
    pub fn vocab(&self) -> Result<&CategoryVocab> {
        self.vocab.get().ok_or(EvaluarError::VocabNotBuilt)
    }

    /// Number of categories the model predicts over
    pub fn num_classes(&self) -> Result<usize> {
        self.vocab().map(CategoryVocab::len)
    }

    /// Ignore id in use
    pub fn ignore_index(&self) -> IgnoreIndex {
        self.ignore
    }

    /// Encode word labels into a subword-aligned id sequence
    pub fn encode(&self, units: &[LabelUnit]) -> Result<Vec<i64>> {
        let vocab = self.vocab()?;
        let total = units.iter().map(|u| u.subtokens).sum();
        let mut ids = Vec::with_capacity(total);
        for (index, unit) in units.iter().enumerate() {
            if unit.subtokens == 0 {
                return Err(EvaluarError::ZeroSubtokens {
                    index,
                    label: unit.label.clone(),
                });
            }
            let id = vocab
                .id(&unit.label)
                .ok_or_else(|| EvaluarError::UnknownLabel {
                    label: unit.label.clone(),
                })?;
            ids.push(id);
            ids.extend(std::iter::repeat(self.ignore.get()).take(unit.subtokens - 1));
        }
        Ok(ids)
    }

    /// Drop ignore positions and map the remaining ids back to labels
    pub fn decode(&self, ids: &[i64]) -> Result<Vec<String>> {
        let vocab = self.vocab()?;
        ids.iter()
            .filter(|&&id| id != self.ignore.get())
            .map(|&id| {
                vocab
                    .label(id)
                    .map(str::to_string)
                    .ok_or(EvaluarError::UnknownCategoryId {
                        id,
                        size: vocab.len(),
                    })
            })
            .collect()
    }

    /// Word-level labels for model predictions.
    ///
    /// Keeps the predicted id at every position whose aligned target is not
    /// the ignore id, so one label comes back per original word.
    pub fn decode_predictions(
        &self,
        predicted: &[i64],
        aligned_targets: &[i64],
    ) -> Result<Vec<String>> {
        if predicted.len() != aligned_targets.len() {
            return Err(EvaluarError::MaskLengthMismatch {
                mask_len: aligned_targets.len(),
                input_len: predicted.len(),
            });
        }
        let kept: Vec<i64> = predicted
            .iter()
            .zip(aligned_targets)
            .filter(|&(_, &t)| t != self.ignore.get())
            .map(|(&p, _)| p)
            .collect();
        self.decode(&kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::IGNORE_INDEX;
    use crate::error::ErrorKind;

    fn codec() -> SubwordLabelCodec {
        SubwordLabelCodec::with_vocab(CategoryVocab::new(["O", "PER", "ORG"]))
    }

    #[test]
    fn test_encode_single_unit_with_continuations() {
        let ids = codec().encode(&[LabelUnit::new("PER", 3)]).unwrap();
        assert_eq!(ids, vec![1, IGNORE_INDEX, IGNORE_INDEX]);
    }

    #[test]
    fn test_decode_drops_ignore_positions() {
        let labels = codec().decode(&[1, IGNORE_INDEX, IGNORE_INDEX]).unwrap();
        assert_eq!(labels, vec!["PER"]);
    }

    #[test]
    fn test_encode_concatenates_in_order() {
        let units = [
            LabelUnit::new("O", 1),
            LabelUnit::new("ORG", 2),
            LabelUnit::new("PER", 1),
        ];
        assert_eq!(
            codec().encode(&units).unwrap(),
            vec![0, 2, IGNORE_INDEX, 1]
        );
    }

    #[test]
    fn test_zero_subtokens_is_alignment_error() {
        let err = codec().encode(&[LabelUnit::new("O", 0)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Alignment);
    }

    #[test]
    fn test_unbuilt_vocab() {
        let codec = SubwordLabelCodec::new();
        assert_eq!(
            codec.encode(&[LabelUnit::new("O", 1)]).unwrap_err().kind(),
            ErrorKind::VocabNotBuilt
        );
        assert_eq!(codec.decode(&[0]).unwrap_err().kind(), ErrorKind::VocabNotBuilt);
        assert!(codec.num_classes().is_err());
    }

    #[test]
    fn test_first_build_wins() {
        let codec = SubwordLabelCodec::new();
        codec.build(["O", "PER"]);
        let vocab = codec.build(["X", "Y", "Z"]);
        assert_eq!(vocab.items(), &["O", "PER"]);
        assert_eq!(codec.num_classes().unwrap(), 2);
    }

    #[test]
    fn test_unknown_label_and_id() {
        let codec = codec();
        assert!(matches!(
            codec.encode(&[LabelUnit::new("LOC", 1)]),
            Err(EvaluarError::UnknownLabel { .. })
        ));
        assert!(matches!(
            codec.decode(&[7]),
            Err(EvaluarError::UnknownCategoryId { id: 7, size: 3 })
        ));
    }

    #[test]
    fn test_custom_ignore_index() {
        let codec = codec().with_ignore_index(IgnoreIndex::new(-1).unwrap());
        let ids = codec.encode(&[LabelUnit::new("ORG", 2)]).unwrap();
        assert_eq!(ids, vec![2, -1]);
        assert_eq!(codec.decode(&ids).unwrap(), vec!["ORG"]);
    }

    #[test]
    fn test_decode_predictions_uses_target_mask() {
        let codec = codec();
        let targets = codec
            .encode(&[LabelUnit::new("PER", 2), LabelUnit::new("O", 1)])
            .unwrap();
        let predicted = vec![1, 2, 0];
        assert_eq!(
            codec.decode_predictions(&predicted, &targets).unwrap(),
            vec!["PER", "O"]
        );
        assert!(codec.decode_predictions(&[1], &targets).is_err());
    }
}
