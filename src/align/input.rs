//! Model-input assembly per task kind.

use ndarray::Array2;

use super::codec::LabelUnit;
use super::special::SpecialTokenAligner;
use super::IgnoreIndex;
use crate::error::{EvaluarError, Result};
use crate::tokenizer::{PaddingConfig, TokenId, Tokenizer};

/// What the targets of an example mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// One category per content subtoken; aligned through the special-token mask
    TokenClassification,
    /// Target token ids of an output sequence
    Seq2Seq {
        /// Pad (or truncate) targets to this length with the ignore id
        max_target_length: Option<usize>,
    },
}

/// Assembled model input with its loss targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInput {
    pub input_ids: Vec<TokenId>,
    pub attention_mask: Vec<u8>,
    pub token_type_ids: Vec<u8>,
    pub special_tokens_mask: Vec<u8>,
    pub targets: Vec<i64>,
}

/// Tokenizer-assemble `a` (and optionally `b`) and shape `targets` for `task`.
pub fn build_model_input(
    task: TaskKind,
    tokenizer: &dyn Tokenizer,
    a: &[TokenId],
    b: Option<&[TokenId]>,
    targets: &[i64],
    padding: &PaddingConfig,
    ignore: IgnoreIndex,
) -> Result<ModelInput> {
    let encoded = tokenizer.prepare_for_model(a, b, padding)?;

    let targets = match task {
        TaskKind::TokenClassification => {
            SpecialTokenAligner::new(ignore).align_encoded(&encoded, targets)?
        }
        TaskKind::Seq2Seq { max_target_length } => {
            let mut t = targets.to_vec();
            if let Some(len) = max_target_length {
                t.resize(len, ignore.get());
            }
            t
        }
    };

    Ok(ModelInput {
        input_ids: encoded.input_ids,
        attention_mask: encoded.attention_mask,
        token_type_ids: encoded.token_type_ids,
        special_tokens_mask: encoded.special_tokens_mask,
        targets,
    })
}

/// Pair each word with its label and subtoken count.
pub fn units_from_words<S: AsRef<str>>(
    tokenizer: &dyn Tokenizer,
    words: &[&str],
    labels: &[S],
) -> Result<Vec<LabelUnit>> {
    if words.len() != labels.len() {
        return Err(EvaluarError::TargetCountMismatch {
            content_positions: words.len(),
            targets: labels.len(),
        });
    }
    let counts = tokenizer.word_subtoken_counts(words)?;
    Ok(labels
        .iter()
        .zip(counts)
        .map(|(label, n)| LabelUnit::new(label.as_ref(), n))
        .collect())
}

/// Stack ragged target rows into a batch, padding with the ignore id.
pub fn collate_targets(rows: &[Vec<i64>], ignore: IgnoreIndex) -> Array2<i64> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    Array2::from_shape_fn((rows.len(), width), |(i, j)| {
        rows[i].get(j).copied().unwrap_or(ignore.get())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{CategoryVocab, SubwordLabelCodec, IGNORE_INDEX};
    use crate::tokenizer::{TokenizerConfig, WordPieceTokenizer};

    fn tokenizer() -> WordPieceTokenizer {
        WordPieceTokenizer::from_vocab(
            TokenizerConfig::wordpiece(),
            ["Hugging", "Face", "is", "in", "New", "York", "Brook", "##lyn"],
        )
        .unwrap()
    }

    #[test]
    fn test_token_classification_end_to_end() {
        let tok = tokenizer();
        let words = ["Hugging", "Face", "is", "in", "Brooklyn"];
        let labels = ["ORG", "ORG", "O", "O", "LOC"];

        let units = units_from_words(&tok, &words, &labels).unwrap();
        assert_eq!(units[4], LabelUnit::new("LOC", 2));

        let codec = SubwordLabelCodec::with_vocab(CategoryVocab::from_labels(labels));
        let aligned = codec.encode(&units).unwrap();
        assert_eq!(aligned, vec![2, 2, 1, 1, 0, IGNORE_INDEX]);

        let a = tok.encode(&words.join(" ")).unwrap();
        let input = build_model_input(
            TaskKind::TokenClassification,
            &tok,
            &a,
            None,
            &aligned,
            &PaddingConfig::default().with_max_length(10),
            IgnoreIndex::default(),
        )
        .unwrap();

        assert_eq!(input.input_ids.len(), 10);
        assert_eq!(
            input.targets,
            vec![
                IGNORE_INDEX, 2, 2, 1, 1, 0, IGNORE_INDEX, IGNORE_INDEX, IGNORE_INDEX,
                IGNORE_INDEX
            ]
        );
        assert_eq!(codec.decode(&input.targets).unwrap(), labels);
    }

    #[test]
    fn test_truncation_surfaces_alignment_error() {
        let tok = tokenizer();
        let a = tok.encode("Hugging Face is in New York").unwrap();
        let targets = vec![0; a.len()];
        let err = build_model_input(
            TaskKind::TokenClassification,
            &tok,
            &a,
            None,
            &targets,
            &PaddingConfig::default().with_max_length(5),
            IgnoreIndex::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EvaluarError::TargetCountMismatch { .. }));
    }

    #[test]
    fn test_seq2seq_targets_are_padded() {
        let tok = tokenizer();
        let a = tok.encode("New York").unwrap();
        let input = build_model_input(
            TaskKind::Seq2Seq {
                max_target_length: Some(4),
            },
            &tok,
            &a,
            None,
            &[7, 8],
            &PaddingConfig::default().with_max_length(6),
            IgnoreIndex::default(),
        )
        .unwrap();
        assert_eq!(input.targets, vec![7, 8, IGNORE_INDEX, IGNORE_INDEX]);
    }

    #[test]
    fn test_units_from_words_length_mismatch() {
        let tok = tokenizer();
        assert!(units_from_words(&tok, &["New", "York"], &["LOC"]).is_err());
    }

    #[test]
    fn test_collate_targets_pads_rows() {
        let batch = collate_targets(&[vec![1, 2, 3], vec![4]], IgnoreIndex::default());
        assert_eq!(batch.shape(), &[2, 3]);
        assert_eq!(batch[[1, 0]], 4);
        assert_eq!(batch[[1, 2]], IGNORE_INDEX);
    }
}
