//! # Evaluar: Label Alignment and Generation Metrics
//!
//! Evaluar covers two bookkeeping-heavy pieces of sequence-model training:
//!
//! - **Alignment**: word-level labels made loss-computable over a subword
//!   sequence, and reversible back to word-level predictions
//! - **Generation metrics**: during validation passes, conditionally run the
//!   model's generate capability, collect generated and reference sequences
//!   across batches, and compute text-generation metrics that each expect a
//!   different input shape
//!
//! The training loop itself stays outside; it drives a
//! [`Seq2SeqMetricsPipeline`] through the [`train::TrainerCallback`] hooks.
//!
//! ## Architecture
//!
//! - `align`: category vocab, subword label codec, special-token aligner
//! - `tokenizer`: tokenizer capability and a WordPiece implementation
//! - `eval`: generation scheduler, collector, metric registry, pipeline
//! - `config`: YAML/JSON metrics configuration
//! - `train`: training-loop callback hooks
//! - `cli`: `evaluar validate` / `evaluar schedule`

pub mod align;
pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod tokenizer;
pub mod train;

pub use align::{CategoryVocab, IgnoreIndex, LabelUnit, SpecialTokenAligner, SubwordLabelCodec};
pub use config::MetricsConfig;
pub use error::{ErrorKind, EvaluarError, Result};
pub use eval::{EvalContext, Seq2SeqMetricsPipeline};
