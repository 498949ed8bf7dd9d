//! Error types with actionable diagnostics.
//!
//! Every failure surfaces immediately to the caller; nothing here is
//! retried. [`ErrorKind`] groups variants into the four families a training
//! loop needs to react to (configuration, alignment, vocabulary, generation)
//! plus a few auxiliary ones.

use std::path::PathBuf;
use thiserror::Error;

use crate::eval::generative::GenerationError;
use crate::tokenizer::TokenizerError;

/// Result type alias for evaluar operations.
pub type Result<T> = std::result::Result<T, EvaluarError>;

/// Coarse classification of an [`EvaluarError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Misconfigured metric, cadence, or ignore id
    Configuration,
    /// Subtoken counts or content positions do not line up with labels
    Alignment,
    /// Encode/decode attempted before the category vocab exists
    VocabNotBuilt,
    /// The model's generate capability failed or timed out
    Generation,
    /// A metric's compute function failed
    MetricCompute,
    /// Tokenizer capability failed
    Tokenizer,
    /// A declared metric key was absent under the strict policy
    MissingMetricKey,
    /// Hooks fired out of training-loop order
    HookOrder,
    /// Filesystem failure while loading configuration
    Io,
}

/// Errors raised by the alignment codec and the metrics pipeline.
#[derive(Error, Debug)]
pub enum EvaluarError {
    /// Configuration value is invalid.
    #[error("Invalid configuration value for '{field}': {message}\n  → {suggestion}")]
    ConfigValue {
        field: String,
        message: String,
        suggestion: String,
    },

    /// Metric name is neither built in nor backed by a custom compute function.
    #[error("Unknown metric '{name}'\n  → Use one of the built-in metrics ({known}) or supply a compute function")]
    UnknownMetric { name: String, known: String },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration syntax in {path}:\n  {message}\n  → Check YAML/JSON syntax at the indicated line")]
    ConfigParsing { path: PathBuf, message: String },

    /// Configuration file not found at expected path.
    #[error("Configuration file not found: {path}\n  → Create a metrics config or pass a different path")]
    ConfigNotFound { path: PathBuf },

    /// A word was declared with zero subtokens.
    #[error("Word {index} ('{label}') has a subtoken count of 0\n  → Every word must map to at least one subtoken")]
    ZeroSubtokens { index: usize, label: String },

    /// Number of content positions differs from the number of targets.
    #[error("Alignment mismatch: {content_positions} content positions but {targets} targets\n  → Check truncation settings; targets are never padded or truncated to fit")]
    TargetCountMismatch {
        content_positions: usize,
        targets: usize,
    },

    /// Special-token mask and input ids disagree in length.
    #[error("Special-token mask has length {mask_len} but input has length {input_len}")]
    MaskLengthMismatch { mask_len: usize, input_len: usize },

    /// Label is not part of the category vocab.
    #[error("Label '{label}' is not in the category vocab\n  → Build the vocab from the full label set")]
    UnknownLabel { label: String },

    /// Id is neither the ignore id nor a vocab id.
    #[error("Id {id} is outside the category vocab (size {size})")]
    UnknownCategoryId { id: i64, size: usize },

    /// Reference id cannot be converted into a token id.
    #[error("Reference id {id} in example {example} is not a valid token id")]
    InvalidReferenceId { example: usize, id: i64 },

    /// Encode/decode before the vocab was built.
    #[error("Category vocab has not been built\n  → Call build() with the label universe before encoding or decoding")]
    VocabNotBuilt,

    /// Generation failed during a validation pass.
    #[error("Generation failed on validation batch {batch}: {source}")]
    Generation {
        batch: usize,
        #[source]
        source: GenerationError,
    },

    /// Generation returned a different number of sequences than examples.
    #[error("Generation returned {generated} sequences for a batch of {expected} examples")]
    GenerationShape { generated: usize, expected: usize },

    /// Generation metrics were requested for a classification-style batch.
    #[error("Validation batch is not generation-style input\n  → Generation metrics need input ids and an attention mask")]
    NotGenerationInput,

    /// Tokenizer failure.
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    /// Metric computation failed.
    #[error("Metric '{metric}' failed: {message}")]
    MetricCompute { metric: String, message: String },

    /// Declared return key was absent under the strict policy.
    #[error("Metric '{metric}' did not return declared key '{key}'\n  → Fix `returns` or switch missing_keys to lenient")]
    MissingMetricKey { metric: String, key: String },

    /// Hook fired in a state that does not allow it.
    #[error("Hook '{hook}' is not valid while {state}")]
    HookOrder { hook: &'static str, state: String },

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl EvaluarError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration value error.
    pub fn config(
        field: impl Into<String>,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::ConfigValue {
            field: field.into(),
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Error family of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigValue { .. }
            | Self::UnknownMetric { .. }
            | Self::ConfigParsing { .. }
            | Self::ConfigNotFound { .. }
            | Self::NotGenerationInput => ErrorKind::Configuration,
            Self::ZeroSubtokens { .. }
            | Self::TargetCountMismatch { .. }
            | Self::MaskLengthMismatch { .. }
            | Self::UnknownLabel { .. }
            | Self::UnknownCategoryId { .. }
            | Self::InvalidReferenceId { .. } => ErrorKind::Alignment,
            Self::VocabNotBuilt => ErrorKind::VocabNotBuilt,
            Self::Generation { .. } | Self::GenerationShape { .. } => ErrorKind::Generation,
            Self::MetricCompute { .. } => ErrorKind::MetricCompute,
            Self::Tokenizer(_) => ErrorKind::Tokenizer,
            Self::MissingMetricKey { .. } => ErrorKind::MissingMetricKey,
            Self::HookOrder { .. } => ErrorKind::HookOrder,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Get the error code for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigValue { .. } => "E001",
            Self::UnknownMetric { .. } => "E002",
            Self::ConfigParsing { .. } => "E003",
            Self::ConfigNotFound { .. } => "E004",
            Self::NotGenerationInput => "E005",
            Self::ZeroSubtokens { .. } => "E010",
            Self::TargetCountMismatch { .. } => "E011",
            Self::MaskLengthMismatch { .. } => "E012",
            Self::UnknownLabel { .. } => "E013",
            Self::UnknownCategoryId { .. } => "E014",
            Self::InvalidReferenceId { .. } => "E015",
            Self::VocabNotBuilt => "E020",
            Self::Generation { .. } => "E030",
            Self::GenerationShape { .. } => "E031",
            Self::MetricCompute { .. } => "E032",
            Self::Tokenizer(_) => "E040",
            Self::MissingMetricKey { .. } => "E050",
            Self::HookOrder { .. } => "E060",
            Self::Io { .. } => "E070",
        }
    }
}
