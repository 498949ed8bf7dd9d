//! Generation metrics for sequence-to-sequence validation
//!
//! - **Scheduling**: which epochs pay for generation ([`GenerationScheduler`])
//! - **Collection**: generated and reference ids per pass ([`GenerationCollector`])
//! - **Metrics**: built-in BLEU, SacreBLEU-style BLEU, ROUGE, and WER, plus
//!   custom compute functions ([`MetricRegistry`])
//! - **Orchestration**: the hook-driven [`Seq2SeqMetricsPipeline`]

pub mod builtin;
mod collector;
mod generator;
mod metric;
mod pipeline;
mod registry;
mod scheduler;
pub mod text_gen;


// Re-exports
pub use builtin::BUILTIN_METRICS;
pub use collector::{GenerationCollector, RenderedSequences};
pub use generator::{BatchInput, GenerationError, GenerationParams, Generator};
pub use metric::{
    compute_fn, AggregateScore, ComputeKwargs, InputKind, MetricCompute, MetricInputs, MetricMap,
    MetricResult, MetricSpec, MetricValue, MissingKeyPolicy, ReturnKeys, Score,
};
pub use pipeline::{EvalContext, PassState, Seq2SeqMetricsPipeline};
pub use registry::{CustomMetrics, MetricRegistry};
pub use scheduler::{should_compute, CalcEvery, GenerationScheduler, ScheduleState};
pub use text_gen::{corpus_bleu, rouge_l, rouge_n, sacre_bleu, word_error_rate, BleuScore};
