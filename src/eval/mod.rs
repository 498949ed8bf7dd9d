//! Model evaluation during training
//!
//! Currently holds the generation metrics used on validation passes of
//! sequence-to-sequence models.
//!
//! ## Example
//!
//! ```ignore
//! use evaluar::eval::{EvalContext, Seq2SeqMetricsPipeline, CustomMetrics};
//!
//! let config = evaluar::config::load_config("metrics.yaml")?;
//! let mut pipeline =
//!     Seq2SeqMetricsPipeline::new(&config, EvalContext::new(tokenizer), CustomMetrics::new())?;
//! let keys = pipeline.on_fit_start()?;
//! ```

pub mod generative;

pub use generative::{
    CalcEvery, CustomMetrics, EvalContext, GenerationCollector, GenerationScheduler,
    MetricRegistry, Seq2SeqMetricsPipeline,
};
