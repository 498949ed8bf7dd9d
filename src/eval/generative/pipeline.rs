//! Validation-time generation metrics.
//!
//! [`Seq2SeqMetricsPipeline`] reacts to training-loop hooks: it decides per
//! epoch whether generation metrics are due, runs the model's generate
//! capability on every validation batch of such a pass, and computes the
//! configured metrics once the pass ends.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use ndarray::Array2;
use tracing::{debug, info};

use super::collector::GenerationCollector;
use super::generator::{BatchInput, GenerationParams, Generator};
use super::metric::MetricMap;
use super::registry::{CustomMetrics, MetricRegistry};
use super::scheduler::GenerationScheduler;
use crate::align::IgnoreIndex;
use crate::config::MetricsConfig;
use crate::error::{EvaluarError, Result};
use crate::tokenizer::Tokenizer;
use crate::train::callback::{BatchEnd, CallbackContext, TrainerCallback};

/// Collaborators the pipeline needs at evaluation time
#[derive(Clone)]
pub struct EvalContext {
    tokenizer: Arc<dyn Tokenizer>,
    default_generation: GenerationParams,
}

impl EvalContext {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            default_generation: GenerationParams::new(),
        }
    }

    /// Generation parameters used when the config declares none
    pub fn with_default_generation(mut self, params: GenerationParams) -> Self {
        self.default_generation = params;
        self
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    pub fn default_generation(&self) -> &GenerationParams {
        &self.default_generation
    }
}

impl fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("vocab_size", &self.tokenizer.vocab_size())
            .field("default_generation", &self.default_generation)
            .finish()
    }
}

/// Where the pipeline is in the training loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Constructed, fit not started
    Idle,
    /// Fit started, no epoch yet
    Fitting,
    /// Inside an epoch, outside validation
    Epoch { compute: bool },
    /// Inside a validation pass
    Validating {
        compute: bool,
        failed: bool,
        batches: usize,
    },
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fitting => write!(f, "fitting before the first epoch"),
            Self::Epoch { .. } => write!(f, "inside an epoch"),
            Self::Validating { .. } => write!(f, "validating"),
        }
    }
}

/// Generation metrics for sequence-to-sequence validation passes
#[derive(Debug)]
pub struct Seq2SeqMetricsPipeline {
    registry: MetricRegistry,
    scheduler: GenerationScheduler,
    collector: GenerationCollector,
    context: EvalContext,
    generation: GenerationParams,
    ignore: IgnoreIndex,
    state: PassState,
    published: MetricMap,
}

impl Seq2SeqMetricsPipeline {
    /// Validate `config` and resolve every metric.
    ///
    /// Unknown metric names and malformed entries fail here.
    pub fn new(
        config: &MetricsConfig,
        context: EvalContext,
        custom: CustomMetrics,
    ) -> Result<Self> {
        let registry = MetricRegistry::from_config(config, custom)?;
        let ignore = IgnoreIndex::new(config.ignore_token_id)?;
        let generation = if config.text_gen_kwargs.is_empty() {
            context.default_generation.clone()
        } else {
            config.text_gen_kwargs.clone()
        };

        Ok(Self {
            registry,
            scheduler: GenerationScheduler::new(config.calc_every),
            collector: GenerationCollector::new(),
            context,
            generation,
            ignore,
            state: PassState::Idle,
            published: MetricMap::new(),
        })
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &GenerationScheduler {
        &self.scheduler
    }

    /// Parameters forwarded to every generate call
    pub fn generation_params(&self) -> &GenerationParams {
        &self.generation
    }

    /// Every metric name this pipeline can publish
    pub fn metric_keys(&self) -> Vec<String> {
        self.registry.metric_keys()
    }

    /// Metrics of the last finished validation pass
    pub fn metrics(&self) -> &MetricMap {
        &self.published
    }

    /// Examples collected so far in the current pass
    pub fn collected(&self) -> usize {
        self.collector.len()
    }

    fn out_of_order(&self, hook: &'static str) -> EvaluarError {
        EvaluarError::HookOrder {
            hook,
            state: self.state.to_string(),
        }
    }

    /// Start of fit; returns the metric names the loop should reserve.
    pub fn on_fit_start(&mut self) -> Result<Vec<String>> {
        if matches!(self.state, PassState::Validating { .. }) {
            return Err(self.out_of_order("on_fit_start"));
        }
        self.collector.reset();
        self.published.clear();
        self.state = PassState::Fitting;
        Ok(self.metric_keys())
    }

    /// Start of epoch `epoch` (1-based) of `total_epochs`.
    pub fn on_epoch_start(&mut self, epoch: usize, total_epochs: usize) -> Result<()> {
        if !matches!(self.state, PassState::Fitting | PassState::Epoch { .. }) {
            return Err(self.out_of_order("on_epoch_start"));
        }
        if epoch == 0 || epoch > total_epochs {
            return Err(EvaluarError::config(
                "epoch",
                format!("epoch {epoch} is outside 1..={total_epochs}"),
                "pass the 1-based epoch number and the total epoch count",
            ));
        }
        let schedule = self.scheduler.start_epoch(epoch, total_epochs);
        debug!(
            epoch,
            total_epochs,
            compute = schedule.compute,
            "generation metrics schedule"
        );
        self.state = PassState::Epoch {
            compute: schedule.compute,
        };
        Ok(())
    }

    /// Start of a validation pass.
    ///
    /// Clears the buffer and the previously published metrics, so a pass
    /// that does not compute (or fails) never exposes stale values.
    pub fn on_validate_start(&mut self) -> Result<()> {
        let compute = match self.state {
            PassState::Fitting => self.scheduler.compute(),
            PassState::Epoch { compute } => compute,
            _ => return Err(self.out_of_order("on_validate_start")),
        };
        self.collector.reset();
        self.published.clear();
        self.state = PassState::Validating {
            compute,
            failed: false,
            batches: 0,
        };
        Ok(())
    }

    /// End of a batch.
    ///
    /// Training batches are ignored. On a computing validation pass the
    /// model generates for the batch and the targets become references.
    /// A failure marks the pass failed; its remaining batches are skipped.
    pub fn on_batch_end(
        &mut self,
        is_training: bool,
        inputs: &BatchInput,
        targets: Option<&Array2<i64>>,
        model: &dyn Generator,
    ) -> Result<()> {
        let (compute, failed, batch) = match self.state {
            PassState::Epoch { .. } if is_training => return Ok(()),
            PassState::Validating {
                compute,
                failed,
                batches,
            } if !is_training => (compute, failed, batches),
            _ => return Err(self.out_of_order("on_batch_end")),
        };
        if !compute || failed {
            return Ok(());
        }

        let result = self.collect_batch(batch, inputs, targets, model);
        self.state = PassState::Validating {
            compute,
            failed: result.is_err(),
            batches: batch + 1,
        };
        result
    }

    fn collect_batch(
        &mut self,
        batch: usize,
        inputs: &BatchInput,
        targets: Option<&Array2<i64>>,
        model: &dyn Generator,
    ) -> Result<()> {
        let BatchInput::Generation {
            input_ids,
            attention_mask,
        } = inputs
        else {
            return Err(EvaluarError::NotGenerationInput);
        };
        let targets = targets.ok_or_else(|| {
            EvaluarError::config(
                "targets",
                format!("validation batch {batch} has no targets"),
                "supply target ids for every validation batch",
            )
        })?;

        let generated = model
            .generate(input_ids, attention_mask, &self.generation)
            .map_err(|source| EvaluarError::Generation { batch, source })?;
        self.collector
            .push_batch(generated, targets.view(), self.ignore)?;

        debug!(
            batch,
            examples = inputs.batch_size(),
            collected = self.collector.len(),
            "collected generations"
        );
        Ok(())
    }

    /// End of a validation pass; returns the published metrics.
    ///
    /// The map is empty when the pass did not compute or failed. A metric
    /// failure leaves it empty as well and is returned as an error.
    pub fn on_validate_end(&mut self) -> Result<&MetricMap> {
        let PassState::Validating { compute, failed, .. } = self.state else {
            return Err(self.out_of_order("on_validate_end"));
        };
        self.state = match self.scheduler.state() {
            Some(schedule) => PassState::Epoch {
                compute: schedule.compute,
            },
            None => PassState::Fitting,
        };
        if !compute || failed {
            self.collector.reset();
            return Ok(&self.published);
        }

        let started = Instant::now();
        let rendered = self.collector.render(self.context.tokenizer());
        self.collector.reset();
        let rendered = rendered?;

        let mut computed = MetricMap::new();
        for spec in self.registry.specs() {
            self.registry
                .compute_into(spec, &rendered.inputs_for(spec.input_kind()), &mut computed)?;
        }
        info!(
            examples = rendered.len(),
            metrics = computed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "computed generation metrics"
        );
        self.published = computed;
        Ok(&self.published)
    }
}

impl TrainerCallback for Seq2SeqMetricsPipeline {
    fn on_fit_start(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Seq2SeqMetricsPipeline::on_fit_start(self).map(|_| ())
    }

    fn on_epoch_start(&mut self, ctx: &CallbackContext) -> Result<()> {
        Seq2SeqMetricsPipeline::on_epoch_start(self, ctx.epoch_number(), ctx.max_epochs)
    }

    fn on_batch_end(&mut self, ctx: &CallbackContext, batch: BatchEnd<'_>) -> Result<()> {
        Seq2SeqMetricsPipeline::on_batch_end(
            self,
            ctx.is_training,
            batch.inputs,
            batch.targets,
            batch.model,
        )
    }

    fn on_validate_start(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Seq2SeqMetricsPipeline::on_validate_start(self)
    }

    fn on_validate_end(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Seq2SeqMetricsPipeline::on_validate_end(self).map(|_| ())
    }

    fn metrics(&self) -> Option<&MetricMap> {
        Some(&self.published)
    }

    fn name(&self) -> &'static str {
        "Seq2SeqMetricsPipeline"
    }
}
