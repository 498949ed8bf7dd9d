//! Core traits and types for the callback system
//!
//! This module provides the foundational types for training-loop hooks:
//! - `CallbackContext` - State passed to callbacks
//! - `BatchEnd` - What a finished batch hands to callbacks
//! - `TrainerCallback` - The trait all callbacks implement

use ndarray::Array2;

use crate::error::Result;
use crate::eval::generative::{BatchInput, Generator, MetricMap};

/// Context passed to callbacks with current training state
#[derive(Clone, Debug, Default)]
pub struct CallbackContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Current step within the epoch or validation pass
    pub step: usize,
    /// Whether the current batch is a training batch
    pub is_training: bool,
}

impl CallbackContext {
    /// Context for epoch `epoch` (0-indexed) of `max_epochs`
    pub fn new(epoch: usize, max_epochs: usize) -> Self {
        Self {
            epoch,
            max_epochs,
            ..Default::default()
        }
    }

    /// 1-based epoch number
    pub fn epoch_number(&self) -> usize {
        self.epoch + 1
    }

    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    pub fn training(mut self, is_training: bool) -> Self {
        self.is_training = is_training;
        self
    }
}

/// A finished batch: model inputs, raw targets, and the model itself
#[derive(Clone, Copy)]
pub struct BatchEnd<'a> {
    pub inputs: &'a BatchInput,
    /// Padded target ids, one row per example
    pub targets: Option<&'a Array2<i64>>,
    pub model: &'a dyn Generator,
}

/// Trait for training callbacks
///
/// Implement this trait to hook into training events. All methods have
/// default no-op implementations, so you only need to implement the
/// events you care about. Hooks fire in training-loop order:
/// `on_fit_start`, then per epoch `on_epoch_start`, training batches,
/// `on_validate_start`, validation batches, `on_validate_end`.
pub trait TrainerCallback: Send {
    /// Called once before training starts
    fn on_fit_start(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called before each epoch
    fn on_epoch_start(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called after every batch, training or validation
    fn on_batch_end(&mut self, _ctx: &CallbackContext, _batch: BatchEnd<'_>) -> Result<()> {
        Ok(())
    }

    /// Called before a validation pass
    fn on_validate_start(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Called after a validation pass
    fn on_validate_end(&mut self, _ctx: &CallbackContext) -> Result<()> {
        Ok(())
    }

    /// Metrics published by the last validation pass
    fn metrics(&self) -> Option<&MetricMap> {
        None
    }

    /// Get callback name for logging
    fn name(&self) -> &'static str {
        "TrainerCallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_context_default() {
        let ctx = CallbackContext::default();
        assert_eq!(ctx.epoch, 0);
        assert_eq!(ctx.step, 0);
        assert!(!ctx.is_training);
    }

    #[test]
    fn test_callback_context_builders() {
        let ctx = CallbackContext::new(2, 5).with_step(7).training(true);
        assert_eq!(ctx.epoch_number(), 3);
        assert_eq!(ctx.max_epochs, 5);
        assert_eq!(ctx.step, 7);
        assert!(ctx.is_training);
    }

    #[test]
    fn test_default_trainer_callback_impl() {
        struct MinimalCallback;
        impl TrainerCallback for MinimalCallback {
            fn name(&self) -> &'static str {
                "MinimalCallback"
            }
        }

        let mut cb = MinimalCallback;
        let ctx = CallbackContext::default();
        assert!(cb.on_fit_start(&ctx).is_ok());
        assert!(cb.on_epoch_start(&ctx).is_ok());
        assert!(cb.on_validate_start(&ctx).is_ok());
        assert!(cb.on_validate_end(&ctx).is_ok());
        assert!(cb.metrics().is_none());
        assert_eq!(cb.name(), "MinimalCallback");
    }
}
