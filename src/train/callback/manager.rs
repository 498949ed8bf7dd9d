//! Callback manager for dispatching events to multiple callbacks

use super::traits::{BatchEnd, CallbackContext, TrainerCallback};
use crate::error::Result;
use crate::eval::generative::MetricMap;

/// Manages multiple callbacks and dispatches events
///
/// Dispatch stops at the first callback that returns an error.
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Add a callback
    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Fire fit start event
    pub fn on_fit_start(&mut self, ctx: &CallbackContext) -> Result<()> {
        self.callbacks.iter_mut().try_for_each(|cb| cb.on_fit_start(ctx))
    }

    /// Fire epoch start event
    pub fn on_epoch_start(&mut self, ctx: &CallbackContext) -> Result<()> {
        self.callbacks
            .iter_mut()
            .try_for_each(|cb| cb.on_epoch_start(ctx))
    }

    /// Fire batch end event
    pub fn on_batch_end(&mut self, ctx: &CallbackContext, batch: BatchEnd<'_>) -> Result<()> {
        self.callbacks
            .iter_mut()
            .try_for_each(|cb| cb.on_batch_end(ctx, batch))
    }

    /// Fire validate start event
    pub fn on_validate_start(&mut self, ctx: &CallbackContext) -> Result<()> {
        self.callbacks
            .iter_mut()
            .try_for_each(|cb| cb.on_validate_start(ctx))
    }

    /// Fire validate end event and merge the published metrics
    pub fn on_validate_end(&mut self, ctx: &CallbackContext) -> Result<MetricMap> {
        let mut merged = MetricMap::new();
        for cb in &mut self.callbacks {
            cb.on_validate_end(ctx)?;
            if let Some(metrics) = cb.metrics() {
                merged.extend(metrics.iter().map(|(k, v)| (k.clone(), *v)));
            }
        }
        Ok(merged)
    }
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluarError;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct StaticMetrics(MetricMap);

    impl TrainerCallback for StaticMetrics {
        fn metrics(&self) -> Option<&MetricMap> {
            Some(&self.0)
        }
        fn name(&self) -> &'static str {
            "StaticMetrics"
        }
    }

    #[test]
    fn test_callback_manager_len_and_empty() {
        let mut manager = CallbackManager::new();
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);

        manager.add(StaticMetrics(MetricMap::new()));
        assert!(!manager.is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_callback_manager_default() {
        let manager = CallbackManager::default();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_validate_end_merges_metrics() {
        let mut manager = CallbackManager::new();
        manager.add(StaticMetrics(MetricMap::from([("bleu".to_string(), 0.3)])));
        manager.add(StaticMetrics(MetricMap::from([("wer".to_string(), 0.1)])));

        let merged = manager.on_validate_end(&CallbackContext::default()).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["bleu"], 0.3);
    }

    #[test]
    fn test_error_stops_dispatch() {
        struct FailingCallback;
        impl TrainerCallback for FailingCallback {
            fn on_epoch_start(&mut self, _: &CallbackContext) -> Result<()> {
                Err(EvaluarError::HookOrder {
                    hook: "on_epoch_start",
                    state: "testing".into(),
                })
            }
        }

        struct CountingCallback {
            count: Arc<AtomicUsize>,
        }
        impl TrainerCallback for CountingCallback {
            fn on_epoch_start(&mut self, _: &CallbackContext) -> Result<()> {
                self.count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let count = Arc::new(AtomicUsize::new(0));
        let mut manager = CallbackManager::new();
        manager.add(CountingCallback {
            count: count.clone(),
        });
        manager.add(FailingCallback);
        manager.add(CountingCallback {
            count: count.clone(),
        });

        assert!(manager.on_epoch_start(&CallbackContext::default()).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    proptest! {
        /// Multiple callbacks should all fire
        #[test]
        fn multiple_callbacks_fire(
            num_callbacks in 1usize..5,
        ) {
            struct CounterCallback {
                counter: Arc<AtomicUsize>,
            }

            impl TrainerCallback for CounterCallback {
                fn on_fit_start(&mut self, _: &CallbackContext) -> Result<()> {
                    self.counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                fn name(&self) -> &'static str { "CounterCallback" }
            }

            let counter = Arc::new(AtomicUsize::new(0));
            let mut manager = CallbackManager::new();

            for _ in 0..num_callbacks {
                manager.add(CounterCallback { counter: counter.clone() });
            }

            manager.on_fit_start(&CallbackContext::default()).unwrap();

            prop_assert_eq!(counter.load(Ordering::SeqCst), num_callbacks);
        }
    }
}
