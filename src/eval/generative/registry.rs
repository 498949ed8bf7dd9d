//! Metric registry: configured metrics resolved into immutable specs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{info, warn};

use super::builtin::{self, BUILTIN_METRICS};
use super::metric::{
    InputKind, MetricCompute, MetricInputs, MetricMap, MetricSpec, MissingKeyPolicy,
};
use crate::config::MetricsConfig;
use crate::error::{EvaluarError, Result};

/// Custom compute functions keyed by metric name
pub type CustomMetrics = HashMap<String, Arc<dyn MetricCompute>>;

/// Validated table of configured metrics
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    specs: Vec<MetricSpec>,
    missing_keys: MissingKeyPolicy,
}

impl MetricRegistry {
    /// Resolve every configured metric.
    ///
    /// A custom compute function takes precedence over a built-in of the
    /// same name. Names that resolve to neither fail here, before any
    /// training starts.
    pub fn from_config(config: &MetricsConfig, mut custom: CustomMetrics) -> Result<Self> {
        config.validate()?;

        let mut specs = Vec::with_capacity(config.metrics.len());
        for (name, entry) in &config.metrics {
            let compute = match custom.remove(name) {
                Some(f) => f,
                None => {
                    let builtin =
                        builtin::lookup(name).ok_or_else(|| EvaluarError::UnknownMetric {
                            name: name.clone(),
                            known: BUILTIN_METRICS.join(", "),
                        })?;
                    if let Some(kind) = entry.input {
                        if !builtin.input_kind.accepts(kind) {
                            return Err(EvaluarError::config(
                                format!("metrics.{name}.input"),
                                format!(
                                    "built-in '{name}' consumes {} input, not {}",
                                    builtin.input_kind.as_str(),
                                    kind.as_str()
                                ),
                                format!(
                                    "remove the override or set input: {}",
                                    builtin.input_kind.as_str()
                                ),
                            ));
                        }
                    }
                    builtin.compute
                }
            };
            specs.push(MetricSpec {
                name: name.clone(),
                compute,
                compute_kwargs: entry.compute_kwargs.clone(),
                returns: entry.returns.clone(),
                input_kind: entry.resolved_input(name),
                published: entry.published_names(name),
            });
        }

        for unused in custom.keys() {
            warn!(metric = %unused, "compute function supplied for a metric that is not configured");
        }

        let registry = Self {
            specs,
            missing_keys: config.missing_keys,
        };
        info!(metrics = ?registry.metric_keys(), "registered generation metrics");
        Ok(registry)
    }

    /// Specs in computation order
    pub fn specs(&self) -> &[MetricSpec] {
        &self.specs
    }

    pub fn missing_keys(&self) -> MissingKeyPolicy {
        self.missing_keys
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Every name this registry can publish, in computation order
    pub fn metric_keys(&self) -> Vec<String> {
        self.specs
            .iter()
            .flat_map(|s| s.published.iter().map(|(_, name)| name.clone()))
            .collect()
    }

    /// Compute one spec and flatten its declared keys into `out`.
    ///
    /// Under the lenient policy a declared key absent from the result (or
    /// one without a central value) is left unset and logged.
    pub fn compute_into(
        &self,
        spec: &MetricSpec,
        inputs: &MetricInputs<'_>,
        out: &mut MetricMap,
    ) -> Result<()> {
        let result = spec.compute(inputs)?;
        for (key, published) in &spec.published {
            match result.get(key).and_then(|v| v.central()) {
                Some(value) => {
                    out.insert(published.clone(), value);
                }
                None => match self.missing_keys {
                    MissingKeyPolicy::Lenient => {
                        warn!(metric = %spec.name, key = %key, "declared metric key missing from result");
                    }
                    MissingKeyPolicy::Strict => {
                        return Err(EvaluarError::MissingMetricKey {
                            metric: spec.name.clone(),
                            key: key.clone(),
                        });
                    }
                },
            }
        }
        Ok(())
    }

    /// Input kind of every spec, keyed by metric name
    pub fn input_kinds(&self) -> BTreeMap<&str, InputKind> {
        self.specs
            .iter()
            .map(|s| (s.name.as_str(), s.input_kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricEntry;
    use crate::error::ErrorKind;
    use crate::eval::generative::metric::{compute_fn, MetricResult, MetricValue};

    fn text_inputs<'a>(preds: &'a [String], refs: &'a [Vec<String>]) -> MetricInputs<'a> {
        MetricInputs::Text {
            predictions: preds,
            references: refs,
        }
    }

    #[test]
    fn test_unknown_metric_fails_fast() {
        let config = MetricsConfig::default().with_metric("meteor", MetricEntry::single("meteor"));
        let err = MetricRegistry::from_config(&config, CustomMetrics::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("meteor"));
        assert!(err.to_string().contains("sacrebleu"));
    }

    #[test]
    fn test_builtin_rejects_incompatible_input_override() {
        for (name, entry) in [
            ("bleu", MetricEntry::single("bleu").with_input(InputKind::Text)),
            ("sacrebleu", MetricEntry::single("score").with_input(InputKind::Tokens)),
            ("rouge", MetricEntry::many(["rouge1"]).with_input(InputKind::Tokens)),
            ("wer", MetricEntry::single("wer").with_input(InputKind::Tokens)),
        ] {
            let config = MetricsConfig::default().with_metric(name, entry);
            let err = MetricRegistry::from_config(&config, CustomMetrics::new()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{name}");
            match err {
                EvaluarError::ConfigValue { field, .. } => {
                    assert_eq!(field, format!("metrics.{name}.input"));
                }
                other => panic!("{name}: unexpected error {other}"),
            }
        }
    }

    #[test]
    fn test_builtin_accepts_compatible_input_override() {
        let config = MetricsConfig::default()
            .with_metric(
                "rouge",
                MetricEntry::many(["rouge1"]).with_input(InputKind::MultiReferenceText),
            )
            .with_metric(
                "sacrebleu",
                MetricEntry::single("score").with_input(InputKind::Text),
            );
        let registry = MetricRegistry::from_config(&config, CustomMetrics::new()).unwrap();
        assert_eq!(registry.input_kinds()["rouge"], InputKind::MultiReferenceText);
        assert_eq!(registry.input_kinds()["sacrebleu"], InputKind::Text);
    }

    #[test]
    fn test_custom_compute_may_override_builtin_input() {
        let config = MetricsConfig::default()
            .with_metric("bleu", MetricEntry::single("bleu").with_input(InputKind::Text));
        let custom = CustomMetrics::from([(
            "bleu".to_string(),
            compute_fn(|_, _| Ok(MetricResult::new())),
        )]);
        let registry = MetricRegistry::from_config(&config, custom).unwrap();
        assert_eq!(registry.input_kinds()["bleu"], InputKind::Text);
    }

    #[test]
    fn test_builtin_defaults_applied() {
        let config = MetricsConfig::default()
            .with_metric("bleu", MetricEntry::single("bleu"))
            .with_metric("rouge", MetricEntry::many(["rouge1", "rougeL"]))
            .with_metric("sacrebleu", MetricEntry::single("score"));
        let registry = MetricRegistry::from_config(&config, CustomMetrics::new()).unwrap();
        let kinds = registry.input_kinds();
        assert_eq!(kinds["bleu"], InputKind::Tokens);
        assert_eq!(kinds["rouge"], InputKind::Text);
        assert_eq!(kinds["sacrebleu"], InputKind::MultiReferenceText);
        assert_eq!(
            registry.metric_keys(),
            vec!["bleu", "rouge1", "rougeL", "sacrebleu"]
        );
    }

    #[test]
    fn test_custom_compute_overrides_name() {
        let config = MetricsConfig::default()
            .with_metric("bertscore", MetricEntry::many(["precision", "f1"]));
        let custom = CustomMetrics::from([(
            "bertscore".to_string(),
            compute_fn(|_, _| {
                Ok(MetricResult::from([
                    ("precision".to_string(), MetricValue::Series(vec![0.5, 1.0])),
                    ("f1".to_string(), MetricValue::Scalar(0.6)),
                ]))
            }),
        )]);
        let registry = MetricRegistry::from_config(&config, custom).unwrap();
        assert_eq!(registry.metric_keys(), vec!["bertscore_precision", "bertscore_f1"]);

        let preds = vec!["x".to_string()];
        let refs = vec![vec!["x".to_string()]];
        let mut out = MetricMap::new();
        registry
            .compute_into(&registry.specs()[0], &text_inputs(&preds, &refs), &mut out)
            .unwrap();
        approx::assert_relative_eq!(out["bertscore_precision"], 0.75);
        approx::assert_relative_eq!(out["bertscore_f1"], 0.6);
    }

    #[test]
    fn test_missing_key_policies() {
        let entry = MetricEntry::many(["precision", "f1"]);
        let compute = || {
            compute_fn(|_, _| {
                Ok(MetricResult::from([(
                    "precision".to_string(),
                    MetricValue::Scalar(0.9),
                )]))
            })
        };
        let preds = vec!["x".to_string()];
        let refs = vec![vec!["x".to_string()]];

        let lenient = MetricsConfig::default().with_metric("custom", entry.clone());
        let registry = MetricRegistry::from_config(
            &lenient,
            CustomMetrics::from([("custom".to_string(), compute())]),
        )
        .unwrap();
        let mut out = MetricMap::new();
        registry
            .compute_into(&registry.specs()[0], &text_inputs(&preds, &refs), &mut out)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out.contains_key("custom_f1"));

        let strict = lenient.with_missing_keys(MissingKeyPolicy::Strict);
        let registry = MetricRegistry::from_config(
            &strict,
            CustomMetrics::from([("custom".to_string(), compute())]),
        )
        .unwrap();
        let err = registry
            .compute_into(&registry.specs()[0], &text_inputs(&preds, &refs), &mut MetricMap::new())
            .unwrap_err();
        assert!(matches!(err, EvaluarError::MissingMetricKey { ref key, .. } if key == "f1"));
    }

    #[test]
    fn test_invalid_config_rejected_before_resolution() {
        let config = MetricsConfig {
            ignore_token_id: 3,
            ..Default::default()
        };
        assert!(MetricRegistry::from_config(&config, CustomMetrics::new()).is_err());
    }
}
