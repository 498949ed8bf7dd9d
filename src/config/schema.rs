//! YAML schema for the generation metrics pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use std::path::Path;

use crate::align::IGNORE_INDEX;
use crate::error::Result;
use crate::eval::generative::builtin;
use crate::eval::generative::{
    CalcEvery, ComputeKwargs, GenerationParams, InputKind, MissingKeyPolicy, ReturnKeys,
};

/// Complete metrics pipeline configuration
///
/// ```yaml
/// calc_every: other_epoch
/// text_gen_kwargs: { max_length: 64, num_beams: 4 }
/// metrics:
///   bleu: { returns: bleu }
///   rouge: { returns: [rouge1, rouge2, rougeL] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// How often generation metrics are computed
    #[serde(default)]
    pub calc_every: CalcEvery,

    /// Target id excluded from loss and references
    #[serde(default = "default_ignore_token_id")]
    pub ignore_token_id: i64,

    /// Behavior when a declared return key is absent
    #[serde(default)]
    pub missing_keys: MissingKeyPolicy,

    /// Keyword arguments forwarded to the model's generate call
    #[serde(default)]
    pub text_gen_kwargs: GenerationParams,

    /// Metric name → entry, computed in name order
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricEntry>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            calc_every: CalcEvery::default(),
            ignore_token_id: IGNORE_INDEX,
            missing_keys: MissingKeyPolicy::default(),
            text_gen_kwargs: GenerationParams::default(),
            metrics: BTreeMap::new(),
        }
    }
}

fn default_ignore_token_id() -> i64 {
    IGNORE_INDEX
}

impl MetricsConfig {
    /// Add a metric entry
    pub fn with_metric(mut self, name: impl Into<String>, entry: MetricEntry) -> Self {
        self.metrics.insert(name.into(), entry);
        self
    }

    /// Set the cadence
    pub fn with_calc_every(mut self, calc_every: CalcEvery) -> Self {
        self.calc_every = calc_every;
        self
    }

    /// Set the missing-key policy
    pub fn with_missing_keys(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_keys = policy;
        self
    }

    /// Set the generation parameters
    pub fn with_text_gen_kwargs(mut self, params: GenerationParams) -> Self {
        self.text_gen_kwargs = params;
        self
    }

    /// Load and validate from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        super::load_config(path)
    }

    /// Run structural validation
    pub fn validate(&self) -> Result<()> {
        super::validate_config(self)
    }
}

/// One configured metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    /// Extra keyword arguments for the compute function
    #[serde(default)]
    pub compute_kwargs: ComputeKwargs,

    /// Declared result field(s)
    pub returns: ReturnKeys,

    /// Input representation; defaults to the built-in's, else text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputKind>,

    /// Publish multi-key results as `<metric>_<key>`; defaults to the built-in's, else true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_keys: Option<bool>,
}

impl MetricEntry {
    /// Entry returning a single field
    pub fn single(key: impl Into<String>) -> Self {
        Self {
            compute_kwargs: ComputeKwargs::new(),
            returns: ReturnKeys::One(key.into()),
            input: None,
            prefix_keys: None,
        }
    }

    /// Entry returning several fields
    pub fn many<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            returns: ReturnKeys::Many(keys.into_iter().map(Into::into).collect()),
            ..Self::single("")
        }
    }

    /// Override the input kind
    pub fn with_input(mut self, kind: InputKind) -> Self {
        self.input = Some(kind);
        self
    }

    /// Add a compute keyword argument
    pub fn with_kwarg(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.compute_kwargs.insert(key.into(), value.into());
        self
    }

    /// Override key prefixing
    pub fn with_prefix_keys(mut self, prefix: bool) -> Self {
        self.prefix_keys = Some(prefix);
        self
    }

    /// Input kind after applying the built-in default for `name`
    pub fn resolved_input(&self, name: &str) -> InputKind {
        self.input
            .or_else(|| builtin::lookup(name).map(|b| b.input_kind))
            .unwrap_or(InputKind::Text)
    }

    /// Prefixing after applying the built-in default for `name`
    pub fn resolved_prefix_keys(&self, name: &str) -> bool {
        self.prefix_keys
            .or_else(|| builtin::lookup(name).map(|b| b.prefix_keys))
            .unwrap_or(true)
    }

    /// `(declared key, published name)` pairs for this entry
    pub fn published_names(&self, name: &str) -> Vec<(String, String)> {
        self.returns
            .published_names(name, self.resolved_prefix_keys(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
calc_every: other_epoch
ignore_token_id: -1
missing_keys: strict
text_gen_kwargs:
  max_length: 64
  num_beams: 4
metrics:
  bleu:
    returns: bleu
  rouge:
    returns: [rouge1, rouge2, rougeL]
  bertscore:
    returns: [precision, recall, f1]
    input: text
    compute_kwargs:
      lang: en
"#;
        let config: MetricsConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.calc_every, CalcEvery::OtherEpoch);
        assert_eq!(config.ignore_token_id, -1);
        assert_eq!(config.missing_keys, MissingKeyPolicy::Strict);
        assert_eq!(config.text_gen_kwargs.num_beams(), Some(4));
        assert_eq!(config.metrics.len(), 3);
        assert_eq!(
            config.metrics["bertscore"].compute_kwargs["lang"],
            serde_json::json!("en")
        );
        assert_eq!(config.metrics["bertscore"].input, Some(InputKind::Text));
    }

    #[test]
    fn test_defaults() {
        let config: MetricsConfig = serde_yaml::from_str("metrics: {}").unwrap();
        assert_eq!(config, MetricsConfig::default());
        assert_eq!(config.ignore_token_id, -100);
    }

    #[test]
    fn test_entry_requires_returns() {
        let result: std::result::Result<MetricEntry, serde_yaml::Error> =
            serde_yaml::from_str("compute_kwargs: {}");
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_defaults() {
        let rouge = MetricEntry::many(["rouge1", "rougeL"]);
        assert_eq!(rouge.resolved_input("rouge"), InputKind::Text);
        assert_eq!(rouge.published_names("rouge")[0].1, "rouge1");

        let bleu = MetricEntry::single("bleu");
        assert_eq!(bleu.resolved_input("bleu"), InputKind::Tokens);

        let custom = MetricEntry::many(["precision", "f1"]);
        assert_eq!(custom.resolved_input("bertscore"), InputKind::Text);
        assert_eq!(custom.published_names("bertscore")[1].1, "bertscore_f1");
        assert_eq!(
            custom.with_prefix_keys(false).published_names("bertscore")[1].1,
            "f1"
        );
    }

    #[test]
    fn test_builders() {
        let config = MetricsConfig::default()
            .with_calc_every(CalcEvery::LastEpoch)
            .with_metric("sacrebleu", MetricEntry::single("score").with_kwarg("lowercase", true))
            .with_metric("rouge", MetricEntry::many(["rouge1"]).with_prefix_keys(true));
        assert_eq!(config.metrics.len(), 2);
        assert_eq!(config.metrics["rouge"].prefix_keys, Some(true));
        assert_eq!(
            config.metrics["sacrebleu"].returns,
            ReturnKeys::One("score".into())
        );
    }
}
