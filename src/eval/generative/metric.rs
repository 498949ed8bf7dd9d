//! Metric specs: what each configured metric consumes and returns.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Extra keyword arguments passed to a metric's compute function
pub type ComputeKwargs = BTreeMap<String, Value>;

/// Raw result of a compute call, keyed by field name
pub type MetricResult = BTreeMap<String, MetricValue>;

/// Published flat name → scalar map
pub type MetricMap = BTreeMap<String, f64>;

/// Input representation a metric expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Token lists; references wrapped one level
    Tokens,
    /// Detokenized text; single reference per example, wrapped one level
    Text,
    /// Detokenized text; each example carries a list of references
    MultiReferenceText,
}

impl InputKind {
    /// Config spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Text => "text",
            Self::MultiReferenceText => "multi_reference_text",
        }
    }

    /// Whether a metric built for `self` can consume `other`.
    ///
    /// The two text kinds share one shape; tokens and text do not mix.
    pub fn accepts(self, other: InputKind) -> bool {
        (self == Self::Tokens) == (other == Self::Tokens)
    }
}

/// Precision / recall / F-measure triple
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// Low / mid / high summary of per-example scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateScore {
    pub low: Score,
    pub mid: Score,
    pub high: Score,
}

/// One field of a metric result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    /// A single number
    Scalar(f64),
    /// Per-example (or per-order) values, summarized by their mean
    Series(Vec<f64>),
    /// Aggregated precision/recall/F, summarized by `mid.fmeasure`
    Aggregate(AggregateScore),
}

impl MetricValue {
    /// The scalar published for this value
    pub fn central(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Series(values) if values.is_empty() => None,
            Self::Series(values) => Some(values.iter().sum::<f64>() / values.len() as f64),
            Self::Aggregate(agg) => Some(agg.mid.fmeasure),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

/// Predictions and references in the shape a metric asked for
#[derive(Debug, Clone, Copy)]
pub enum MetricInputs<'a> {
    Tokens {
        predictions: &'a [Vec<String>],
        references: &'a [Vec<Vec<String>>],
    },
    Text {
        predictions: &'a [String],
        references: &'a [Vec<String>],
    },
}

impl MetricInputs<'_> {
    /// Number of examples
    pub fn len(&self) -> usize {
        match self {
            Self::Tokens { predictions, .. } => predictions.len(),
            Self::Text { predictions, .. } => predictions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A metric's compute function
pub trait MetricCompute: Send + Sync {
    fn compute(&self, inputs: &MetricInputs<'_>, kwargs: &ComputeKwargs) -> Result<MetricResult>;
}

struct FnMetric<F>(F);

impl<F> MetricCompute for FnMetric<F>
where
    F: Fn(&MetricInputs<'_>, &ComputeKwargs) -> Result<MetricResult> + Send + Sync,
{
    fn compute(&self, inputs: &MetricInputs<'_>, kwargs: &ComputeKwargs) -> Result<MetricResult> {
        (self.0)(inputs, kwargs)
    }
}

/// Wrap a closure as a compute function
pub fn compute_fn<F>(f: F) -> Arc<dyn MetricCompute>
where
    F: Fn(&MetricInputs<'_>, &ComputeKwargs) -> Result<MetricResult> + Send + Sync + 'static,
{
    Arc::new(FnMetric(f))
}

/// Declared result field(s) of a metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReturnKeys {
    One(String),
    Many(Vec<String>),
}

impl ReturnKeys {
    /// Declared keys in order
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::One(k) => vec![k.as_str()],
            Self::Many(ks) => ks.iter().map(String::as_str).collect(),
        }
    }

    /// `(declared key, published name)` pairs.
    ///
    /// A single key publishes under the metric name; several keys publish as
    /// `<metric>_<key>`, or bare when `prefix_keys` is false.
    pub fn published_names(&self, metric: &str, prefix_keys: bool) -> Vec<(String, String)> {
        match self {
            Self::One(k) => vec![(k.clone(), metric.to_string())],
            Self::Many(ks) => ks
                .iter()
                .map(|k| {
                    let name = if prefix_keys {
                        format!("{metric}_{k}")
                    } else {
                        k.clone()
                    };
                    (k.clone(), name)
                })
                .collect(),
        }
    }
}

/// What to do when a declared key is absent from a compute result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeyPolicy {
    /// Leave the entry unset for the pass and log a warning
    #[default]
    Lenient,
    /// Fail the pass
    Strict,
}

/// A validated, immutable metric configuration
#[derive(Clone)]
pub struct MetricSpec {
    pub(crate) name: String,
    pub(crate) compute: Arc<dyn MetricCompute>,
    pub(crate) compute_kwargs: ComputeKwargs,
    pub(crate) returns: ReturnKeys,
    pub(crate) input_kind: InputKind,
    pub(crate) published: Vec<(String, String)>,
}

impl MetricSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    pub fn returns(&self) -> &ReturnKeys {
        &self.returns
    }

    pub fn compute_kwargs(&self) -> &ComputeKwargs {
        &self.compute_kwargs
    }

    /// `(declared key, published name)` pairs
    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }

    /// Run the compute function
    pub fn compute(&self, inputs: &MetricInputs<'_>) -> Result<MetricResult> {
        self.compute.compute(inputs, &self.compute_kwargs)
    }
}

impl fmt::Debug for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSpec")
            .field("name", &self.name)
            .field("compute_kwargs", &self.compute_kwargs)
            .field("returns", &self.returns)
            .field("input_kind", &self.input_kind)
            .finish_non_exhaustive()
    }
}
