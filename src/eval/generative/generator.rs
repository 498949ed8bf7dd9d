//! Model generation capability and batch inputs.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tokenizer::TokenId;

/// Failure of the model's generate capability
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    Failed(String),

    #[error("generation timed out after {secs:.1}s")]
    TimedOut { secs: f64 },
}

/// Keyword arguments forwarded verbatim to the model's generate call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationParams(BTreeMap<String, Value>);

impl GenerationParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw parameter value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `max_length`, if set
    pub fn max_length(&self) -> Option<usize> {
        self.get("max_length")
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }

    /// `num_beams`, if set
    pub fn num_beams(&self) -> Option<usize> {
        self.get("num_beams")
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }

    /// `temperature`, if set
    pub fn temperature(&self) -> Option<f64> {
        self.get("temperature").and_then(Value::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for GenerationParams {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Model inputs of one batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchInput {
    /// Encoder inputs of a sequence-generation model
    Generation {
        input_ids: Array2<TokenId>,
        attention_mask: Array2<u8>,
    },
    /// Inputs of a classification-style model
    Classification {
        input_ids: Array2<TokenId>,
        attention_mask: Array2<u8>,
        token_type_ids: Array2<u8>,
    },
}

impl BatchInput {
    /// Number of examples in the batch
    pub fn batch_size(&self) -> usize {
        match self {
            Self::Generation { input_ids, .. } | Self::Classification { input_ids, .. } => {
                input_ids.nrows()
            }
        }
    }
}

/// Autoregressive generation over a batch
pub trait Generator {
    /// One generated id sequence per batch row, in row order.
    fn generate(
        &self,
        input_ids: &Array2<TokenId>,
        attention_mask: &Array2<u8>,
        params: &GenerationParams,
    ) -> Result<Vec<Vec<TokenId>>, GenerationError>;
}
