//! Configuration validation
//!
//! Structural checks that run before any training starts. Metric name
//! resolution happens when the registry is built.

use std::collections::HashSet;

use crate::config::schema::MetricsConfig;
use crate::error::{EvaluarError, Result};

/// Validate a metrics configuration
///
/// Checks:
/// - The ignore id is negative
/// - Metric names are non-blank
/// - Every metric declares at least one return key, none blank or repeated
/// - No two metrics publish under the same name
pub fn validate_config(config: &MetricsConfig) -> Result<()> {
    if config.ignore_token_id >= 0 {
        return Err(EvaluarError::config(
            "ignore_token_id",
            format!("{} can collide with a real token id", config.ignore_token_id),
            "use a negative value such as -100",
        ));
    }

    let mut published: HashSet<String> = HashSet::new();
    for (name, entry) in &config.metrics {
        if name.trim().is_empty() {
            return Err(EvaluarError::config(
                "metrics",
                "metric name is blank",
                "name every metric entry",
            ));
        }

        let keys = entry.returns.keys();
        if keys.is_empty() {
            return Err(EvaluarError::config(
                format!("metrics.{name}.returns"),
                "no return keys declared",
                "list the result field(s) to publish",
            ));
        }

        let mut seen = HashSet::new();
        for key in keys {
            if key.trim().is_empty() {
                return Err(EvaluarError::config(
                    format!("metrics.{name}.returns"),
                    "return key is blank",
                    "remove the empty entry",
                ));
            }
            if !seen.insert(key) {
                return Err(EvaluarError::config(
                    format!("metrics.{name}.returns"),
                    format!("return key '{key}' is declared twice"),
                    "declare each key once",
                ));
            }
        }

        for (_, published_name) in entry.published_names(name) {
            if !published.insert(published_name.clone()) {
                return Err(EvaluarError::config(
                    format!("metrics.{name}"),
                    format!("published name '{published_name}' collides with another metric"),
                    "rename the metric or set prefix_keys: true",
                ));
            }
        }
    }

    Ok(())
}
