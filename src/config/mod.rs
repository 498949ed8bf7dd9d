//! Declarative metrics configuration
//!
//! A YAML (or JSON) file declares the cadence, generation parameters, and
//! the metrics to compute:
//!
//! ```yaml
//! calc_every: epoch
//! text_gen_kwargs:
//!   max_length: 128
//! metrics:
//!   sacrebleu:
//!     returns: score
//! ```

mod loader;
mod schema;
mod validate;

pub use loader::{load_config, parse_yaml};
pub use schema::{MetricEntry, MetricsConfig};
pub use validate::validate_config;
