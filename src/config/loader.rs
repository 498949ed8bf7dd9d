//! Loading metrics configuration from disk

use std::fs;
use std::path::Path;

use crate::config::schema::MetricsConfig;
use crate::config::validate::validate_config;
use crate::error::{EvaluarError, Result};

/// Load and validate a metrics config.
///
/// `.json` files are parsed as JSON; anything else as YAML.
///
/// # Example
///
/// ```no_run
/// use evaluar::config::load_config;
///
/// let config = load_config("metrics.yaml")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MetricsConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EvaluarError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)
        .map_err(|e| EvaluarError::io(format!("reading {}", path.display()), e))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let config = if is_json {
        serde_json::from_str(&content).map_err(|e| EvaluarError::ConfigParsing {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        parse_yaml(&content).map_err(|e| match e {
            EvaluarError::ConfigParsing { message, .. } => EvaluarError::ConfigParsing {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?
    };

    validate_config(&config)?;
    Ok(config)
}

/// Parse and validate a YAML metrics config from a string
pub fn parse_yaml(content: &str) -> Result<MetricsConfig> {
    let config: MetricsConfig =
        serde_yaml::from_str(content).map_err(|e| EvaluarError::ConfigParsing {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::generative::CalcEvery;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_yaml_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "calc_every: last_epoch\nmetrics:\n  bleu:\n    returns: bleu"
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.calc_every, CalcEvery::LastEpoch);
        assert!(config.metrics.contains_key("bleu"));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"calc_every": "epoch", "metrics": {{"wer": {{"returns": "wer"}}}}}}"#
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert!(config.metrics.contains_key("wer"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/metrics.yaml").unwrap_err();
        assert!(matches!(err, EvaluarError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_parse_error_names_path() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "calc_every: [not, valid").unwrap();
        let err = load_config(file.path()).unwrap_err();
        match err {
            EvaluarError::ConfigParsing { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected ConfigParsing, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        assert!(parse_yaml("ignore_token_id: 5").is_err());
    }
}
