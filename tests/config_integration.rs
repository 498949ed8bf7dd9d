//! Integration tests for metrics configuration files and the CLI
//!
//! Loads YAML and JSON files from disk, builds a pipeline from them, and
//! runs the `validate` / `schedule` commands against the same files.

use std::io::Write;
use std::sync::Arc;

use evaluar::cli::{parse_args, run_command};
use evaluar::config::load_config;
use evaluar::eval::generative::{CalcEvery, CustomMetrics, InputKind, MissingKeyPolicy};
use evaluar::tokenizer::{TokenizerConfig, WordPieceTokenizer};
use evaluar::{ErrorKind, EvalContext, MetricsConfig, Seq2SeqMetricsPipeline};
use tempfile::NamedTempFile;

const YAML: &str = r#"
calc_every: last_epoch
missing_keys: strict
text_gen_kwargs:
  max_length: 48
metrics:
  bleu:
    returns: bleu
    compute_kwargs:
      max_order: 2
  rouge:
    returns: [rouge1, rougeL]
  wer:
    returns: wer
"#;

fn write_temp(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

fn context() -> EvalContext {
    let tokenizer =
        WordPieceTokenizer::from_vocab(TokenizerConfig::wordpiece(), ["hello", "world"]).unwrap();
    EvalContext::new(Arc::new(tokenizer))
}

#[test]
fn test_yaml_file_builds_pipeline() {
    let file = write_temp(".yaml", YAML);
    let config = MetricsConfig::from_file(file.path()).unwrap();

    assert_eq!(config.calc_every, CalcEvery::LastEpoch);
    assert_eq!(config.missing_keys, MissingKeyPolicy::Strict);
    assert_eq!(config.text_gen_kwargs.max_length(), Some(48));

    let pipeline = Seq2SeqMetricsPipeline::new(&config, context(), CustomMetrics::new()).unwrap();
    assert_eq!(pipeline.metric_keys(), vec!["bleu", "rouge1", "rougeL", "wer"]);

    let kinds = pipeline.registry().input_kinds();
    assert_eq!(kinds["bleu"], InputKind::Tokens);
    assert_eq!(kinds["rouge"], InputKind::Text);
}

#[test]
fn test_json_file_matches_yaml() {
    let json = r#"{
        "calc_every": "last_epoch",
        "missing_keys": "strict",
        "text_gen_kwargs": { "max_length": 48 },
        "metrics": {
            "bleu": { "returns": "bleu", "compute_kwargs": { "max_order": 2 } },
            "rouge": { "returns": ["rouge1", "rougeL"] },
            "wer": { "returns": "wer" }
        }
    }"#;
    let from_json = load_config(write_temp(".json", json).path()).unwrap();
    let from_yaml = load_config(write_temp(".yml", YAML).path()).unwrap();
    assert_eq!(from_json, from_yaml);
}

#[test]
fn test_invalid_files_are_rejected() {
    let positive_ignore = write_temp(".yaml", "ignore_token_id: 0\n");
    let err = load_config(positive_ignore.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let empty_returns = write_temp(".yaml", "metrics:\n  bleu:\n    returns: []\n");
    assert!(load_config(empty_returns.path()).is_err());

    let malformed = write_temp(".yaml", "metrics: [not, a, map]\n");
    assert!(load_config(malformed.path()).is_err());

    assert!(load_config("/nonexistent/metrics.yaml").is_err());
}

#[test]
fn test_cli_commands_run_against_files() {
    let file = write_temp(".yaml", YAML);
    let path = file.path().to_string_lossy().into_owned();

    let validate = parse_args(["evaluar", "-q", "validate", path.as_str(), "--detailed"]).unwrap();
    assert!(run_command(validate).is_ok());

    let schedule =
        parse_args(["evaluar", "-q", "schedule", path.as_str(), "-e", "3", "-f", "json"]).unwrap();
    assert!(run_command(schedule).is_ok());

    let missing = parse_args(["evaluar", "-q", "validate", "/nonexistent/metrics.yaml"]).unwrap();
    assert!(run_command(missing).is_err());
}
