//! Named metrics resolvable without a custom compute function.

use std::sync::Arc;

use serde_json::Value;

use super::metric::{
    compute_fn, ComputeKwargs, InputKind, MetricCompute, MetricInputs, MetricResult, MetricValue,
    Score,
};
use super::text_gen::{
    aggregate_scores, as_strs, corpus_bleu, rouge_l, rouge_n, sacre_bleu, word_error_rate,
    RefLength,
};
use crate::error::{EvaluarError, Result};

/// Names of the built-in metrics
pub const BUILTIN_METRICS: [&str; 4] = ["bleu", "rouge", "sacrebleu", "wer"];

/// A built-in metric and its defaults
#[derive(Clone)]
pub struct Builtin {
    pub input_kind: InputKind,
    pub prefix_keys: bool,
    pub compute: Arc<dyn MetricCompute>,
}

/// Resolve a built-in metric by name
pub fn lookup(name: &str) -> Option<Builtin> {
    let (input_kind, prefix_keys, compute) = match name {
        "bleu" => (InputKind::Tokens, true, compute_fn(bleu)),
        "sacrebleu" => (InputKind::MultiReferenceText, true, compute_fn(sacrebleu)),
        "rouge" => (InputKind::Text, false, compute_fn(rouge)),
        "wer" => (InputKind::Text, true, compute_fn(wer)),
        _ => return None,
    };
    Some(Builtin {
        input_kind,
        prefix_keys,
        compute,
    })
}

fn wrong_input(metric: &str, expected: &str) -> EvaluarError {
    EvaluarError::MetricCompute {
        metric: metric.to_string(),
        message: format!("expects {expected} input"),
    }
}

fn kw_usize(kwargs: &ComputeKwargs, key: &str, default: usize) -> usize {
    kwargs
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn kw_bool(kwargs: &ComputeKwargs, key: &str, default: bool) -> bool {
    kwargs.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn bleu(inputs: &MetricInputs<'_>, kwargs: &ComputeKwargs) -> Result<MetricResult> {
    let MetricInputs::Tokens {
        predictions,
        references,
    } = inputs
    else {
        return Err(wrong_input("bleu", "token"));
    };
    let max_order = kw_usize(kwargs, "max_order", 4);
    if max_order == 0 {
        return Err(EvaluarError::MetricCompute {
            metric: "bleu".into(),
            message: "max_order must be at least 1".into(),
        });
    }

    let hyps: Vec<Vec<&str>> = predictions.iter().map(|p| as_strs(p)).collect();
    let refs: Vec<Vec<Vec<&str>>> = references
        .iter()
        .map(|rs| rs.iter().map(|r| as_strs(r)).collect())
        .collect();
    let score = corpus_bleu(
        &refs,
        &hyps,
        max_order,
        kw_bool(kwargs, "smooth", false),
        RefLength::Shortest,
    );

    Ok(MetricResult::from([
        ("bleu".to_string(), MetricValue::Scalar(score.bleu)),
        ("precisions".to_string(), MetricValue::Series(score.precisions)),
        ("brevity_penalty".to_string(), MetricValue::Scalar(score.brevity_penalty)),
        ("length_ratio".to_string(), MetricValue::Scalar(score.length_ratio)),
        (
            "translation_length".to_string(),
            MetricValue::Scalar(score.translation_length as f64),
        ),
        (
            "reference_length".to_string(),
            MetricValue::Scalar(score.reference_length as f64),
        ),
    ]))
}

fn sacrebleu(inputs: &MetricInputs<'_>, kwargs: &ComputeKwargs) -> Result<MetricResult> {
    let MetricInputs::Text {
        predictions,
        references,
    } = inputs
    else {
        return Err(wrong_input("sacrebleu", "text"));
    };
    let score = sacre_bleu(predictions, references, kw_bool(kwargs, "lowercase", false));

    Ok(MetricResult::from([
        ("score".to_string(), MetricValue::Scalar(score.bleu)),
        ("precisions".to_string(), MetricValue::Series(score.precisions)),
        ("bp".to_string(), MetricValue::Scalar(score.brevity_penalty)),
        ("sys_len".to_string(), MetricValue::Scalar(score.translation_length as f64)),
        ("ref_len".to_string(), MetricValue::Scalar(score.reference_length as f64)),
    ]))
}

fn rouge(inputs: &MetricInputs<'_>, kwargs: &ComputeKwargs) -> Result<MetricResult> {
    let MetricInputs::Text {
        predictions,
        references,
    } = inputs
    else {
        return Err(wrong_input("rouge", "text"));
    };

    let rouge_types: Vec<String> = match kwargs.get("rouge_types") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => vec!["rouge1".into(), "rouge2".into(), "rougeL".into()],
    };

    let mut result = MetricResult::new();
    for rouge_type in rouge_types {
        let scorer: Box<dyn Fn(&str, &str) -> Score> = match rouge_type.as_str() {
            "rougeL" | "rougeLsum" => Box::new(rouge_l),
            other => {
                let n = other
                    .strip_prefix("rouge")
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|&n| n > 0)
                    .ok_or_else(|| EvaluarError::MetricCompute {
                        metric: "rouge".into(),
                        message: format!("unsupported rouge type '{other}'"),
                    })?;
                Box::new(move |r: &str, h: &str| rouge_n(r, h, n))
            }
        };

        // Multiple references: keep the best-matching one per example.
        let scores: Vec<_> = predictions
            .iter()
            .zip(references.iter())
            .map(|(pred, refs)| {
                refs.iter()
                    .map(|r| scorer(r.as_str(), pred.as_str()))
                    .max_by(|a, b| a.fmeasure.total_cmp(&b.fmeasure))
                    .unwrap_or_default()
            })
            .collect();
        result.insert(rouge_type, MetricValue::Aggregate(aggregate_scores(&scores)));
    }
    Ok(result)
}

fn wer(inputs: &MetricInputs<'_>, _kwargs: &ComputeKwargs) -> Result<MetricResult> {
    let MetricInputs::Text {
        predictions,
        references,
    } = inputs
    else {
        return Err(wrong_input("wer", "text"));
    };
    let refs: Vec<&str> = references
        .iter()
        .map(|rs| rs.first().map_or("", String::as_str))
        .collect();
    let hyps: Vec<&str> = predictions.iter().map(String::as_str).collect();

    Ok(MetricResult::from([(
        "wer".to_string(),
        MetricValue::Scalar(word_error_rate(&refs, &hyps)),
    )]))
}
