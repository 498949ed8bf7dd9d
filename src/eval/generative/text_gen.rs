//! Text generation evaluation metrics
//!
//! Corpus BLEU over token lists, a SacreBLEU-style BLEU over detokenized
//! text, ROUGE-N / ROUGE-L scores, and word error rate.

use std::collections::HashMap;

use super::metric::{AggregateScore, Score};

/// Corpus-level BLEU statistics
#[derive(Debug, Clone, PartialEq)]
pub struct BleuScore {
    pub bleu: f64,
    pub precisions: Vec<f64>,
    pub brevity_penalty: f64,
    pub length_ratio: f64,
    pub translation_length: usize,
    pub reference_length: usize,
}

/// Which reference length the brevity penalty compares against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefLength {
    /// Shortest reference of each example
    Shortest,
    /// Reference whose length is closest to the hypothesis
    Closest,
}

/// Extract n-grams from a token sequence and count occurrences.
fn extract_ngrams<'a>(tokens: &[&'a str], n: usize) -> HashMap<Vec<&'a str>, usize> {
    let mut counts = HashMap::new();
    if n > 0 && tokens.len() >= n {
        for window in tokens.windows(n) {
            *counts.entry(window.to_vec()).or_insert(0) += 1;
        }
    }
    counts
}

/// Compute corpus BLEU with clipped n-gram precision and brevity penalty.
///
/// Counts are pooled over the whole corpus before taking precisions
/// (Papineni et al., 2002). With `smooth`, each precision is
/// `(matches + 1) / (possible + 1)`.
///
/// # Arguments
/// * `references` - One or more reference token lists per example
/// * `hypotheses` - One candidate token list per example
/// * `max_order` - Maximum n-gram order (typically 4)
pub fn corpus_bleu(
    references: &[Vec<Vec<&str>>],
    hypotheses: &[Vec<&str>],
    max_order: usize,
    smooth: bool,
    ref_length: RefLength,
) -> BleuScore {
    let mut matches_by_order = vec![0usize; max_order];
    let mut possible_by_order = vec![0usize; max_order];
    let mut translation_length = 0usize;
    let mut reference_length = 0usize;

    for (refs, hyp) in references.iter().zip(hypotheses) {
        translation_length += hyp.len();
        reference_length += match ref_length {
            RefLength::Shortest => refs.iter().map(Vec::len).min().unwrap_or(0),
            RefLength::Closest => refs
                .iter()
                .map(Vec::len)
                .min_by_key(|&len| (len as isize - hyp.len() as isize).unsigned_abs())
                .unwrap_or(0),
        };

        for n in 1..=max_order {
            let hyp_ngrams = extract_ngrams(hyp, n);
            let mut max_ref_counts: HashMap<Vec<&str>, usize> = HashMap::new();
            for r in refs {
                for (ngram, count) in extract_ngrams(r, n) {
                    let entry = max_ref_counts.entry(ngram).or_insert(0);
                    *entry = (*entry).max(count);
                }
            }
            for (ngram, &hyp_count) in &hyp_ngrams {
                let ref_count = max_ref_counts.get(ngram).copied().unwrap_or(0);
                matches_by_order[n - 1] += hyp_count.min(ref_count);
            }
            possible_by_order[n - 1] += hyp.len().saturating_sub(n - 1);
        }
    }

    let precisions: Vec<f64> = matches_by_order
        .iter()
        .zip(&possible_by_order)
        .map(|(&m, &p)| {
            if smooth {
                (m as f64 + 1.0) / (p as f64 + 1.0)
            } else if p > 0 {
                m as f64 / p as f64
            } else {
                0.0
            }
        })
        .collect();

    let geo_mean = if !precisions.is_empty() && precisions.iter().all(|&p| p > 0.0) {
        (precisions.iter().map(|p| p.ln()).sum::<f64>() / max_order as f64).exp()
    } else {
        0.0
    };

    let length_ratio = if reference_length > 0 {
        translation_length as f64 / reference_length as f64
    } else {
        0.0
    };
    let brevity_penalty = if length_ratio > 1.0 {
        1.0
    } else if length_ratio == 0.0 {
        0.0
    } else {
        (1.0 - 1.0 / length_ratio).exp()
    };

    BleuScore {
        bleu: geo_mean * brevity_penalty,
        precisions,
        brevity_penalty,
        length_ratio,
        translation_length,
        reference_length,
    }
}

/// Split text into words, separating ASCII punctuation.
pub fn tokenize_13a(text: &str, lowercase: bool) -> Vec<String> {
    let text = if lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        let mut current = String::new();
        for c in chunk.chars() {
            if c.is_ascii_punctuation() {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            } else {
                current.push(c);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}

/// SacreBLEU-style corpus BLEU on detokenized text, scaled to 0-100.
pub fn sacre_bleu(
    predictions: &[String],
    references: &[Vec<String>],
    lowercase: bool,
) -> BleuScore {
    let hyp_tokens: Vec<Vec<String>> = predictions
        .iter()
        .map(|p| tokenize_13a(p, lowercase))
        .collect();
    let ref_tokens: Vec<Vec<Vec<String>>> = references
        .iter()
        .map(|refs| refs.iter().map(|r| tokenize_13a(r, lowercase)).collect())
        .collect();

    let hyps: Vec<Vec<&str>> = hyp_tokens.iter().map(|t| as_strs(t)).collect();
    let refs: Vec<Vec<Vec<&str>>> = ref_tokens
        .iter()
        .map(|rs| rs.iter().map(|t| as_strs(t)).collect())
        .collect();

    let mut score = corpus_bleu(&refs, &hyps, 4, false, RefLength::Closest);
    score.bleu *= 100.0;
    score.precisions.iter_mut().for_each(|p| *p *= 100.0);
    score
}

pub(crate) fn as_strs(tokens: &[String]) -> Vec<&str> {
    tokens.iter().map(String::as_str).collect()
}

fn prf(overlap: usize, hyp_total: usize, ref_total: usize) -> Score {
    if hyp_total == 0 || ref_total == 0 {
        return Score::default();
    }
    let precision = overlap as f64 / hyp_total as f64;
    let recall = overlap as f64 / ref_total as f64;
    let fmeasure = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    Score {
        precision,
        recall,
        fmeasure,
    }
}

/// Compute ROUGE-N precision, recall, and F1 (n-gram overlap).
pub fn rouge_n(reference: &str, hypothesis: &str, n: usize) -> Score {
    let ref_tokens: Vec<&str> = reference.split_whitespace().collect();
    let hyp_tokens: Vec<&str> = hypothesis.split_whitespace().collect();

    if ref_tokens.len() < n || hyp_tokens.len() < n {
        return Score::default();
    }

    let ref_ngrams = extract_ngrams(&ref_tokens, n);
    let hyp_ngrams = extract_ngrams(&hyp_tokens, n);

    let mut overlap = 0usize;
    for (ngram, &hyp_count) in &hyp_ngrams {
        let ref_count = ref_ngrams.get(ngram).copied().unwrap_or(0);
        overlap += hyp_count.min(ref_count);
    }

    prf(
        overlap,
        hyp_ngrams.values().sum(),
        ref_ngrams.values().sum(),
    )
}

/// Compute ROUGE-L precision, recall, and F1 using longest common subsequence.
pub fn rouge_l(reference: &str, hypothesis: &str) -> Score {
    let ref_tokens: Vec<&str> = reference.split_whitespace().collect();
    let hyp_tokens: Vec<&str> = hypothesis.split_whitespace().collect();

    if ref_tokens.is_empty() || hyp_tokens.is_empty() {
        return Score::default();
    }

    let lcs_len = lcs_length(&ref_tokens, &hyp_tokens);
    prf(lcs_len, hyp_tokens.len(), ref_tokens.len())
}

/// Compute length of longest common subsequence.
fn lcs_length(a: &[&str], b: &[&str]) -> usize {
    let n = a.len();
    let m = b.len();
    let mut dp = vec![vec![0usize; m + 1]; n + 1];

    for i in 1..=n {
        for j in 1..=m {
            if a[i - 1] == b[j - 1] {
                dp[i][j] = dp[i - 1][j - 1] + 1;
            } else {
                dp[i][j] = dp[i - 1][j].max(dp[i][j - 1]);
            }
        }
    }

    dp[n][m]
}

/// Summarize per-example scores: 2.5th percentile, mean, 97.5th percentile.
pub fn aggregate_scores(scores: &[Score]) -> AggregateScore {
    if scores.is_empty() {
        return AggregateScore::default();
    }
    let component = |f: fn(&Score) -> f64| -> (f64, f64, f64) {
        let mut values: Vec<f64> = scores.iter().map(f).collect();
        values.sort_by(f64::total_cmp);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let rank = |q: f64| {
            let idx = (q * values.len() as f64).ceil() as usize;
            values[idx.clamp(1, values.len()) - 1]
        };
        (rank(0.025), mean, rank(0.975))
    };
    let (pl, pm, ph) = component(|s| s.precision);
    let (rl, rm, rh) = component(|s| s.recall);
    let (fl, fm, fh) = component(|s| s.fmeasure);
    AggregateScore {
        low: Score {
            precision: pl,
            recall: rl,
            fmeasure: fl,
        },
        mid: Score {
            precision: pm,
            recall: rm,
            fmeasure: fm,
        },
        high: Score {
            precision: ph,
            recall: rh,
            fmeasure: fh,
        },
    }
}

/// Word-level Levenshtein distance.
pub fn word_edit_distance(reference: &[&str], hypothesis: &[&str]) -> usize {
    let n = reference.len();
    let m = hypothesis.len();
    let mut dp = vec![vec![0usize; m + 1]; n + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        dp[0][j] = j;
    }

    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(reference[i - 1] != hypothesis[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1) // deletion
                .min(dp[i][j - 1] + 1) // insertion
                .min(dp[i - 1][j - 1] + cost); // substitution
        }
    }

    dp[n][m]
}

/// Corpus word error rate: total edits over total reference words.
///
/// Returns 0.0 when both sides are empty and `f64::INFINITY` when only the
/// references are empty.
pub fn word_error_rate(references: &[&str], hypotheses: &[&str]) -> f64 {
    let mut edits = 0usize;
    let mut ref_words = 0usize;
    let mut hyp_words = 0usize;
    for (r, h) in references.iter().zip(hypotheses) {
        let r: Vec<&str> = r.split_whitespace().collect();
        let h: Vec<&str> = h.split_whitespace().collect();
        edits += word_edit_distance(&r, &h);
        ref_words += r.len();
        hyp_words += h.len();
    }
    match (ref_words, hyp_words) {
        (0, 0) => 0.0,
        (0, _) => f64::INFINITY,
        _ => edits as f64 / ref_words as f64,
    }
}
