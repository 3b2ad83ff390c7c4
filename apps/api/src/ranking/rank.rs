//! Score normalization and ranking.
//!
//! Raw cosine similarities are rescaled against the batch maximum so the top
//! candidate always lands on 10.00 (when anything is nonzero at all), then
//! sorted descending with input order preserved on ties.

use std::cmp::Ordering;

use serde::Serialize;

use crate::errors::AppError;

/// One ranked candidate: raw similarity plus its 0–10 normalized score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRecord {
    pub name: String,
    pub raw_similarity: f64,
    /// `raw / batch_max × 10`, rounded to two decimals.
    pub score: f64,
}

/// Normalizes and ranks `(name, raw similarity)` pairs in input order.
///
/// An all-zero batch stays all-zero (the divisor falls back to 1 instead of
/// dividing by 0). An empty batch is a fatal `NoValidCandidates` — there is
/// nothing to rank.
pub fn rank(scored: Vec<(String, f64)>) -> Result<Vec<ScoreRecord>, AppError> {
    if scored.is_empty() {
        return Err(AppError::NoValidCandidates);
    }

    let max = scored.iter().map(|(_, s)| *s).fold(0.0_f64, f64::max);
    let divisor = if max > 0.0 { max } else { 1.0 };

    let mut records: Vec<ScoreRecord> = scored
        .into_iter()
        .map(|(name, raw)| ScoreRecord {
            name,
            raw_similarity: raw,
            score: round2(raw / divisor * 10.0),
        })
        .collect();

    // Stable sort: equal scores keep their original input order.
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(records)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
