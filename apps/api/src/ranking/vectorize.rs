//! Joint TF-IDF vector space and cosine similarity.
//!
//! The reference document and all candidates are vectorized together: one
//! shared vocabulary of 1–3-token terms, capped by global term frequency,
//! with near-universal terms excluded. Vectors are weighted with smoothed
//! IDF and L2-normalized, so cosine similarity reduces to a dot product.
//! Vectorization is inherently joint, so its budget failure is fatal for
//! the whole batch rather than per document.

use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::config::Limits;
use crate::errors::AppError;

/// Term spans of 1 up to this many tokens become vocabulary entries.
const NGRAM_MAX: usize = 3;

/// Shared vocabulary and per-term IDF weights for one scoring call.
/// Built once over the whole batch, never mutated afterwards.
pub struct TermVectorSpace {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TermVectorSpace {
    /// Fits the space over per-document term counts (reference first).
    ///
    /// Terms present in more than `max_df_ratio` of the documents are
    /// excluded; the remainder is capped at `max_features` by global term
    /// frequency, ties broken lexicographically so runs are deterministic.
    /// Minimum document frequency is 1, so every surviving term is kept.
    fn fit(docs: &[HashMap<String, u32>], limits: &Limits) -> Self {
        let n_docs = docs.len();
        let mut doc_freq: HashMap<&str, u32> = HashMap::new();
        let mut term_freq: HashMap<&str, u64> = HashMap::new();
        for doc in docs {
            for (term, count) in doc {
                *doc_freq.entry(term).or_insert(0) += 1;
                *term_freq.entry(term).or_insert(0) += u64::from(*count);
            }
        }

        let max_doc_count = limits.max_df_ratio * n_docs as f64;
        let mut kept: Vec<(&str, u64)> = term_freq
            .iter()
            .filter(|(term, _)| f64::from(doc_freq[*term]) <= max_doc_count)
            .map(|(term, freq)| (*term, *freq))
            .collect();
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        kept.truncate(limits.max_features);

        let mut vocabulary = HashMap::with_capacity(kept.len());
        let mut idf = Vec::with_capacity(kept.len());
        for (i, (term, _)) in kept.iter().enumerate() {
            vocabulary.insert((*term).to_string(), i);
            let df = f64::from(doc_freq[*term]);
            idf.push(((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0);
        }
        Self { vocabulary, idf }
    }

    /// Dense L2-normalized TF-IDF vector for one document's term counts.
    fn vector(&self, counts: &HashMap<String, u32>) -> Vec<f64> {
        let mut v = vec![0.0; self.idf.len()];
        for (term, count) in counts {
            if let Some(&i) = self.vocabulary.get(term) {
                v[i] = f64::from(*count) * self.idf[i];
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }

    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }
}

/// Computes raw cosine similarities between the cleaned reference text and
/// each cleaned candidate, aligned by position.
///
/// Fatal conditions: an empty reference (`EmptyReference`) and an exhausted
/// wall-clock budget (`ComputationTimeout`). A candidate sharing no vocabulary
/// with the reference simply scores 0.0.
pub fn cosine_similarities(
    reference: &str,
    candidates: &[String],
    limits: &Limits,
) -> Result<Vec<f64>, AppError> {
    if reference.split_whitespace().next().is_none() {
        return Err(AppError::EmptyReference);
    }
    let started = Instant::now();
    let budget = limits.vectorize_budget;
    let timed_out = || AppError::ComputationTimeout(budget.as_secs());

    let mut doc_counts: Vec<HashMap<String, u32>> = Vec::with_capacity(candidates.len() + 1);
    doc_counts.push(ngram_counts(reference));
    for text in candidates {
        if started.elapsed() > budget {
            return Err(timed_out());
        }
        doc_counts.push(ngram_counts(text));
    }

    let space = TermVectorSpace::fit(&doc_counts, limits);
    if started.elapsed() > budget {
        return Err(timed_out());
    }
    if space.is_empty() {
        // Every term was excluded (tiny batches of near-identical documents);
        // all vectors are zero, so every similarity is zero.
        return Ok(vec![0.0; candidates.len()]);
    }

    let reference_vector = space.vector(&doc_counts[0]);
    let mut similarities = Vec::with_capacity(candidates.len());
    for counts in &doc_counts[1..] {
        if started.elapsed() > budget {
            return Err(timed_out());
        }
        similarities.push(dot(&reference_vector, &space.vector(counts)));
    }

    debug!(
        documents = doc_counts.len(),
        features = space.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "similarity computation finished"
    );
    Ok(similarities)
}

/// Counts contiguous 1..=NGRAM_MAX token spans in a cleaned token stream.
fn ngram_counts(text: &str) -> HashMap<String, u32> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut counts = HashMap::new();
    for n in 1..=NGRAM_MAX {
        if tokens.len() < n {
            break;
        }
        for window in tokens.windows(n) {
            *counts.entry(window.join(" ")).or_insert(0u32) += 1;
        }
    }
    counts
}

/// Dot product of two unit vectors, clamped against floating-point drift.
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| x * y)
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn test_ngram_counts_cover_unigrams_to_trigrams() {
        let counts = ngram_counts("alpha beta gamma");
        assert_eq!(counts["alpha"], 1);
        assert_eq!(counts["alpha beta"], 1);
        assert_eq!(counts["alpha beta gamma"], 1);
        assert_eq!(counts.len(), 6);
    }

    #[test]
    fn test_identical_candidate_scores_near_one() {
        let reference = "rust async engineer distributed systems";
        let candidates = vec![
            reference.to_string(),
            "gardening flowers soil compost".to_string(),
        ];
        let sims = cosine_similarities(reference, &candidates, &limits()).unwrap();
        assert!(sims[0] > 0.999_999, "identical doc scored {}", sims[0]);
        assert_eq!(sims[1], 0.0);
    }

    #[test]
    fn test_similar_candidate_outscores_unrelated() {
        let reference = "rust async engineer";
        let candidates = vec![
            "rust async developer".to_string(),
            "pastry chef croissant".to_string(),
        ];
        let sims = cosine_similarities(reference, &candidates, &limits()).unwrap();
        assert!(sims[0] > sims[1]);
        assert_eq!(sims[1], 0.0);
    }

    #[test]
    fn test_near_universal_terms_excluded_from_vocabulary() {
        let docs = vec![
            ngram_counts("common alpha"),
            ngram_counts("common beta"),
            ngram_counts("common gamma"),
        ];
        let space = TermVectorSpace::fit(&docs, &limits());
        // "common" is in 3/3 documents (> 95 %), everything else in one.
        assert!(!space.vocabulary.contains_key("common"));
        assert!(space.vocabulary.contains_key("alpha"));
    }

    #[test]
    fn test_near_universal_terms_do_not_influence_similarity() {
        let reference = "common alpha";
        let candidates = vec!["common beta".to_string(), "common gamma".to_string()];
        let sims = cosine_similarities(reference, &candidates, &limits()).unwrap();
        // Only the shared term is near-universal, so nothing overlaps.
        assert_eq!(sims, vec![0.0, 0.0]);
    }

    #[test]
    fn test_feature_cap_keeps_most_frequent_terms() {
        let mut small = limits();
        small.max_features = 2;
        let docs = vec![
            ngram_counts("alpha alpha alpha"),
            ngram_counts("beta beta"),
            ngram_counts("gamma"),
        ];
        let space = TermVectorSpace::fit(&docs, &small);
        assert_eq!(space.len(), 2);
        // Global frequencies: alpha 3, then "alpha alpha" and "beta" tie at 2;
        // the lexicographic tie-break keeps "alpha alpha".
        assert!(space.vocabulary.contains_key("alpha"));
        assert!(space.vocabulary.contains_key("alpha alpha"));
        assert!(!space.vocabulary.contains_key("beta"));
    }

    #[test]
    fn test_empty_reference_is_fatal() {
        let err = cosine_similarities("", &["anything".to_string()], &limits()).unwrap_err();
        assert!(matches!(err, AppError::EmptyReference));
    }

    #[test]
    fn test_zero_budget_times_out() {
        let mut tight = limits();
        tight.vectorize_budget = std::time::Duration::ZERO;
        let err = cosine_similarities("rust engineer", &["rust".to_string()], &tight).unwrap_err();
        assert!(matches!(err, AppError::ComputationTimeout(_)));
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let reference = "data analysis python dashboards";
        let candidates = vec![
            "python dashboards tableau".to_string(),
            "warehouse forklift operator".to_string(),
            "data analysis excel".to_string(),
        ];
        let first = cosine_similarities(reference, &candidates, &limits()).unwrap();
        let second = cosine_similarities(reference, &candidates, &limits()).unwrap();
        assert_eq!(first, second);
    }
}
