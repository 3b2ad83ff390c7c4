use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every knob has a default, so the service runs with no environment at all.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory the CSV report is written into after each successful run.
    pub output_dir: PathBuf,
    pub limits: Limits,
}

/// Resource bounds for one scoring run.
///
/// The per-document budgets (extraction, cleaning) are tracked independently
/// per candidate; the vectorize budget covers the joint TF-IDF + similarity
/// step for the whole batch.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Files above this byte size are skipped, not scored.
    pub max_file_bytes: usize,
    /// PDFs above this page count are skipped, not scored.
    pub max_pdf_pages: usize,
    /// Soft wall-clock budget for extracting one document.
    pub extract_budget: Duration,
    /// Soft wall-clock budget for cleaning one document.
    pub clean_budget: Duration,
    /// Wall-clock budget for the joint vectorization + similarity step.
    /// Exceeding it fails the whole batch.
    pub vectorize_budget: Duration,
    /// Cleaned text is truncated to this many characters before tokenizing.
    pub max_chars: usize,
    /// Repetition factor applied to tokens matching the role keyword set.
    pub keyword_weight: usize,
    /// Vocabulary cap for the shared term vector space.
    pub max_features: usize,
    /// Terms present in more than this fraction of documents are excluded.
    pub max_df_ratio: f64,
    /// Capacity of the job-description read cache (entries).
    pub reference_cache_capacity: usize,
    /// At most this many resumes are scored per run; extras are dropped.
    pub max_candidates: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
            max_pdf_pages: 50,
            extract_budget: Duration::from_secs(20),
            clean_budget: Duration::from_secs(20),
            vectorize_budget: Duration::from_secs(30),
            max_chars: 100_000,
            keyword_weight: 10,
            max_features: 1500,
            max_df_ratio: 0.95,
            reference_cache_capacity: 10,
            max_candidates: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Limits::default();
        let limits = Limits {
            max_file_bytes: env_usize("RANKER_MAX_FILE_MB", 10)? * 1024 * 1024,
            max_pdf_pages: env_usize("RANKER_MAX_PDF_PAGES", defaults.max_pdf_pages)?,
            extract_budget: env_secs("RANKER_EXTRACT_BUDGET_SECS", defaults.extract_budget)?,
            clean_budget: env_secs("RANKER_CLEAN_BUDGET_SECS", defaults.clean_budget)?,
            vectorize_budget: env_secs("RANKER_VECTORIZE_BUDGET_SECS", defaults.vectorize_budget)?,
            max_chars: env_usize("RANKER_MAX_CHARS", defaults.max_chars)?,
            keyword_weight: env_usize("RANKER_KEYWORD_WEIGHT", defaults.keyword_weight)?,
            max_features: env_usize("RANKER_MAX_FEATURES", defaults.max_features)?,
            max_df_ratio: defaults.max_df_ratio,
            reference_cache_capacity: env_usize(
                "RANKER_REFERENCE_CACHE_CAPACITY",
                defaults.reference_cache_capacity,
            )?,
            max_candidates: env_usize("RANKER_MAX_CANDIDATES", defaults.max_candidates)?,
        };

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            output_dir: std::env::var("RANKER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("results")),
            limits,
        })
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{key} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}

fn env_secs(key: &str, default: Duration) -> Result<Duration> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .with_context(|| format!("{key} must be a number of seconds")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_shipped_caps() {
        let limits = Limits::default();
        assert_eq!(limits.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.max_pdf_pages, 50);
        assert_eq!(limits.extract_budget, Duration::from_secs(20));
        assert_eq!(limits.vectorize_budget, Duration::from_secs(30));
        assert_eq!(limits.keyword_weight, 10);
        assert_eq!(limits.max_features, 1500);
        assert_eq!(limits.reference_cache_capacity, 10);
    }

    #[test]
    fn test_env_usize_falls_back_to_default() {
        assert_eq!(env_usize("RANKER_TEST_UNSET_KEY", 42).unwrap(), 42);
    }
}
