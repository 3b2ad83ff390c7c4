//! The scoring pipeline: extract → clean → vectorize → rank → report.
//!
//! Per-candidate work (extraction, cleaning) is independent and runs
//! concurrently on the blocking pool, each document under its own budgets;
//! results are collected back in input order before the joint similarity
//! step, which needs the whole batch at once. Per-document failures exclude
//! that candidate; batch-level failures abort the run as a single error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{Config, Limits};
use crate::errors::AppError;
use crate::models::document::{CandidateFile, ProcessedDocument};
use crate::ranking::cache::ReferenceCache;
use crate::ranking::extract::Extractor;
use crate::ranking::normalize::clean_text;
use crate::ranking::profile::{RoleCatalog, RoleProfile};
use crate::ranking::rank::{self, ScoreRecord};
use crate::ranking::report;
use crate::ranking::vectorize;

/// A candidate that was dropped before scoring, and why.
#[derive(Debug, Clone, Serialize)]
pub struct ExcludedDocument {
    pub name: String,
    pub reason: String,
}

/// Result of one scoring run.
#[derive(Debug)]
pub struct RankOutcome {
    /// Ranked records, descending by normalized score.
    pub records: Vec<ScoreRecord>,
    /// Candidates excluded during extraction or cleaning.
    pub excluded: Vec<ExcludedDocument>,
    /// Where the CSV report was written.
    pub report_path: PathBuf,
}

enum CandidateOutcome {
    Processed(ProcessedDocument),
    Excluded { name: String, reason: String },
}

/// Scores `candidates` against `reference_text` and writes the CSV report.
///
/// `role` selects the keyword profile used to weight both the reference and
/// every candidate; unknown roles degrade to unweighted scoring. Candidate
/// names are assumed unique — the ingestion layer disambiguates collisions
/// before calling in.
pub async fn score(
    extractor: Arc<dyn Extractor>,
    roles: &RoleCatalog,
    config: &Config,
    reference_text: &str,
    role: Option<&str>,
    candidates: Vec<CandidateFile>,
) -> Result<RankOutcome, AppError> {
    let limits = config.limits;
    let profile = resolve_profile(roles, role);

    let reference_clean = {
        let profile = profile.clone();
        let text = reference_text.to_string();
        tokio::task::spawn_blocking(move || clean_text(&text, profile.as_deref(), &limits))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
    };
    if reference_clean.is_empty() {
        return Err(AppError::EmptyReference);
    }

    // One task per candidate; awaiting in spawn order restores input order.
    let handles: Vec<(String, JoinHandle<CandidateOutcome>)> = candidates
        .into_iter()
        .map(|file| {
            let name = file.name.clone();
            let task = tokio::spawn(process_candidate(
                extractor.clone(),
                profile.clone(),
                limits,
                file,
            ));
            (name, task)
        })
        .collect();

    let mut survivors: Vec<ProcessedDocument> = Vec::new();
    let mut excluded: Vec<ExcludedDocument> = Vec::new();
    for (name, handle) in handles {
        match handle.await {
            Ok(CandidateOutcome::Processed(doc)) => survivors.push(doc),
            Ok(CandidateOutcome::Excluded { name, reason }) => {
                info!(file = %name, reason = %reason, "candidate excluded");
                excluded.push(ExcludedDocument { name, reason });
            }
            Err(e) => {
                warn!(file = %name, error = %e, "candidate task failed");
                excluded.push(ExcludedDocument {
                    name,
                    reason: "processing failed".to_string(),
                });
            }
        }
    }

    if survivors.is_empty() {
        return Err(AppError::NoValidCandidates);
    }

    let similarities = {
        let reference = reference_clean.clone();
        let texts: Vec<String> = survivors.iter().map(|d| d.cleaned.clone()).collect();
        tokio::task::spawn_blocking(move || {
            vectorize::cosine_similarities(&reference, &texts, &limits)
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))??
    };

    let scored: Vec<(String, f64)> = survivors
        .iter()
        .zip(&similarities)
        .map(|(doc, sim)| (doc.name.clone(), *sim))
        .collect();
    let records = rank::rank(scored)?;

    let report_path =
        report::write_report(&records, &config.output_dir).map_err(AppError::Internal)?;
    info!(
        ranked = records.len(),
        excluded = excluded.len(),
        report = %report_path.display(),
        "scoring run complete"
    );

    Ok(RankOutcome {
        records,
        excluded,
        report_path,
    })
}

/// Variant of [`score`] that reads the reference from a server-local file
/// through the bounded LRU cache, for deployments that keep job descriptions
/// on disk and score against them repeatedly.
pub async fn score_reference_file(
    cache: &ReferenceCache,
    reference_path: &Path,
    extractor: Arc<dyn Extractor>,
    roles: &RoleCatalog,
    config: &Config,
    role: Option<&str>,
    candidates: Vec<CandidateFile>,
) -> Result<RankOutcome, AppError> {
    let reference_text = cache
        .read(reference_path)
        .map_err(|e| AppError::Validation(format!("job description not readable: {e}")))?;
    score(extractor, roles, config, &reference_text, role, candidates).await
}

async fn process_candidate(
    extractor: Arc<dyn Extractor>,
    profile: Option<Arc<RoleProfile>>,
    limits: Limits,
    file: CandidateFile,
) -> CandidateOutcome {
    let name = file.name.clone();
    let raw_size = file.bytes.len();
    let format = file.format;

    let text = extractor.extract(&file).await;
    if text.trim().is_empty() {
        return CandidateOutcome::Excluded {
            name,
            reason: "no text extracted".to_string(),
        };
    }

    let cleaned = match tokio::task::spawn_blocking(move || {
        clean_text(&text, profile.as_deref(), &limits)
    })
    .await
    {
        Ok(cleaned) => cleaned,
        Err(e) => {
            warn!(file = %name, error = %e, "cleaning worker failed");
            String::new()
        }
    };
    if cleaned.is_empty() {
        return CandidateOutcome::Excluded {
            name,
            reason: "empty after cleaning".to_string(),
        };
    }

    debug!(
        file = %name,
        size = raw_size,
        format = ?format,
        tokens = cleaned.split_whitespace().count(),
        "candidate processed"
    );
    CandidateOutcome::Processed(ProcessedDocument {
        name,
        raw_size,
        format,
        cleaned,
    })
}

fn resolve_profile(roles: &RoleCatalog, role: Option<&str>) -> Option<Arc<RoleProfile>> {
    let id = role?;
    let profile = roles.get(id).cloned().map(Arc::new);
    if profile.is_none() {
        warn!(role = id, "unknown role, scoring without keyword weighting");
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentFormat;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;

    /// Extractor stub that maps file names straight to canned text.
    struct StubExtractor {
        texts: HashMap<String, String>,
    }

    impl StubExtractor {
        fn new(texts: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                texts: texts
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract(&self, file: &CandidateFile) -> String {
            self.texts.get(&file.name).cloned().unwrap_or_default()
        }
    }

    fn candidate(name: &str) -> CandidateFile {
        CandidateFile {
            name: name.to_string(),
            bytes: Bytes::from_static(b"raw"),
            format: DocumentFormat::Pdf,
        }
    }

    fn test_config(dir: &Path) -> Config {
        Config {
            port: 0,
            rust_log: "info".to_string(),
            output_dir: dir.to_path_buf(),
            limits: Limits::default(),
        }
    }

    const REFERENCE: &str =
        "looking for a python engineer with data analysis and dashboard reporting experience";

    #[tokio::test]
    async fn test_full_run_ranks_and_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let extractor = StubExtractor::new(&[
            ("strong.pdf", "python engineer data analysis dashboard reporting"),
            ("weak.pdf", "warehouse forklift operator certification"),
        ]);

        let outcome = score(
            extractor,
            &roles,
            &config,
            REFERENCE,
            Some("dataScience"),
            vec![candidate("strong.pdf"), candidate("weak.pdf")],
        )
        .await
        .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].name, "strong.pdf");
        assert_eq!(outcome.records[0].score, 10.0);
        assert!(outcome.records[1].score < 10.0);
        assert!(outcome.report_path.exists());
        let report = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(report.starts_with("Name,RelativeScore\nstrong.pdf,10.00\n"));
    }

    #[tokio::test]
    async fn test_failed_candidate_excluded_without_failing_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let extractor = StubExtractor::new(&[
            ("good.pdf", "python data analysis reporting"),
            // "broken.pdf" has no entry, so extraction yields empty text.
        ]);

        let outcome = score(
            extractor,
            &roles,
            &config,
            REFERENCE,
            None,
            vec![candidate("broken.pdf"), candidate("good.pdf")],
        )
        .await
        .unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name, "good.pdf");
        assert_eq!(outcome.excluded.len(), 1);
        assert_eq!(outcome.excluded[0].name, "broken.pdf");
    }

    #[tokio::test]
    async fn test_all_candidates_failing_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let extractor = StubExtractor::new(&[]);

        let err = score(
            extractor,
            &roles,
            &config,
            REFERENCE,
            None,
            vec![candidate("a.pdf"), candidate("b.pdf")],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NoValidCandidates));
    }

    #[tokio::test]
    async fn test_empty_reference_is_fatal_and_writes_no_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let extractor = StubExtractor::new(&[("cv.pdf", "python data analysis")]);

        let err = score(
            extractor,
            &roles,
            &config,
            "   \n  ",
            None,
            vec![candidate("cv.pdf")],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::EmptyReference));
        assert!(!dir.path().join("output.csv").exists());
    }

    #[tokio::test]
    async fn test_unknown_role_degrades_to_unweighted_scoring() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let extractor = StubExtractor::new(&[
            ("cv.pdf", "python data analysis reporting"),
            ("other.pdf", "gardening soil compost"),
        ]);

        let outcome = score(
            extractor,
            &roles,
            &config,
            REFERENCE,
            Some("astronaut"),
            vec![candidate("cv.pdf"), candidate("other.pdf")],
        )
        .await
        .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].name, "cv.pdf");
        assert_eq!(outcome.records[0].score, 10.0);
    }

    #[tokio::test]
    async fn test_scoring_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let make_extractor = || {
            StubExtractor::new(&[
                ("a.pdf", "python data analysis dashboards"),
                ("b.pdf", "tableau reporting dashboards"),
                ("c.pdf", "classroom curriculum lesson plans"),
            ])
        };
        let files = || vec![candidate("a.pdf"), candidate("b.pdf"), candidate("c.pdf")];

        let first = score(
            make_extractor(),
            &roles,
            &config,
            REFERENCE,
            Some("dataScience"),
            files(),
        )
        .await
        .unwrap();
        let second = score(
            make_extractor(),
            &roles,
            &config,
            REFERENCE,
            Some("dataScience"),
            files(),
        )
        .await
        .unwrap();

        let summarize = |outcome: &RankOutcome| {
            outcome
                .records
                .iter()
                .map(|r| (r.name.clone(), r.score))
                .collect::<Vec<_>>()
        };
        assert_eq!(summarize(&first), summarize(&second));
    }

    #[tokio::test]
    async fn test_reference_file_variant_reads_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let roles = RoleCatalog::builtin();
        let cache = ReferenceCache::new(10);
        let jd_path = dir.path().join("jd.txt");
        std::fs::write(&jd_path, REFERENCE).unwrap();
        let extractor = StubExtractor::new(&[("cv.pdf", "python data analysis reporting")]);

        let outcome = score_reference_file(
            &cache,
            &jd_path,
            extractor.clone(),
            &roles,
            &config,
            None,
            vec![candidate("cv.pdf")],
        )
        .await
        .unwrap();
        assert_eq!(outcome.records.len(), 1);

        // Second run is served from cache even after the file disappears.
        std::fs::remove_file(&jd_path).unwrap();
        let outcome = score_reference_file(
            &cache,
            &jd_path,
            extractor,
            &roles,
            &config,
            None,
            vec![candidate("cv.pdf")],
        )
        .await
        .unwrap();
        assert_eq!(outcome.records.len(), 1);
    }
}
