//! Axum route handlers for the Ranking API.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::errors::AppError;
use crate::models::document::{CandidateFile, DocumentFormat};
use crate::ranking::pipeline::{self, ExcludedDocument};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RankedCandidate {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub role: Option<String>,
    pub results: Vec<RankedCandidate>,
    pub excluded: Vec<ExcludedDocument>,
    /// Path of the CSV report written for this run.
    pub report: String,
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/roles
///
/// Lists the role identifiers accepted by the `role` form field.
pub async fn handle_list_roles(State(state): State<AppState>) -> Json<RolesResponse> {
    Json(RolesResponse {
        roles: state
            .roles
            .role_ids()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })
}

/// POST /api/v1/rank (multipart/form-data)
///
/// Fields: `job_description` (text or uploaded text file) or
/// `job_description_path` (server-local file, served through the reference
/// cache), optional `role`, and one `resumes` part per candidate file.
/// Responds with the ranked list plus the candidates that were excluded.
pub async fn handle_rank(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RankResponse>, AppError> {
    let mut reference_text: Option<String> = None;
    let mut reference_path: Option<PathBuf> = None;
    let mut role: Option<String> = None;
    let mut files: Vec<CandidateFile> = Vec::new();
    let mut excluded: Vec<ExcludedDocument> = Vec::new();
    let mut name_counts: HashMap<String, usize> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart request: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "job_description" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable job description: {e}")))?;
                reference_text = Some(String::from_utf8_lossy(&bytes).into_owned());
            }
            "job_description_path" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable field: {e}")))?;
                reference_path = Some(PathBuf::from(value.trim()));
            }
            "role" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable field: {e}")))?;
                if !value.trim().is_empty() {
                    role = Some(value.trim().to_string());
                }
            }
            "resumes" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if file_name.is_empty() {
                    return Err(AppError::Validation(
                        "resume part is missing a file name".to_string(),
                    ));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("unreadable upload {file_name}: {e}"))
                })?;
                let name = unique_name(&mut name_counts, &file_name);
                match DocumentFormat::from_name(&name) {
                    Ok(format) => files.push(CandidateFile { name, bytes, format }),
                    // Unsupported extension is a per-document error: the file
                    // is reported, the rest of the batch proceeds.
                    Err(e) => excluded.push(ExcludedDocument {
                        name,
                        reason: e.to_string(),
                    }),
                }
            }
            other => {
                warn!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let max_candidates = state.config.limits.max_candidates;
    if files.len() > max_candidates {
        warn!(
            dropped = files.len() - max_candidates,
            "truncating candidate batch to the configured cap"
        );
        files.truncate(max_candidates);
    }
    if files.is_empty() {
        if excluded.is_empty() {
            return Err(AppError::Validation("no resumes uploaded".to_string()));
        }
        return Err(AppError::NoValidCandidates);
    }

    let outcome = match (reference_text, reference_path) {
        (Some(text), _) => {
            pipeline::score(
                state.extractor.clone(),
                &state.roles,
                &state.config,
                &text,
                role.as_deref(),
                files,
            )
            .await?
        }
        (None, Some(path)) => {
            pipeline::score_reference_file(
                &state.reference_cache,
                &path,
                state.extractor.clone(),
                &state.roles,
                &state.config,
                role.as_deref(),
                files,
            )
            .await?
        }
        (None, None) => {
            return Err(AppError::Validation(
                "job_description or job_description_path is required".to_string(),
            ))
        }
    };

    let mut all_excluded = excluded;
    all_excluded.extend(outcome.excluded);

    Ok(Json(RankResponse {
        role,
        results: outcome
            .records
            .iter()
            .map(|r| RankedCandidate {
                name: r.name.clone(),
                score: r.score,
            })
            .collect(),
        excluded: all_excluded,
        report: outcome.report_path.display().to_string(),
    }))
}

/// Disambiguates colliding upload names by suffixing " (n)" before the
/// extension. Downstream code treats names as unique keys.
fn unique_name(counts: &mut HashMap<String, usize>, name: &str) -> String {
    let seen = counts.entry(name.to_string()).or_insert(0);
    *seen += 1;
    if *seen == 1 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem} ({}).{ext}", *seen - 1),
        None => format!("{name} ({})", *seen - 1),
    }
}
