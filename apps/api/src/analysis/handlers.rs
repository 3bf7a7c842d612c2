use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::analyzer::{self, Analysis};
use crate::errors::AppError;
use crate::matching::service::{validate_description, MIN_DESCRIPTION_CHARS};
use crate::resumes::repository as resumes;
use crate::state::AppState;

/// Longest job description accepted for analysis.
pub const MAX_ANALYSIS_JD_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_id: Uuid,
    #[serde(default)]
    pub job_description: Option<String>,
}

/// Blank descriptions count as absent.
fn normalize_job_description(raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(jd) => validate_description(jd, MIN_DESCRIPTION_CHARS, MAX_ANALYSIS_JD_CHARS).map(Some),
    }
}

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<Analysis>, AppError> {
    let job_description = normalize_job_description(req.job_description.as_deref())?;

    let resume = resumes::get_detail(&state.db, req.resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {} not found", req.resume_id)))?;

    let analysis = analyzer::analyze(&state.llm, &resume.text, job_description.as_deref()).await;
    Ok(Json(analysis))
}
