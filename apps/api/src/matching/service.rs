use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::repository;
use crate::resumes::repository as resumes;
use crate::state::AppState;

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// A match score at or above this counts as a success in the stats.
pub const SUCCESS_SCORE: f64 = 70.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub jd_text: String,
    pub jd_skills: Vec<String>,
    pub match_score: f64,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_resumes: i64,
    pub total_matches: i64,
    pub avg_score: f64,
    pub success_rate: f64,
}

/// Trims `raw` and checks its length in characters.
pub fn validate_description(raw: &str, min: usize, max: usize) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();
    if chars < min || chars > max {
        return Err(AppError::Validation(format!(
            "Job description must be between {min} and {max} characters (got {chars})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Scores a stored resume against a new job description and records both.
pub async fn create_match(
    state: &AppState,
    resume_id: Uuid,
    description: &str,
) -> Result<MatchResponse, AppError> {
    let jd_text = validate_description(description, MIN_DESCRIPTION_CHARS, MAX_DESCRIPTION_CHARS)?;

    let resume = resumes::get_row(&state.db, resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))?;

    let engine = state.engine.clone();
    let jd_for_engine = jd_text.clone();
    let (jd_skills, outcome) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let jd_entities = engine.extract_entities(&jd_for_engine)?;
        let outcome = engine.calculate_match(
            &resume.text,
            &resume.skills,
            &jd_for_engine,
            &jd_entities.skills,
        )?;
        Ok((jd_entities.skills, outcome))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in matching: {e}")))??;

    let (job, matched) = repository::insert_job_and_match(
        &state.db,
        resume_id,
        &jd_text,
        &jd_skills,
        outcome.score,
        &outcome.missing_skills,
    )
    .await?;

    info!(
        match_id = %matched.id,
        resume_id = %resume_id,
        score = matched.match_score,
        missing = matched.missing_skills.len(),
        "Match created"
    );

    Ok(MatchResponse {
        id: matched.id,
        resume_id,
        jd_text: job.text,
        jd_skills: job.skills,
        match_score: matched.match_score,
        missing_skills: matched.missing_skills,
    })
}

/// Aggregates over all match scores. Averages and rates use one decimal.
pub fn compute_stats(total_resumes: i64, scores: &[f64]) -> Stats {
    let total_matches = scores.len() as i64;
    if scores.is_empty() {
        return Stats {
            total_resumes,
            total_matches,
            avg_score: 0.0,
            success_rate: 0.0,
        };
    }
    let n = scores.len() as f64;
    let avg = scores.iter().sum::<f64>() / n;
    let successes = scores.iter().filter(|s| **s >= SUCCESS_SCORE).count() as f64;
    Stats {
        total_resumes,
        total_matches,
        avg_score: round1(avg),
        success_rate: round1(successes / n * 100.0),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub async fn stats(state: &AppState) -> Result<Stats, AppError> {
    let total_resumes = resumes::count(&state.db).await?;
    let scores = repository::all_scores(&state.db).await?;
    Ok(compute_stats(total_resumes, &scores))
}
