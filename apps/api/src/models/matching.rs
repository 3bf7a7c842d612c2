use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescriptionRow {
    pub id: Uuid,
    pub text: String,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRow {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub match_score: f64,
    pub missing_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Match joined with its job description and the resume filename.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchListItem {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub resume_filename: Option<String>,
    pub jd_text: String,
    pub jd_skills: Vec<String>,
    pub match_score: f64,
    pub missing_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchDetail {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub resume_filename: Option<String>,
    pub resume_skills: Vec<String>,
    pub jd_text: String,
    pub jd_skills: Vec<String>,
    pub match_score: f64,
    pub missing_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}
