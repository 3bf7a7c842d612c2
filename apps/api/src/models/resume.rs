use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full stored resume, embeddings included. Never serialized to clients.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub filename: String,
    pub text: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub embeddings: Vec<f32>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A resume as returned by the detail and upload endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeDetail {
    pub id: Uuid,
    pub filename: String,
    pub text: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeListItem {
    pub id: Uuid,
    pub filename: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Values for a new `resumes` row.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub filename: String,
    pub text: String,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
    pub embeddings: Vec<f32>,
    pub file_url: Option<String>,
}
