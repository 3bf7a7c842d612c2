use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeDetail, ResumeListItem};
use crate::resumes::{repository, service};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// `limit` 1..=100 (default 50), `offset` ≥ 0 (default 0).
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let limit = self.limit.unwrap_or(50);
        let offset = self.offset.unwrap_or(0);
        if !(1..=100).contains(&limit) {
            return Err(AppError::Validation("limit must be between 1 and 100".to_string()));
        }
        if offset < 0 {
            return Err(AppError::Validation("offset must be non-negative".to_string()));
        }
        Ok((limit, offset))
    }
}

/// POST /api/v1/resumes (multipart, field `file`)
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeDetail>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let resume = service::process_upload(
            &state,
            filename.as_deref(),
            content_type.as_deref(),
            bytes.to_vec(),
        )
        .await?;
        return Ok((StatusCode::CREATED, Json(resume)));
    }

    Err(AppError::Validation(format!(
        "Multipart field '{UPLOAD_FIELD}' is required"
    )))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<ResumeListItem>>, AppError> {
    let (limit, offset) = page.resolve()?;
    Ok(Json(repository::list(&state.db, limit, offset).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetail>, AppError> {
    let resume = repository::get_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(resume))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !repository::delete_with_matches(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}
