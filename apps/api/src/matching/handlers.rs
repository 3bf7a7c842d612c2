use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::{
    repository,
    service::{self, MatchResponse, Stats},
};
use crate::models::matching::{MatchDetail, MatchListItem};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMatchRequest {
    pub resume_id: Uuid,
    pub job_description: String,
}

/// POST /api/v1/matches
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), AppError> {
    let created = service::create_match(&state, req.resume_id, &req.job_description).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/matches
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<MatchListItem>>, AppError> {
    Ok(Json(repository::list(&state.db).await?))
}

/// GET /api/v1/matches/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetail>, AppError> {
    let detail = repository::get_detail(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {id} not found")))?;
    Ok(Json(detail))
}

/// DELETE /api/v1/matches/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !repository::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Match {id} not found")));
    }
    Ok(Json(json!({ "message": "Match deleted successfully" })))
}

/// GET /api/v1/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<Stats>, AppError> {
    Ok(Json(service::stats(&state).await?))
}
