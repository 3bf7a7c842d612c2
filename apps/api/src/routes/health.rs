use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version and engine backends.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-matcher",
        "embedder": state.engine.embedder_name(),
        "embedding_dimension": state.engine.embedding_dimension(),
        "recognizer": state.engine.recognizer_name(),
    }))
}
