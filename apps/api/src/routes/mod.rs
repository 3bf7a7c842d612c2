pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::matching::handlers as matching;
use crate::resumes::handlers as resumes;
use crate::security::auth::{require_api_key, ApiKey};
use crate::security::rate_limit::enforce_rate_limit;
use crate::security::with_security_headers;
use crate::state::AppState;

/// Multipart framing overhead allowed on top of the file size cap.
const MULTIPART_SLACK_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes() + MULTIPART_SLACK_BYTES;

    // Everything under /api/v1 requires X-API-Key and is rate limited per route.
    let api: Router<AppState> = Router::new()
        // Resumes
        .route(
            "/resumes",
            post(resumes::handle_upload).get(resumes::handle_list),
        )
        .route(
            "/resumes/:id",
            get(resumes::handle_get).delete(resumes::handle_delete),
        )
        // Matches
        .route(
            "/matches",
            post(matching::handle_create).get(matching::handle_list),
        )
        .route(
            "/matches/:id",
            get(matching::handle_get).delete(matching::handle_delete),
        )
        .route("/stats", get(matching::handle_stats))
        // Analysis
        .route("/analyze", post(analysis::handle_analyze))
        .route_layer(from_fn_with_state(
            state.rate_limiter.clone(),
            enforce_rate_limit,
        ))
        .layer(from_fn_with_state(
            ApiKey::new(&state.config.api_key),
            require_api_key,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    let router = Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1", api)
        .with_state(state);

    with_security_headers(router)
}
