use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::engine::MatchEngine;
use crate::llm_client::LlmClient;
use crate::security::rate_limit::RateLimiter;
use crate::storage::BlobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Embedder, recognizer and vocabulary, loaded once at startup.
    pub engine: MatchEngine,
    pub storage: Arc<dyn BlobStore>,
    pub llm: LlmClient,
    pub rate_limiter: RateLimiter,
    pub config: Config,
}
