use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_matcher::config::Config;
use resume_matcher::db::create_pool;
use resume_matcher::embeddings::create_embedder;
use resume_matcher::engine::{MatchEngine, RuleBasedRecognizer, SkillVocabulary};
use resume_matcher::llm_client::LlmClient;
use resume_matcher::routes::build_router;
use resume_matcher::security::auth::API_KEY_HEADER;
use resume_matcher::security::rate_limit::RateLimiter;
use resume_matcher::state::AppState;
use resume_matcher::storage::S3BlobStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-matcher v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis-backed rate limiter (connects lazily)
    let redis = redis::Client::open(config.redis_url.clone())?;
    let rate_limiter = RateLimiter::new(redis, config.rate_limit_enabled);
    info!("Rate limiting {}", if config.rate_limit_enabled { "enabled" } else { "disabled" });

    // Initialize S3 / MinIO
    let storage = Arc::new(S3BlobStore::from_config(&config).await);
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize text generator client
    let llm = LlmClient::new(&config.ollama_base_url, &config.ollama_model)?;
    info!("LLM client initialized (model: {})", llm.model());

    // Load the matching engine once; model loading is blocking work
    let engine = load_engine(&config).await?;
    let settings = engine.settings();
    info!(
        "Matching engine ready (embedder: {} dim {}, recognizer: {})",
        engine.embedder_name(),
        engine.embedding_dimension(),
        engine.recognizer_name()
    );
    info!(
        "Skill vocabulary: {} skills, {} education keywords, {} roles",
        engine.vocabulary().skills().len(),
        engine.vocabulary().education().len(),
        engine.vocabulary().roles().len()
    );
    info!(
        "Thresholds: semantic {}, missing-skill document {} / skill {}",
        settings.semantic_threshold, settings.thresholds.document, settings.thresholds.skill
    );

    // Build app state
    let state = AppState {
        db,
        engine,
        storage,
        llm,
        rate_limiter,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // peer addresses feed the per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn load_engine(config: &Config) -> Result<MatchEngine> {
    let backend = config.embedding_backend.clone();
    let model = config.embedding_model.clone();
    let dimension = config.embedding_dimension;
    let vocabulary_path = config.skill_vocabulary_path.clone();
    let settings = config.engine_settings();

    tokio::task::spawn_blocking(move || -> Result<MatchEngine> {
        let embedder = create_embedder(&backend, &model, dimension)
            .with_context(|| format!("loading embedding backend '{backend}'"))?;

        let vocabulary = match vocabulary_path {
            Some(path) => {
                let vocabulary = SkillVocabulary::from_path(&path)?;
                info!("Loaded skill vocabulary from {}", path.display());
                vocabulary
            }
            None => SkillVocabulary::builtin(),
        };

        Ok(MatchEngine::new(
            embedder,
            Arc::new(RuleBasedRecognizer::new()),
            Arc::new(vocabulary),
            settings,
        ))
    })
    .await
    .context("engine loading task panicked")?
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}
