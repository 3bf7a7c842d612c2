use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::engine::{EngineSettings, MissingSkillThresholds};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base for public object URLs. Defaults to `s3_endpoint`.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Value expected in the `X-API-Key` header.
    pub api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub cors_origins: Vec<String>,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub embedding_backend: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub skill_vocabulary_path: Option<PathBuf>,
    pub semantic_skill_threshold: f32,
    pub missing_skill_document_threshold: f32,
    pub missing_skill_skill_threshold: f32,
    pub max_upload_size_mb: usize,
    pub rate_limit_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_endpoint = require_env("S3_ENDPOINT")?;

        let config = Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_public_url: std::env::var("S3_PUBLIC_URL").unwrap_or_else(|_| s3_endpoint.clone()),
            s3_endpoint,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            api_key: require_env("API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cors_origins: split_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "mistral".to_string()),
            embedding_backend: std::env::var("EMBEDDING_BACKEND").unwrap_or_else(|_| "hash".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "all-MiniLM-L6-v2".to_string()),
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", 384)?,
            skill_vocabulary_path: std::env::var("SKILL_VOCABULARY_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            semantic_skill_threshold: parse_env("SEMANTIC_SKILL_THRESHOLD", 0.5)?,
            missing_skill_document_threshold: parse_env("MISSING_SKILL_DOCUMENT_THRESHOLD", 0.65)?,
            missing_skill_skill_threshold: parse_env("MISSING_SKILL_SKILL_THRESHOLD", 0.70)?,
            max_upload_size_mb: parse_env("MAX_UPLOAD_SIZE_MB", 10)?,
            rate_limit_enabled: parse_bool(
                &std::env::var("RATE_LIMIT_ENABLED").unwrap_or_else(|_| "true".to_string()),
            )
            .context("RATE_LIMIT_ENABLED must be true or false")?,
        };

        if config.embedding_dimension == 0 {
            bail!("EMBEDDING_DIMENSION must be at least 1");
        }
        if config.max_upload_size_mb == 0 {
            bail!("MAX_UPLOAD_SIZE_MB must be at least 1");
        }
        config
            .engine_settings()
            .validate()
            .map_err(anyhow::Error::msg)?;

        Ok(config)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            semantic_threshold: self.semantic_skill_threshold,
            thresholds: MissingSkillThresholds {
                document: self.missing_skill_document_threshold,
                skill: self.missing_skill_skill_threshold,
            },
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads `key`, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: '{other}'"),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
