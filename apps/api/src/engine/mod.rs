//! Matching engine: text extraction, entity extraction, semantic skill
//! detection and resume ↔ job-description scoring.
//!
//! Pure computation. Everything the engine needs (embedder, recognizer,
//! vocabulary, thresholds) is passed in through `MatchEngine`, built once in
//! `main` and cloned into handlers. Calls are synchronous and CPU-bound;
//! async callers run them under `spawn_blocking`.

pub mod dedup;
pub mod entities;
pub mod ner;
pub mod scorer;
pub mod semantic;
pub mod text;
pub mod vocabulary;

use std::sync::Arc;

use thiserror::Error;

use crate::embeddings::{EmbeddingError, Embedder};

pub use entities::ExtractedEntities;
pub use ner::{EntityRecognizer, RuleBasedRecognizer};
pub use scorer::{MatchOutcome, MissingSkillThresholds};
pub use text::{extract_text, extract_text_from_bytes, DocumentFormat};
pub use vocabulary::SkillVocabulary;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported file format '{0}' (expected pdf or docx)")]
    UnsupportedFormat(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("{0} is empty")]
    EmptyInput(&'static str),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<EmbeddingError> for EngineError {
    fn from(e: EmbeddingError) -> Self {
        EngineError::Embedding(e.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Minimum best-segment similarity for a semantically detected skill.
    pub semantic_threshold: f32,
    pub thresholds: MissingSkillThresholds,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            semantic_threshold: semantic::DEFAULT_SEMANTIC_THRESHOLD,
            thresholds: MissingSkillThresholds::default(),
        }
    }
}

impl EngineSettings {
    /// Every threshold is a cosine similarity and must lie in [-1, 1].
    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            ("semantic skill threshold", self.semantic_threshold),
            ("missing-skill document threshold", self.thresholds.document),
            ("missing-skill skill threshold", self.thresholds.skill),
        ];
        for (name, value) in checks {
            if !(-1.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [-1, 1], got {value}"));
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MatchEngine
// ────────────────────────────────────────────────────────────────────────────

/// Shared, read-only engine handle. Cloning is cheap (three `Arc`s).
#[derive(Clone)]
pub struct MatchEngine {
    embedder: Arc<dyn Embedder>,
    recognizer: Arc<dyn EntityRecognizer>,
    vocabulary: Arc<SkillVocabulary>,
    settings: EngineSettings,
}

impl MatchEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        recognizer: Arc<dyn EntityRecognizer>,
        vocabulary: Arc<SkillVocabulary>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            embedder,
            recognizer,
            vocabulary,
            settings,
        }
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn extract_entities(&self, text: &str) -> Result<ExtractedEntities, EngineError> {
        entities::extract_entities(
            self.embedder.as_ref(),
            self.recognizer.as_ref(),
            &self.vocabulary,
            text,
            self.settings.semantic_threshold,
        )
    }

    /// Whole-document embedding. Blank text is rejected before the embedder
    /// is called.
    pub fn get_embeddings(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::EmptyInput("document text"));
        }
        Ok(self.embedder.embed(text)?)
    }

    /// Vocabulary skills detected by meaning alone.
    pub fn extract_semantic_skills(&self, text: &str) -> Result<Vec<String>, EngineError> {
        let hits = semantic::extract_semantic_skills(
            self.embedder.as_ref(),
            text,
            self.vocabulary.skills(),
            self.settings.semantic_threshold,
        )?;
        Ok(hits.into_iter().map(str::to_string).collect())
    }

    pub fn calculate_match(
        &self,
        resume_text: &str,
        resume_skills: &[String],
        jd_text: &str,
        jd_skills: &[String],
    ) -> Result<MatchOutcome, EngineError> {
        scorer::calculate_match(
            self.embedder.as_ref(),
            resume_text,
            resume_skills,
            jd_text,
            jd_skills,
            self.settings.thresholds,
        )
    }
}

impl std::fmt::Debug for MatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchEngine")
            .field("embedder", &self.embedder.name())
            .field("recognizer", &self.recognizer.name())
            .field("vocabulary", &self.vocabulary)
            .field("settings", &self.settings)
            .finish()
    }
}
