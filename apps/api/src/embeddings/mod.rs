//! Embeddings: pluggable text → vector backends shared by the whole engine.
//!
//! Default: `HashEmbedder` (feature hashing, deterministic, no model files).
//! Optional: `onnx::FastEmbedder` (sentence-transformer via fastembed, cargo feature `fastembed`).
//!
//! The embedder is loaded once in `main` and carried as `Arc<dyn Embedder>`.
//! Every backend is a pure function of its input, so concurrent reads are safe.

pub mod hash;

#[cfg(feature = "fastembed")]
pub mod onnx;

use std::sync::Arc;

use thiserror::Error;

pub use hash::HashEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model failed to load: {0}")]
    Load(String),

    #[error("embedding inference failed: {0}")]
    Inference(String),

    #[error("unknown embedding backend '{0}'")]
    UnknownBackend(String),
}

/// Text embedding backend. Implement this to swap models without touching
/// the extractor or scorer.
pub trait Embedder: Send + Sync {
    /// Backend name ("hash", "fastembed"), recorded in logs.
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    /// Embeds every input in one call. Output order matches input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// `embed_batch` that fails unless exactly one vector comes back per input.
    fn embed_each(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let vectors = self.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Inference(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("backend returned no vectors".to_string()))
    }
}

/// Builds the configured backend.
///
/// `model` is only consulted by model-backed embedders; `dimension` only by
/// the hash embedder.
pub fn create_embedder(
    backend: &str,
    model: &str,
    dimension: usize,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match backend {
        "hash" => Ok(Arc::new(HashEmbedder::new(dimension))),
        #[cfg(feature = "fastembed")]
        "fastembed" => Ok(Arc::new(onnx::FastEmbedder::load(model)?)),
        other => {
            let _ = model;
            Err(EmbeddingError::UnknownBackend(other.to_string()))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Similarity
// ────────────────────────────────────────────────────────────────────────────

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity in [-1, 1]. A zero vector (or a length mismatch) scores 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}

/// Full `rows × cols` cosine matrix. Norms are computed once per vector.
pub fn cosine_matrix(rows: &[Vec<f32>], cols: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let col_norms: Vec<f32> = cols.iter().map(|c| norm(c)).collect();
    rows.iter()
        .map(|r| {
            let rn = norm(r);
            cols.iter()
                .zip(&col_norms)
                .map(|(c, cn)| {
                    let denom = rn * cn;
                    if denom == 0.0 || r.len() != c.len() {
                        0.0
                    } else {
                        dot(r, c) / denom
                    }
                })
                .collect()
        })
        .collect()
}

/// Highest similarity between `query` and any of `candidates`; 0.0 when empty.
pub fn max_similarity(query: &[f32], candidates: &[Vec<f32>]) -> f32 {
    candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
        .unwrap_or(0.0)
}
