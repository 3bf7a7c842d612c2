use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use super::{Embedder, EmbeddingError};

/// Sentence-transformer embeddings through ONNX Runtime.
/// Model files are downloaded into the fastembed cache on first load.
pub struct FastEmbedder {
    model: TextEmbedding,
    dimension: usize,
}

impl FastEmbedder {
    pub fn load(model_name: &str) -> Result<Self, EmbeddingError> {
        let (model, dimension) = match model_name {
            "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
                (EmbeddingModel::AllMiniLML6V2, 384)
            }
            "bge-small-en-v1.5" | "BAAI/bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            "bge-base-en-v1.5" | "BAAI/bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            other => {
                return Err(EmbeddingError::Load(format!(
                    "unsupported fastembed model '{other}'"
                )))
            }
        };

        info!("Loading embedding model {model_name} (dim {dimension})");
        let model = TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
            .map_err(|e| EmbeddingError::Load(e.to_string()))?;

        Ok(Self { model, dimension })
    }
}

impl Embedder for FastEmbedder {
    fn name(&self) -> &'static str {
        "fastembed"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))
    }
}
