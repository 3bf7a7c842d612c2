use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use super::{Embedder, EmbeddingError};

/// Fixed seed so vectors are stable across processes and Rust versions.
/// Changing either key changes every stored resume embedding.
const HASH_SEED_K0: u64 = 0x5265_7375_6d65_4d61;
const HASH_SEED_K1: u64 = 0x7463_6865_7256_3031;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder.
///
/// - word tokens (lowercased alphanumerics plus `+#./-`) at weight 1.0
/// - character trigrams of each padded token at weight 0.5, so inflections
///   and compound spellings ("kubernetes" / "kubernetes-based") stay close
/// - signed hashing, then L2 normalization
///
/// Empty or symbol-only text embeds to the zero vector.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash_feature(&self, feature: &str) -> (usize, f32) {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dimension as u64) as usize;
        // top bit picks the sign
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let (idx, sign) = self.hash_feature(&format!("w:{token}"));
            vector[idx] += sign * WORD_WEIGHT;

            let padded: Vec<char> = format!("<{token}>").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                let (idx, sign) = self.hash_feature(&format!("c:{gram}"));
                vector[idx] += sign * TRIGRAM_WEIGHT;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '/' | '-')))
        .map(|t| t.trim_matches(|c: char| matches!(c, '.' | '-' | '/')))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[test]
    fn test_vectors_are_normalized() {
        let e = HashEmbedder::new(384);
        let v = e.embed("Senior Rust engineer with Kubernetes").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_deterministic() {
        let e = HashEmbedder::new(128);
        let a = e.embed("Python, FastAPI, Docker").unwrap();
        let b = e.embed("Python, FastAPI, Docker").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_case_insensitive() {
        let e = HashEmbedder::new(128);
        let a = e.embed("KUBERNETES").unwrap();
        let b = e.embed("kubernetes").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let e = HashEmbedder::new(16);
        let v = e.embed("  ,;  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_related_text_closer_than_unrelated() {
        let e = HashEmbedder::new(384);
        let skill = e.embed("Kubernetes").unwrap();
        let related = e.embed("Deployed services on Kubernetes clusters").unwrap();
        let unrelated = e.embed("Baked sourdough bread every weekend").unwrap();
        assert!(cosine_similarity(&skill, &related) > cosine_similarity(&skill, &unrelated));
    }

    #[test]
    fn test_batch_preserves_order() {
        let e = HashEmbedder::new(64);
        let batch = e.embed_batch(&["react", "django"]).unwrap();
        assert_eq!(batch[0], e.embed("react").unwrap());
        assert_eq!(batch[1], e.embed("django").unwrap());
    }

    #[test]
    fn test_tokenize_keeps_tech_symbols() {
        let tokens: Vec<String> = tokenize("C++, C#, Node.js and CI/CD.").collect();
        assert_eq!(tokens, vec!["c++", "c#", "node.js", "and", "ci/cd"]);
    }

    #[test]
    fn test_zero_dimension_is_clamped() {
        let e = HashEmbedder::new(0);
        assert_eq!(e.dimension(), 1);
    }
}
