//! Semantic Skill Detector: flags vocabulary skills whose meaning shows up in
//! the text even when the keyword itself does not.
//!
//! Two embedding calls (all segments, all skills) plus one cosine matrix,
//! instead of one call per segment × skill pair.

use tracing::debug;

use crate::embeddings::{cosine_matrix, Embedder};

use super::EngineError;

/// Segments of this many characters or fewer carry too little signal.
pub const MIN_SEGMENT_CHARS: usize = 10;

pub const DEFAULT_SEMANTIC_THRESHOLD: f32 = 0.5;

/// Splits on sentence dots and line breaks, trims, and keeps segments longer
/// than `MIN_SEGMENT_CHARS` characters.
pub fn split_segments(text: &str) -> Vec<&str> {
    text.split(['.', '\n'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SEGMENT_CHARS)
        .collect()
}

/// Returns the skills whose best segment similarity reaches `threshold`,
/// in vocabulary order.
pub fn extract_semantic_skills<'v>(
    embedder: &dyn Embedder,
    text: &str,
    skills: &'v [String],
    threshold: f32,
) -> Result<Vec<&'v str>, EngineError> {
    let segments = split_segments(text);
    if segments.is_empty() || skills.is_empty() {
        return Ok(Vec::new());
    }

    let skill_refs: Vec<&str> = skills.iter().map(String::as_str).collect();
    let segment_embs = embedder.embed_each(&segments)?;
    let skill_embs = embedder.embed_each(&skill_refs)?;

    // (segments × skills)
    let matrix = cosine_matrix(&segment_embs, &skill_embs);

    let detected: Vec<&str> = skill_refs
        .iter()
        .enumerate()
        .filter(|(j, _)| {
            let best = matrix
                .iter()
                .map(|row| row[*j])
                .fold(f32::NEG_INFINITY, f32::max);
            best >= threshold
        })
        .map(|(_, s)| *s)
        .collect();

    debug!(
        segments = segments.len(),
        detected = detected.len(),
        "semantic skill detection finished"
    );
    Ok(detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{ShortEmbedder, TableEmbedder};

    #[test]
    fn test_split_segments_drops_short_pieces() {
        let segs = split_segments("Hi.\nBuilt a payment platform in Rust. Ok\n  exactly10c \nelevenchars");
        assert_eq!(segs, vec!["Built a payment platform in Rust", "elevenchars"]);
    }

    #[test]
    fn test_split_segments_counts_characters_not_bytes() {
        // 10 chars, 20 bytes
        assert!(split_segments("éééééééééé").is_empty());
    }

    #[test]
    fn test_no_segments_returns_empty_without_embedding() {
        let embedder = TableEmbedder::new(2);
        let skills = vec!["Rust".to_string()];
        let got = extract_semantic_skills(&embedder, "short. tiny", &skills, 0.5).unwrap();
        assert!(got.is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_threshold_is_inclusive_and_uses_best_segment() {
        let embedder = TableEmbedder::new(2)
            .with("shipped microservices daily", &[1.0, 0.0])
            .with("wrote lots of documentation", &[0.0, 1.0])
            .with("Kubernetes", &[3.0, 4.0]) // 0.6 vs first, 0.8 vs second
            .with("Flutter", &[1.0, -1.0]); // best is ~0.707 vs first
        let skills = vec!["Kubernetes".to_string(), "Flutter".to_string()];
        let text = "shipped microservices daily\nwrote lots of documentation";

        let got = extract_semantic_skills(&embedder, text, &skills, 0.8).unwrap();
        assert_eq!(got, vec!["Kubernetes"]);
        // two batched calls: segments, then skills
        assert_eq!(embedder.calls(), 2);
    }

    #[test]
    fn test_below_threshold_everywhere_detects_nothing() {
        let embedder = TableEmbedder::new(2)
            .with("a sentence about gardening", &[1.0, 0.0])
            .with("Docker", &[0.0, 1.0]);
        let skills = vec!["Docker".to_string()];
        let got = extract_semantic_skills(&embedder, "a sentence about gardening", &skills, 0.5)
            .unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_short_batch_is_an_error() {
        let skills = vec!["Kubernetes".to_string(), "Flutter".to_string()];
        let err = extract_semantic_skills(&ShortEmbedder, "shipped microservices daily", &skills, 0.5)
            .unwrap_err();
        assert!(matches!(err, EngineError::Embedding(ref m) if m.contains("expected")));
    }
}
