//! Match Scorer: document-level similarity score plus two-pass missing-skill
//! detection (exact, then semantic).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::{cosine_similarity, max_similarity, Embedder};

use super::dedup::{fold, FoldedSet};
use super::EngineError;

/// Cut-offs for the semantic pass. A job skill is missing only when it is
/// below BOTH: similarity to the whole resume text (`document`) and best
/// similarity to any declared resume skill (`skill`). Comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissingSkillThresholds {
    pub document: f32,
    pub skill: f32,
}

impl Default for MissingSkillThresholds {
    fn default() -> Self {
        Self {
            document: 0.65,
            skill: 0.70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// 0 – 100, two decimals.
    pub score: f64,
    /// In job-description order.
    pub missing_skills: Vec<String>,
}

/// Scores a resume against a job description.
///
/// Algorithm:
/// 1. score = cos(resume_text, jd_text) × 100, rounded to 2 decimals, clamped to [0, 100]
/// 2. for each JD skill, pass 1: case-folded hit in the resume skills or as a
///    substring of the resume text → present
/// 3. survivors, pass 2: embed them once, embed the resume skills once;
///    missing iff sim(skill, resume_text) < document AND max sim(skill, resume skill) < skill
pub fn calculate_match(
    embedder: &dyn Embedder,
    resume_text: &str,
    resume_skills: &[String],
    jd_text: &str,
    jd_skills: &[String],
    thresholds: MissingSkillThresholds,
) -> Result<MatchOutcome, EngineError> {
    if resume_text.trim().is_empty() {
        return Err(EngineError::EmptyInput("resume text"));
    }
    if jd_text.trim().is_empty() {
        return Err(EngineError::EmptyInput("job description text"));
    }

    let docs = embedder.embed_each(&[resume_text, jd_text])?;
    let (resume_emb, jd_emb) = match docs.as_slice() {
        [r, j] => (r, j),
        _ => {
            return Err(EngineError::Embedding(format!(
                "expected 2 document vectors, got {}",
                docs.len()
            )))
        }
    };
    let score = to_score(cosine_similarity(resume_emb, jd_emb));

    let candidates = exact_pass(resume_text, resume_skills, jd_skills);
    if candidates.is_empty() {
        return Ok(MatchOutcome {
            score,
            missing_skills: Vec::new(),
        });
    }

    let candidate_refs: Vec<&str> = candidates.iter().map(|s| s.as_str()).collect();
    let candidate_embs = embedder.embed_each(&candidate_refs)?;

    let resume_skill_embs = if resume_skills.is_empty() {
        Vec::new()
    } else {
        let refs: Vec<&str> = resume_skills.iter().map(String::as_str).collect();
        embedder.embed_each(&refs)?
    };

    let missing_skills: Vec<String> = candidates
        .iter()
        .zip(&candidate_embs)
        .filter(|(_, emb)| {
            let sim_to_text = cosine_similarity(emb, resume_emb);
            // empty resume skill list contributes 0.0
            let sim_to_skills = max_similarity(emb, &resume_skill_embs);
            sim_to_text < thresholds.document && sim_to_skills < thresholds.skill
        })
        .map(|(skill, _)| skill.clone())
        .collect();

    debug!(
        score,
        semantic_candidates = candidates.len(),
        missing = missing_skills.len(),
        "match calculated"
    );

    Ok(MatchOutcome {
        score,
        missing_skills,
    })
}

/// Pass 1. Returns the JD skills with no exact (case-folded) evidence, in order,
/// each distinct skill once.
fn exact_pass(resume_text: &str, resume_skills: &[String], jd_skills: &[String]) -> Vec<String> {
    let resume_text_folded = fold(resume_text);
    let mut declared = FoldedSet::new();
    declared.extend(resume_skills.iter().map(String::as_str));

    let mut seen = FoldedSet::new();
    jd_skills
        .iter()
        .filter(|s| seen.insert(s))
        .filter(|s| {
            let folded = fold(s.trim());
            !(declared.contains(s) || resume_text_folded.contains(&folded))
        })
        .cloned()
        .collect()
}

fn to_score(similarity: f32) -> f64 {
    let rounded = (f64::from(similarity) * 100.0 * 100.0).round() / 100.0;
    rounded.clamp(0.0, 100.0)
}
