//! Entity Extractor: skills, education and experience from raw text.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::Embedder;

use super::dedup::FoldedSet;
use super::ner::{EntityLabel, EntityRecognizer};
use super::semantic;
use super::vocabulary::SkillVocabulary;
use super::EngineError;

/// The three entity lists produced for a resume or a job description.
/// Each list is case-insensitively unique and in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
}

/// Runs every extraction source over `text`:
///
/// 1. NER: ORG / WORK_OF_ART → experience, FAC / GPE → education
/// 2. skill and education keywords (substring, case-insensitive)
/// 3. role names → their whole implied-skill list
/// 4. semantic detection over the skill vocabulary
///
/// Skills are inserted keyword → role → semantic, so vocabulary casing wins.
pub fn extract_entities(
    embedder: &dyn Embedder,
    recognizer: &dyn EntityRecognizer,
    vocabulary: &SkillVocabulary,
    text: &str,
    semantic_threshold: f32,
) -> Result<ExtractedEntities, EngineError> {
    let mut skills = FoldedSet::new();
    let mut education = FoldedSet::new();
    let mut experience = FoldedSet::new();

    for entity in recognizer.recognize(text) {
        match entity.label {
            EntityLabel::Org | EntityLabel::WorkOfArt => experience.insert(&entity.text),
            EntityLabel::Fac | EntityLabel::Gpe => education.insert(&entity.text),
        };
    }

    skills.extend(vocabulary.match_skills(text));
    education.extend(vocabulary.match_education(text));

    for role in vocabulary.match_roles(text) {
        skills.extend(role.skills.iter().map(String::as_str));
    }

    let semantic_hits =
        semantic::extract_semantic_skills(embedder, text, vocabulary.skills(), semantic_threshold)?;
    skills.extend(semantic_hits);

    debug!(
        skills = skills.len(),
        education = education.len(),
        experience = experience.len(),
        "entities extracted"
    );

    Ok(ExtractedEntities {
        skills: skills.into_vec(),
        education: education.into_vec(),
        experience: experience.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use crate::engine::ner::{NamedEntity, RuleBasedRecognizer};
    use crate::engine::tests::TableEmbedder;

    /// Returns a fixed entity list regardless of input.
    struct FixedRecognizer(Vec<NamedEntity>);

    impl EntityRecognizer for FixedRecognizer {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, _text: &str) -> Vec<NamedEntity> {
            self.0.clone()
        }
    }

    fn entity(text: &str, label: EntityLabel) -> NamedEntity {
        NamedEntity {
            text: text.to_string(),
            label,
        }
    }

    #[test]
    fn test_ner_labels_route_to_lists() {
        let recognizer = FixedRecognizer(vec![
            entity("Acme Labs", EntityLabel::Org),
            entity("Deep Work", EntityLabel::WorkOfArt),
            entity("Stanford University", EntityLabel::Fac),
            entity("Berlin", EntityLabel::Gpe),
        ]);
        let out = extract_entities(
            &TableEmbedder::new(2),
            &recognizer,
            &SkillVocabulary::builtin(),
            "nothing else",
            0.5,
        )
        .unwrap();

        assert_eq!(out.experience, vec!["Acme Labs", "Deep Work"]);
        assert_eq!(out.education, vec!["Stanford University", "Berlin"]);
        assert!(out.skills.is_empty());
    }

    #[test]
    fn test_role_implies_skills_not_in_text() {
        let out = extract_entities(
            &TableEmbedder::new(2),
            &FixedRecognizer(vec![]),
            &SkillVocabulary::builtin(),
            "Senior DevOps engineer",
            0.5,
        )
        .unwrap();
        assert!(out.skills.contains(&"Terraform".to_string()));
        assert!(out.skills.contains(&"Kubernetes".to_string()));
    }

    #[test]
    fn test_keyword_casing_wins_over_role_and_duplicates_collapse() {
        // "docker" keyword hit first, then devops + cloud both imply Docker again
        let out = extract_entities(
            &TableEmbedder::new(2),
            &FixedRecognizer(vec![]),
            &SkillVocabulary::builtin(),
            "devops and cloud work with docker",
            0.5,
        )
        .unwrap();
        let dockers: Vec<&String> = out
            .skills
            .iter()
            .filter(|s| s.eq_ignore_ascii_case("docker"))
            .collect();
        assert_eq!(dockers, vec!["Docker"]);
        assert_eq!(out.skills[0], "Docker");
        assert!(out.skills.contains(&"Terraform".to_string()));
    }

    #[test]
    fn test_semantic_skills_are_appended() {
        let segment = "Orchestrated container workloads across clusters";
        let embedder = TableEmbedder::new(2)
            .with(segment, &[1.0, 0.0])
            .with("Kubernetes", &[1.0, 0.0]);
        let out = extract_entities(
            &embedder,
            &FixedRecognizer(vec![]),
            &SkillVocabulary::builtin(),
            segment,
            0.5,
        )
        .unwrap();
        assert_eq!(out.skills, vec!["Kubernetes"]);
    }

    #[test]
    fn test_empty_text_yields_empty_lists() {
        let out = extract_entities(
            &HashEmbedder::new(32),
            &RuleBasedRecognizer::new(),
            &SkillVocabulary::builtin(),
            "",
            0.5,
        )
        .unwrap();
        assert_eq!(out, ExtractedEntities::default());
    }
}
