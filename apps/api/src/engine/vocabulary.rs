//! Skill vocabulary: canonical skill keywords, education keywords, and the
//! role → implied-skills table. Read-only, loaded once per process.

use std::collections::BTreeSet;
use std::path::Path;

use aho_corasick::AhoCorasick;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SKILL_KEYWORDS: &[&str] = &[
    "Python",
    "JavaScript",
    "TypeScript",
    "Flutter",
    "Kotlin",
    "Dart",
    "React",
    "Node.js",
    "Django",
    "FastAPI",
    "Azure",
    "Firebase",
    "SQL",
    "PostgreSQL",
    "MongoDB",
    "REST API",
    "Git",
    "Docker",
    "Kubernetes",
    "CI/CD",
    "HTML",
    "CSS",
    "ETL",
    "TensorFlow",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "BSc", "MSc", "Bachelor", "Master", "PhD", "BS", "MS", "MBA", "BE", "ME", "Diploma",
];

const ROLE_SKILLS: &[(&str, &[&str])] = &[
    (
        "full-stack",
        &[
            "React",
            "Angular",
            "Vue",
            "Node.js",
            "Express",
            "Django",
            "FastAPI",
            "SQL",
            "PostgreSQL",
            "MongoDB",
            "REST API",
            "GraphQL",
            "Git",
            "Docker",
            "CI/CD",
            "HTML",
            "CSS",
            "TypeScript",
            "JavaScript",
        ],
    ),
    (
        "frontend",
        &[
            "React",
            "Angular",
            "Vue",
            "JavaScript",
            "TypeScript",
            "CSS",
            "HTML",
            "Tailwind",
            "SASS",
            "Responsive Design",
            "UI/UX",
        ],
    ),
    (
        "backend",
        &[
            "Python",
            "Java",
            "Node.js",
            "Django",
            "FastAPI",
            "Spring",
            "SQL",
            "PostgreSQL",
            "MongoDB",
            "REST API",
            "GraphQL",
            "Docker",
            "Redis",
        ],
    ),
    (
        "devops",
        &[
            "Docker",
            "Kubernetes",
            "Terraform",
            "CI/CD",
            "Azure",
            "AWS",
            "GCP",
            "Jenkins",
            "GitLab CI",
            "Prometheus",
            "Monitoring",
            "Linux",
        ],
    ),
    (
        "data engineer",
        &[
            "Python",
            "SQL",
            "PostgreSQL",
            "MongoDB",
            "ETL",
            "Airflow",
            "TensorFlow",
            "PyTorch",
            "scikit-learn",
            "Spark",
            "Hadoop",
            "Data Warehousing",
            "AWS S3",
            "GCP BigQuery",
        ],
    ),
    (
        "data scientist",
        &[
            "Python",
            "R",
            "Pandas",
            "NumPy",
            "SciPy",
            "Scikit-learn",
            "TensorFlow",
            "PyTorch",
            "Matplotlib",
            "Seaborn",
            "Machine Learning",
            "Deep Learning",
            "NLP",
            "Data Analysis",
        ],
    ),
    (
        "cloud",
        &[
            "Azure",
            "AWS",
            "GCP",
            "Docker",
            "Kubernetes",
            "Terraform",
            "Serverless",
            "Lambda",
            "CloudFormation",
            "CI/CD",
        ],
    ),
    (
        "mobile",
        &[
            "Flutter",
            "Kotlin",
            "Swift",
            "Dart",
            "React Native",
            "Android",
            "iOS",
            "Firebase",
            "REST API",
            "GraphQL",
            "Git",
        ],
    ),
    (
        "qa",
        &[
            "Selenium",
            "Postman",
            "JMeter",
            "Cypress",
            "Python",
            "Java",
            "Automation Testing",
            "Unit Testing",
            "Integration Testing",
            "Git",
        ],
    ),
];

/// A role-name substring and the skills it implies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSkills {
    pub role: String,
    pub skills: Vec<String>,
}

/// On-disk shape of a vocabulary file (`SKILL_VOCABULARY_PATH`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyFile {
    pub skills: Vec<String>,
    pub education: Vec<String>,
    #[serde(default)]
    pub roles: Vec<RoleSkills>,
}

/// The compiled vocabulary. Lists keep their declared order; matchers are
/// ASCII-case-insensitive substring scanners over the same lists.
pub struct SkillVocabulary {
    skills: Vec<String>,
    education: Vec<String>,
    roles: Vec<RoleSkills>,
    skill_matcher: AhoCorasick,
    education_matcher: AhoCorasick,
    role_matcher: AhoCorasick,
}

impl std::fmt::Debug for SkillVocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillVocabulary")
            .field("skills", &self.skills.len())
            .field("education", &self.education.len())
            .field("roles", &self.roles.len())
            .finish()
    }
}

impl SkillVocabulary {
    pub fn new(file: VocabularyFile) -> Result<Self> {
        let VocabularyFile {
            mut skills,
            mut education,
            mut roles,
        } = file;
        // matcher pattern ids index these lists, so empties are dropped up front
        skills.retain(|s| !s.is_empty());
        education.retain(|s| !s.is_empty());
        roles.retain(|r| !r.role.is_empty());

        let role_names: Vec<&str> = roles.iter().map(|r| r.role.as_str()).collect();

        Ok(Self {
            skill_matcher: build_matcher(&skills).context("compiling skill keywords")?,
            education_matcher: build_matcher(&education).context("compiling education keywords")?,
            role_matcher: build_matcher(&role_names).context("compiling role keys")?,
            skills,
            education,
            roles,
        })
    }

    /// The hand-curated vocabulary shipped with the service.
    pub fn builtin() -> Self {
        let file = VocabularyFile {
            skills: SKILL_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            education: EDUCATION_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            roles: ROLE_SKILLS
                .iter()
                .map(|(role, skills)| RoleSkills {
                    role: role.to_string(),
                    skills: skills.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        };
        // static, non-empty ASCII patterns: compilation cannot fail
        Self::new(file).unwrap_or_else(|e| unreachable!("builtin vocabulary: {e}"))
    }

    /// Loads a JSON vocabulary file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading vocabulary file {}", path.display()))?;
        let file: VocabularyFile = serde_json::from_str(&raw)
            .with_context(|| format!("parsing vocabulary file {}", path.display()))?;
        Self::new(file)
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn education(&self) -> &[String] {
        &self.education
    }

    pub fn roles(&self) -> &[RoleSkills] {
        &self.roles
    }

    /// Skill keywords appearing anywhere in `text`, in vocabulary order.
    pub fn match_skills(&self, text: &str) -> Vec<&str> {
        pick(&self.skills, matched_indices(&self.skill_matcher, text))
    }

    /// Education keywords appearing anywhere in `text`, in vocabulary order.
    pub fn match_education(&self, text: &str) -> Vec<&str> {
        pick(&self.education, matched_indices(&self.education_matcher, text))
    }

    /// Roles whose name appears in `text`, in table order.
    pub fn match_roles(&self, text: &str) -> Vec<&RoleSkills> {
        matched_indices(&self.role_matcher, text)
            .into_iter()
            .map(|i| &self.roles[i])
            .collect()
    }
}

fn build_matcher<S: AsRef<str>>(patterns: &[S]) -> Result<AhoCorasick> {
    let patterns: Vec<&str> = patterns.iter().map(|p| p.as_ref()).collect();
    Ok(AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(patterns)?)
}

/// Indices of every pattern occurring in `text`, overlaps included
/// ("Java" and "JavaScript" both hit on "JavaScript").
fn matched_indices(matcher: &AhoCorasick, text: &str) -> BTreeSet<usize> {
    matcher
        .find_overlapping_iter(text)
        .map(|m| m.pattern().as_usize())
        .collect()
}

fn pick(list: &[String], indices: BTreeSet<usize>) -> Vec<&str> {
    indices.into_iter().map(|i| list[i].as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sizes() {
        let v = SkillVocabulary::builtin();
        assert_eq!(v.skills().len(), 24);
        assert_eq!(v.education().len(), 11);
        assert_eq!(v.roles().len(), 9);
        assert_eq!(v.roles()[0].role, "full-stack");
    }

    #[test]
    fn test_skill_match_is_case_insensitive_and_canonical() {
        let v = SkillVocabulary::builtin();
        let hits = v.match_skills("worked with KUBERNETES and docker daily");
        assert_eq!(hits, vec!["Docker", "Kubernetes"]);
    }

    #[test]
    fn test_substring_semantics_catch_overlaps() {
        let v = SkillVocabulary::builtin();
        let hits = v.match_skills("Strong JavaScript background");
        assert_eq!(hits, vec!["JavaScript"]);
        let hits = v.match_skills("PostgreSQL tuning");
        assert_eq!(hits, vec!["SQL", "PostgreSQL"]);
    }

    #[test]
    fn test_education_substring_quirk_preserved() {
        let v = SkillVocabulary::builtin();
        // "ms" inside "systems" matches MS, as plain substring search does
        let hits = v.match_education("distributed systems");
        assert!(hits.contains(&"MS"));
    }

    #[test]
    fn test_role_match() {
        let v = SkillVocabulary::builtin();
        let roles: Vec<&str> = v
            .match_roles("Senior DevOps engineer moving into Cloud work")
            .iter()
            .map(|r| r.role.as_str())
            .collect();
        assert_eq!(roles, vec!["devops", "cloud"]);
    }

    #[test]
    fn test_no_match_on_unrelated_text() {
        let v = SkillVocabulary::builtin();
        assert!(v.match_roles("pastry chef").is_empty());
    }

    #[test]
    fn test_from_path_round_trip() {
        let file = VocabularyFile {
            skills: vec!["Rust".into(), "Tokio".into()],
            education: vec!["PhD".into()],
            roles: vec![RoleSkills {
                role: "systems".into(),
                skills: vec!["Rust".into(), "Linux".into()],
            }],
        };
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), serde_json::to_string(&file).unwrap()).unwrap();

        let v = SkillVocabulary::from_path(tmp.path()).unwrap();
        assert_eq!(v.match_skills("async rust with tokio"), vec!["Rust", "Tokio"]);
        assert_eq!(v.match_roles("Systems programmer").len(), 1);
    }

    #[test]
    fn test_from_path_rejects_bad_json() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "{not json").unwrap();
        assert!(SkillVocabulary::from_path(tmp.path()).is_err());
    }

    #[test]
    fn test_empty_patterns_are_dropped() {
        let v = SkillVocabulary::new(VocabularyFile {
            skills: vec!["".into(), "Go".into()],
            education: vec![],
            roles: vec![],
        })
        .unwrap();
        assert_eq!(v.skills(), &["Go".to_string()]);
        assert_eq!(v.match_skills("golang"), vec!["Go"]);
    }
}
