//! Named-entity recognition behind a trait, with a rule-based default.
//!
//! Labels follow the common OntoNotes names. The extractor only cares about
//! four of them: ORG / WORK_OF_ART feed experience, FAC / GPE feed education.
//! That mapping is a coarse heuristic, not a semantic one.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Org,
    WorkOfArt,
    Fac,
    Gpe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub text: String,
    pub label: EntityLabel,
}

/// Entity recognizer backend. Held by the engine as `Arc<dyn EntityRecognizer>`.
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Entities in order of appearance. Duplicates are allowed.
    fn recognize(&self, text: &str) -> Vec<NamedEntity>;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedRecognizer
// ────────────────────────────────────────────────────────────────────────────

const ORG_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "llc",
    "llp",
    "ltd",
    "limited",
    "corp",
    "corporation",
    "co",
    "company",
    "gmbh",
    "plc",
    "ag",
    "technologies",
    "technology",
    "labs",
    "solutions",
    "systems",
    "group",
    "software",
    "consulting",
    "bank",
    "partners",
    "ventures",
    "studios",
    "agency",
    "foundation",
];

const INSTITUTION_WORDS: &[&str] = &[
    "university",
    "college",
    "institute",
    "school",
    "academy",
    "polytechnic",
    "conservatory",
    "campus",
];

const GPE_NAMES: &[&str] = &[
    "afghanistan", "argentina", "australia", "austria", "bangladesh", "belgium", "brazil",
    "canada", "chile", "china", "colombia", "denmark", "egypt", "england", "estonia", "ethiopia",
    "finland", "france", "germany", "ghana", "greece", "hong kong", "india", "indonesia",
    "ireland", "israel", "italy", "japan", "kenya", "korea", "malaysia", "mexico", "morocco",
    "nepal", "netherlands", "new zealand", "nigeria", "norway", "pakistan", "peru",
    "philippines", "poland", "portugal", "romania", "russia", "saudi arabia", "scotland",
    "singapore", "south africa", "south korea", "spain", "sri lanka", "sweden", "switzerland",
    "taiwan", "thailand", "turkey", "uganda", "ukraine", "united arab emirates",
    "united kingdom", "united states", "usa", "uk", "uae", "vietnam", "wales",
    "amsterdam", "atlanta", "austin", "bangalore", "bengaluru", "berlin", "boston", "cairo",
    "chennai", "chicago", "delhi", "new delhi", "dhaka", "dubai", "dublin", "hyderabad",
    "istanbul", "karachi", "lagos", "lahore", "lisbon", "london", "los angeles", "madrid",
    "manchester", "melbourne", "mumbai", "munich", "nairobi", "new york", "paris", "pune",
    "san francisco", "seattle", "seoul", "shanghai", "sydney", "tokyo", "toronto",
    "vancouver", "zurich", "california", "texas", "washington", "florida", "ontario",
];

/// Words that may sit inside a multi-word name without being capitalized.
const CONNECTORS: &[&str] = &["of", "and", "for", "the", "&", "de"];

static ORG_SUFFIX_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| ORG_SUFFIXES.iter().copied().collect());
static INSTITUTION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| INSTITUTION_WORDS.iter().copied().collect());
static GPE_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| GPE_NAMES.iter().copied().collect());

/// Runs of capitalized words (plus connectors) on a single line.
static CAPITALIZED_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][\w&.'-]*(?:[ \t]+(?:of|and|for|the|&|de|[A-Z][\w&.'-]*))*")
        .unwrap_or_else(|e| unreachable!("span pattern: {e}"))
});

/// Quoted capitalized titles: "Deep Work", “Clean Code”.
static QUOTED_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["“]([A-Z][^"”\n]{2,80})["”]"#)
        .unwrap_or_else(|e| unreachable!("title pattern: {e}"))
});

/// Heuristic recognizer: capitalized spans classified by organization
/// suffixes, education-institution words, and a geo-political gazetteer;
/// quoted capitalized titles become works of art. Spans that fit none of
/// these are dropped.
#[derive(Debug, Default, Clone)]
pub struct RuleBasedRecognizer;

impl RuleBasedRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn recognize(&self, text: &str) -> Vec<NamedEntity> {
        let mut found: Vec<(usize, NamedEntity)> = Vec::new();

        for caps in QUOTED_TITLE.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let title = m.as_str().trim();
                if !title.is_empty() {
                    found.push((
                        m.start(),
                        NamedEntity {
                            text: title.to_string(),
                            label: EntityLabel::WorkOfArt,
                        },
                    ));
                }
            }
        }

        for m in CAPITALIZED_SPAN.find_iter(text) {
            let span = clean_span(m.as_str());
            if span.is_empty() {
                continue;
            }
            if let Some(label) = classify(span) {
                found.push((
                    m.start(),
                    NamedEntity {
                        text: span.to_string(),
                        label,
                    },
                ));
            }
        }

        found.sort_by_key(|(pos, _)| *pos);
        found.into_iter().map(|(_, e)| e).collect()
    }
}

/// Drops trailing connectors and trailing punctuation ("University of", "Google.").
fn clean_span(span: &str) -> &str {
    let mut span = span.trim_end_matches(|c: char| matches!(c, '.' | ',' | '\'' | '-'));
    loop {
        let trimmed = span.trim_end();
        match trimmed.rsplit_once(|c: char| c == ' ' || c == '\t') {
            Some((head, last)) if CONNECTORS.contains(&last) => {
                span = head.trim_end_matches(|c: char| matches!(c, '.' | ',' | '\'' | '-'));
            }
            _ => return trimmed,
        }
    }
}

fn classify(span: &str) -> Option<EntityLabel> {
    let lower = span.to_lowercase();
    let words: Vec<&str> = lower
        .split_whitespace()
        .map(|w| w.trim_end_matches('.'))
        .collect();

    if words.iter().any(|w| INSTITUTION_SET.contains(w)) {
        return Some(EntityLabel::Fac);
    }
    // a lone suffix ("Labs", "Group") is not a name
    if words.len() > 1 && words.last().is_some_and(|w| ORG_SUFFIX_SET.contains(w)) {
        return Some(EntityLabel::Org);
    }
    if GPE_SET.contains(lower.trim_end_matches('.')) {
        return Some(EntityLabel::Gpe);
    }
    None
}
