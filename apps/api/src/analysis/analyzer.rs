//! Resume analysis through the remote text generator.
//!
//! Never fails: generator problems come back as an `Analysis` with `error`
//! set, unparseable output as a fallback carrying `raw_text`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::analysis::prompts::build_analysis_prompt;
use crate::llm_client::prompts::{truncate_chars, JSON_ONLY_SYSTEM};
use crate::llm_client::{parse_json_output, LlmClient, LlmError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub keywords_to_add: Vec<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: u32,
    #[serde(
        default,
        deserialize_with = "lenient_percentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub match_percentage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

/// Reads a 0..=100 value from a number or a numeric string, rounding and
/// clamping. Anything else reads as absent instead of failing the object.
fn percentage_from(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }?;
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u32)
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(percentage_from(&value).unwrap_or_default())
}

fn lenient_percentage<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(percentage_from(&value))
}

pub async fn analyze(llm: &LlmClient, resume_text: &str, job_description: Option<&str>) -> Analysis {
    let prompt = build_analysis_prompt(resume_text, job_description);
    interpret(llm.generate(&prompt, JSON_ONLY_SYSTEM).await)
}

/// Turns a generator result into an analysis.
pub fn interpret(result: Result<String, LlmError>) -> Analysis {
    match result {
        Ok(text) => match parse_json_output::<Analysis>(&text) {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(
                    "Failed to parse generator output: {e}. Raw: {}...",
                    truncate_chars(&text, 100)
                );
                Analysis {
                    summary: "Could not parse AI analysis.".to_string(),
                    suggestions: vec![
                        "AI response format error. Please try again or check the text generator."
                            .to_string(),
                    ],
                    raw_text: Some(text),
                    ..Analysis::default()
                }
            }
        },
        Err(LlmError::Unreachable(url)) => Analysis {
            error: Some(format!(
                "Text generator is not reachable at {url}. Start it (e.g. 'ollama serve') and retry."
            )),
            ..Analysis::default()
        },
        Err(e) => {
            warn!("Resume analysis failed: {e}");
            Analysis {
                error: Some(format!("Analysis failed: {e}")),
                ..Analysis::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_output_is_parsed() {
        let raw = r#"{"summary":"Solid backend engineer","strengths":["Rust"],"score":82,"match_percentage":70}"#;
        let a = interpret(Ok(raw.to_string()));
        assert_eq!(a.summary, "Solid backend engineer");
        assert_eq!(a.strengths, vec!["Rust"]);
        assert_eq!(a.score, 82);
        assert_eq!(a.match_percentage, Some(70));
        assert!(a.weaknesses.is_empty());
        assert!(a.error.is_none());
    }

    #[test]
    fn test_fenced_output_with_out_of_range_score() {
        let raw = "```json\n{\"summary\":\"ok\",\"score\":140}\n```";
        assert_eq!(interpret(Ok(raw.to_string())).score, 100);
    }

    #[test]
    fn test_fractional_score_is_rounded() {
        let raw = r#"{"summary":"Strong backend engineer","strengths":["Rust"],"score":78.5,"match_percentage":64.4}"#;
        let a = interpret(Ok(raw.to_string()));
        assert_eq!(a.summary, "Strong backend engineer");
        assert_eq!(a.strengths, vec!["Rust"]);
        assert_eq!(a.score, 79);
        assert_eq!(a.match_percentage, Some(64));
        assert!(a.raw_text.is_none());
    }

    #[test]
    fn test_negative_score_clamps_to_zero() {
        let a = interpret(Ok(r#"{"summary":"Weak fit","score":-12,"match_percentage":-3}"#.to_string()));
        assert_eq!(a.summary, "Weak fit");
        assert_eq!(a.score, 0);
        assert_eq!(a.match_percentage, Some(0));
    }

    #[test]
    fn test_quoted_scores_are_accepted() {
        let a = interpret(Ok(r#"{"summary":"Good","score":"80","match_percentage":"75%"}"#.to_string()));
        assert_eq!(a.summary, "Good");
        assert_eq!(a.score, 80);
        assert_eq!(a.match_percentage, Some(75));
    }

    #[test]
    fn test_unreadable_score_keeps_the_analysis() {
        let a = interpret(Ok(r#"{"summary":"Good","score":"high","match_percentage":null}"#.to_string()));
        assert_eq!(a.summary, "Good");
        assert_eq!(a.score, 0);
        assert_eq!(a.match_percentage, None);
        assert!(a.raw_text.is_none());
    }

    #[test]
    fn test_non_json_output_falls_back_with_raw_text() {
        let a = interpret(Ok("I think this resume is great".to_string()));
        assert_eq!(a.summary, "Could not parse AI analysis.");
        assert_eq!(a.score, 0);
        assert_eq!(a.raw_text.as_deref(), Some("I think this resume is great"));
    }

    #[test]
    fn test_unreachable_generator_sets_error() {
        let a = interpret(Err(LlmError::Unreachable("http://localhost:11434".into())));
        let msg = a.error.unwrap();
        assert!(msg.contains("not reachable"));
        assert!(msg.contains("http://localhost:11434"));
    }

    #[test]
    fn test_other_failures_set_error() {
        let a = interpret(Err(LlmError::Api {
            status: 503,
            message: "busy".into(),
        }));
        assert!(a.error.unwrap().starts_with("Analysis failed"));
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let json = serde_json::to_value(Analysis::default()).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("raw_text").is_none());
        assert_eq!(json["score"], 0);
    }
}
