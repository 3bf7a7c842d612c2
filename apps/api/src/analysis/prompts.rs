use crate::llm_client::prompts::truncate_chars;

/// Resume text beyond this is cut before prompting.
pub const MAX_RESUME_CHARS: usize = 4000;
pub const MAX_JD_CHARS: usize = 2000;

/// Builds the resume-coach prompt. With a job description the model compares
/// against it; without one it gives a general critique.
pub fn build_analysis_prompt(resume_text: &str, job_description: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert resume coach. Analyze the following resume.\n\n\
         RESUME TEXT:\n{}\n\n",
        truncate_chars(resume_text, MAX_RESUME_CHARS)
    );

    match job_description {
        Some(jd) => prompt.push_str(&format!(
            "JOB DESCRIPTION:\n{}\n\n\
             Task: Compare the resume against this job description.\n\n",
            truncate_chars(jd, MAX_JD_CHARS)
        )),
        None => prompt.push_str("Task: Provide a general critique of this resume.\n\n"),
    }

    prompt.push_str(
        r#"Respond with a JSON object of exactly this shape:
{
    "summary": "2-3 sentence professional summary of the candidate",
    "strengths": ["3-5 key strengths"],
    "weaknesses": ["3-5 areas for improvement"],
    "suggestions": ["3-5 actionable tips to improve the resume"],
    "keywords_to_add": ["keywords missing from the resume"],
    "score": 75,
    "match_percentage": 60
}
"score" is an integer 0-100 rating quality (or fit, when a job description is given).
"match_percentage" is only present when a job description is given."#,
    );
    prompt
}
