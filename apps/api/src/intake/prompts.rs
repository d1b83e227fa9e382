/// Number of interview questions requested per submission.
pub const QUESTION_COUNT: usize = 5;

/// Builds the match prompt. Both inputs are embedded verbatim, either may be empty.
pub fn build_match_prompt(resume_text: &str, job_description: &str) -> String {
    format!(
        "Generate a match score and {QUESTION_COUNT} short interview questions to test a \
         candidate's knowledge based on the following resume and job description.\n\
         The score is how well the resume fits the job, from 0 (no fit) to 100 (perfect fit).\n\
         <resume>\n{resume_text}\n</resume>\n\
         <job-description>\n{job_description}\n</job-description>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_inputs() {
        let prompt = build_match_prompt("Python Go", "Senior Go engineer");
        assert!(prompt.contains("<resume>\nPython Go\n</resume>"));
        assert!(prompt.contains("<job-description>\nSenior Go engineer\n</job-description>"));
        assert!(prompt.contains("5 short interview questions"));
    }

    #[test]
    fn test_prompt_with_empty_inputs_keeps_sections() {
        let prompt = build_match_prompt("", "");
        assert!(prompt.contains("<resume>\n\n</resume>"));
        assert!(prompt.contains("<job-description>\n\n</job-description>"));
    }

    #[test]
    fn test_braces_in_inputs_are_not_substituted() {
        let prompt = build_match_prompt("{job_description}", "x");
        assert!(prompt.contains("<resume>\n{job_description}\n</resume>"));
    }
}
