//! Match Generator: scores a resume against a job description and produces
//! interview questions through the structured-generation service.
//!
//! One set of bounds drives both the JSON schema sent to the service and the
//! validation applied to its answer, so the two cannot drift apart.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::intake::error::IntakeError;
use crate::intake::prompts::build_match_prompt;
use crate::llm_client::{strip_json_fences, StructuredGenerator};

pub const SCORE_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const CONFIDENCE_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// A generated interview question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Score and questions computed for one submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Rounded to the nearest integer, always within 0–100.
    pub score: u8,
    /// In the order the service returned them.
    pub questions: Vec<Question>,
}

/// First place where a parsed response departs from `response_schema()`.
#[derive(Debug, Error, PartialEq)]
#[error("{path}: {problem}")]
pub struct SchemaViolation {
    pub path: String,
    pub problem: String,
}

fn violation(path: impl Into<String>, problem: impl Into<String>) -> SchemaViolation {
    SchemaViolation {
        path: path.into(),
        problem: problem.into(),
    }
}

/// JSON schema declared to the service as the required response shape.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "score": {
                "type": "number",
                "minimum": SCORE_RANGE.start(),
                "maximum": SCORE_RANGE.end(),
            },
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" },
                        "topic": { "type": "string" },
                        "confidence": {
                            "type": "number",
                            "minimum": CONFIDENCE_RANGE.start(),
                            "maximum": CONFIDENCE_RANGE.end(),
                        },
                    },
                    "required": ["text"],
                },
            },
        },
        "required": ["score", "questions"],
    })
}

/// Wire shape of the service's answer, before range checks.
#[derive(Debug, Deserialize)]
struct RawMatch {
    score: f64,
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    text: String,
    #[serde(default, deserialize_with = "present")]
    topic: Option<String>,
    #[serde(default, deserialize_with = "present")]
    confidence: Option<f64>,
}

/// An optional field that, when present, must hold a value: `null` is a type error.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Checks a parsed response against `response_schema()` and builds the result.
/// Nothing is coerced: a wrong type or out-of-range number is a violation.
/// Unknown properties are ignored.
pub fn validate_match_output(value: &Value) -> Result<MatchResult, SchemaViolation> {
    if !value.is_object() {
        return Err(violation("$", "expected an object"));
    }
    let raw = RawMatch::deserialize(value).map_err(|e| violation("$", e.to_string()))?;

    check_range("$.score", raw.score, &SCORE_RANGE)?;

    let questions = raw
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| -> Result<Question, SchemaViolation> {
            if let Some(confidence) = q.confidence {
                check_range(
                    &format!("$.questions[{i}].confidence"),
                    confidence,
                    &CONFIDENCE_RANGE,
                )?;
            }
            Ok(Question {
                text: q.text,
                topic: q.topic,
                confidence: q.confidence,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MatchResult {
        score: raw.score.round() as u8,
        questions,
    })
}

fn check_range(
    path: &str,
    number: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), SchemaViolation> {
    if !range.contains(&number) {
        return Err(violation(
            path,
            format!("{number} is outside {}..={}", range.start(), range.end()),
        ));
    }
    Ok(())
}

/// Runs one structured-generation call and validates the answer.
///
/// Empty `resume_text` or `job_description` still produce a call. No retries:
/// every failure is wrapped as `IntakeError::Generation` with context.
pub async fn generate_match(
    generator: &dyn StructuredGenerator,
    resume_text: &str,
    job_description: &str,
    timeout: Duration,
) -> Result<MatchResult, IntakeError> {
    let prompt = build_match_prompt(resume_text, job_description);
    let schema = response_schema();

    let raw = tokio::time::timeout(timeout, generator.generate(&prompt, &schema))
        .await
        .map_err(|_| {
            IntakeError::Generation(format!(
                "Structured generation timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| IntakeError::Generation(format!("Structured generation failed: {e}")))?;

    let body = strip_json_fences(&raw);
    if body.is_empty() {
        return Err(IntakeError::Generation(
            "Structured generation returned empty output".to_string(),
        ));
    }

    let parsed: Value = serde_json::from_str(body).map_err(|e| {
        IntakeError::Generation(format!("Structured generation returned invalid JSON: {e}"))
    })?;

    validate_match_output(&parsed).map_err(|e| {
        IntakeError::Generation(format!(
            "Structured generation response did not match the expected schema: {e}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm_client::LlmError;

    /// Returns a canned answer and remembers what it was asked.
    struct CannedGenerator {
        answer: Result<String, u16>,
        seen: Mutex<Vec<(String, Value)>>,
    }

    impl CannedGenerator {
        fn ok(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn api_error(status: u16) -> Self {
            Self {
                answer: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl StructuredGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, LlmError> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), schema.clone()));
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "quota exceeded".to_string(),
                }),
            }
        }
    }

    struct StalledGenerator;

    #[async_trait]
    impl StructuredGenerator for StalledGenerator {
        async fn generate(&self, _prompt: &str, _schema: &Value) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("{}".to_string())
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn generation_message(result: Result<MatchResult, IntakeError>) -> String {
        match result {
            Err(IntakeError::Generation(msg)) => msg,
            other => panic!("expected a generation error, got {other:?}"),
        }
    }

    #[test]
    fn test_schema_bounds_match_validation_ranges() {
        let schema = response_schema();
        assert_eq!(schema["properties"]["score"]["maximum"], 100.0);
        assert_eq!(
            schema["properties"]["questions"]["items"]["properties"]["confidence"]["maximum"],
            1.0
        );
        assert_eq!(schema["required"], json!(["score", "questions"]));
    }

    #[test]
    fn test_validate_rounds_score() {
        let result = validate_match_output(&json!({"score": 87.6, "questions": []})).unwrap();
        assert_eq!(result.score, 88);
        let result = validate_match_output(&json!({"score": 87.5, "questions": []})).unwrap();
        assert_eq!(result.score, 88);
        let result = validate_match_output(&json!({"score": 0.4, "questions": []})).unwrap();
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_validate_accepts_bounds() {
        assert_eq!(
            validate_match_output(&json!({"score": 100, "questions": []}))
                .unwrap()
                .score,
            100
        );
        let result = validate_match_output(&json!({
            "score": 0,
            "questions": [{"text": "q", "confidence": 0}, {"text": "r", "confidence": 1}]
        }))
        .unwrap();
        assert_eq!(result.questions[1].confidence, Some(1.0));
    }

    #[test]
    fn test_validate_preserves_question_order_and_optionals() {
        let result = validate_match_output(&json!({
            "score": 50,
            "questions": [
                {"text": "first", "topic": "rust", "confidence": 0.5},
                {"text": "second"},
                {"text": "third", "extra": "ignored"}
            ]
        }))
        .unwrap();
        let texts: Vec<_> = result.questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(result.questions[0].topic.as_deref(), Some("rust"));
        assert_eq!(result.questions[1].topic, None);
        assert_eq!(result.questions[1].confidence, None);
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let err = validate_match_output(&json!({"score": 101, "questions": []})).unwrap_err();
        assert_eq!(err.path, "$.score");
        assert!(validate_match_output(&json!({"score": -1, "questions": []})).is_err());
    }

    #[test]
    fn test_validate_rejects_string_score() {
        let err = validate_match_output(&json!({"score": "72", "questions": []})).unwrap_err();
        assert_eq!(err.path, "$");
        assert!(err.problem.contains("invalid type: string"));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let problem = |value: Value| validate_match_output(&value).unwrap_err().problem;
        assert!(problem(json!({"questions": []})).contains("missing field `score`"));
        assert!(problem(json!({"score": 10})).contains("missing field `questions`"));
        assert!(problem(json!({"score": 10, "questions": [{"topic": "x"}]}))
            .contains("missing field `text`"));
    }

    #[test]
    fn test_validate_rejects_bad_question_fields() {
        let err = validate_match_output(&json!({
            "score": 10,
            "questions": [{"text": "ok"}, {"text": "bad", "confidence": 1.5}]
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.questions[1].confidence");

        let err = validate_match_output(&json!({
            "score": 10,
            "questions": [{"text": "bad", "topic": null}]
        }))
        .unwrap_err();
        assert!(err.problem.contains("invalid type: null"));

        let err = validate_match_output(&json!({
            "score": 10,
            "questions": [{"text": "bad", "confidence": null}]
        }))
        .unwrap_err();
        assert!(err.problem.contains("invalid type: null"));

        let err = validate_match_output(&json!({"score": 10, "questions": ["plain string"]}))
            .unwrap_err();
        assert!(err.problem.contains("invalid type: string"));
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate_match_output(&json!([50, []])).unwrap_err();
        assert_eq!(err.path, "$");
        assert_eq!(err.problem, "expected an object");
    }

    #[tokio::test]
    async fn test_generate_match_declares_schema_and_prompt() {
        let generator = CannedGenerator::ok(
            r#"{"score":72,"questions":[{"text":"Describe goroutines","topic":"concurrency","confidence":0.9}]}"#,
        );
        let result = generate_match(&generator, "Python Go", "Senior Go engineer", TIMEOUT)
            .await
            .unwrap();

        assert_eq!(result.score, 72);
        assert_eq!(
            result.questions,
            vec![Question {
                text: "Describe goroutines".to_string(),
                topic: Some("concurrency".to_string()),
                confidence: Some(0.9),
            }]
        );

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("Python Go"));
        assert!(seen[0].0.contains("Senior Go engineer"));
        assert_eq!(seen[0].1, response_schema());
    }

    #[tokio::test]
    async fn test_generate_match_calls_service_for_empty_description() {
        let generator = CannedGenerator::ok(r#"{"score": 3, "questions": []}"#);
        let result = generate_match(&generator, "", "", TIMEOUT).await.unwrap();
        assert_eq!(result.score, 3);
        assert_eq!(generator.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_match_strips_code_fences() {
        let generator = CannedGenerator::ok("```json\n{\"score\": 40.2, \"questions\": []}\n```");
        let result = generate_match(&generator, "a", "b", TIMEOUT).await.unwrap();
        assert_eq!(result.score, 40);
    }

    #[tokio::test]
    async fn test_generate_match_wraps_upstream_error() {
        let generator = CannedGenerator::api_error(429);
        let msg = generation_message(generate_match(&generator, "a", "b", TIMEOUT).await);
        assert!(msg.starts_with("Structured generation failed"));
        assert!(msg.contains("429"));
    }

    #[tokio::test]
    async fn test_generate_match_rejects_empty_output() {
        let generator = CannedGenerator::ok("   ");
        let msg = generation_message(generate_match(&generator, "a", "b", TIMEOUT).await);
        assert!(msg.contains("empty output"));
    }

    #[tokio::test]
    async fn test_generate_match_rejects_invalid_json() {
        let generator = CannedGenerator::ok("score: 72");
        let msg = generation_message(generate_match(&generator, "a", "b", TIMEOUT).await);
        assert!(msg.contains("invalid JSON"));
    }

    #[tokio::test]
    async fn test_generate_match_rejects_schema_mismatch() {
        let generator = CannedGenerator::ok(r#"{"score": 150, "questions": []}"#);
        let msg = generation_message(generate_match(&generator, "a", "b", TIMEOUT).await);
        assert!(msg.contains("$.score"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_match_times_out() {
        let msg = generation_message(
            generate_match(&StalledGenerator, "a", "b", Duration::from_secs(30)).await,
        );
        assert!(msg.contains("timed out after 30s"));
    }
}
