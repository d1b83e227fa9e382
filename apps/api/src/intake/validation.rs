//! Input Validator: shape checks on a submission before any decoding or I/O.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;

use crate::intake::error::IntakeError;

/// The only document type accepted for upload.
pub const ACCEPTED_MIME_TYPE: &str = "application/pdf";

/// Encoded payloads shorter than this cannot hold a document.
pub const MIN_ENCODED_LEN: usize = 20;

/// One candidate's resume upload as received over the wire.
/// Missing fields deserialize to empty strings so the validator, not serde,
/// reports which constraint failed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub content_base64: String,
    pub job_description: Option<String>,
    pub job_id: Option<String>,
    pub org_id: Option<String>,
}

/// A submission that passed every shape check. Only `validate` builds one.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    file_name: String,
    content_base64: String,
    job_description: String,
    job_id: Option<String>,
    org_id: Option<String>,
}

impl ValidatedSubmission {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Empty when the submission carried no description.
    pub fn job_description(&self) -> &str {
        &self.job_description
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job_id.as_deref()
    }

    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    /// Decodes the base64 payload, tolerating line breaks from browser or CLI encoders.
    pub fn decode_content(&self, max_bytes: usize) -> Result<Bytes, IntakeError> {
        let compact: String = self
            .content_base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let decoded = STANDARD.decode(compact.as_bytes()).map_err(|e| {
            IntakeError::Validation(format!("contentBase64 is not valid base64: {e}"))
        })?;
        if decoded.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        Ok(Bytes::from(decoded))
    }
}

/// Checks a submission's shape and returns the first violated constraint.
pub fn validate(
    submission: Submission,
    max_bytes: usize,
) -> Result<ValidatedSubmission, IntakeError> {
    let Submission {
        file_name,
        mime_type,
        content_base64,
        job_description,
        job_id,
        org_id,
    } = submission;

    if file_name.trim().is_empty() {
        return Err(IntakeError::Validation(
            "fileName must not be empty".to_string(),
        ));
    }

    if !mime_type.eq_ignore_ascii_case(ACCEPTED_MIME_TYPE) {
        return Err(IntakeError::Validation(format!(
            "mimeType must be {ACCEPTED_MIME_TYPE}, got '{mime_type}'"
        )));
    }

    if content_base64.len() < MIN_ENCODED_LEN {
        return Err(IntakeError::Validation(format!(
            "contentBase64 must be at least {MIN_ENCODED_LEN} characters"
        )));
    }

    // Whitespace is ignored by the decoder, so only count significant characters.
    let significant = content_base64
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .count();
    if significant > max_encoded_len(max_bytes) {
        return Err(too_large(max_bytes));
    }

    Ok(ValidatedSubmission {
        file_name,
        content_base64,
        job_description: job_description.unwrap_or_default(),
        job_id: non_blank(job_id),
        org_id: non_blank(org_id),
    })
}

/// Longest padded base64 encoding of a `max_bytes` payload.
fn max_encoded_len(max_bytes: usize) -> usize {
    max_bytes.div_ceil(3) * 4
}

fn too_large(max_bytes: usize) -> IntakeError {
    IntakeError::Validation(format!("document exceeds the {max_bytes} byte upload limit"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
