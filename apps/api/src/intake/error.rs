use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Terminal failures of the intake pipeline (stages 1–3).
///
/// Persistence failures are not represented here: they are `PersistenceWarning`s,
/// logged and dropped by the orchestrator.
#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    /// Malformed or missing submission fields. User-correctable.
    #[error("{0}")]
    Validation(String),

    /// Bytes are not a readable document of the declared type. User-correctable.
    #[error("{0}")]
    Extraction(String),

    /// Missing operator credential. Not user-correctable.
    #[error("{0}")]
    Configuration(String),

    /// Upstream generation failure or schema mismatch. Retry by resubmitting.
    #[error("{0}")]
    Generation(String),
}

/// Wire shape of a failed submission: `{error: true, code, message}`.
#[derive(Debug, Serialize)]
pub struct IntakeFailure {
    pub error: bool,
    pub code: &'static str,
    pub message: String,
}

impl IntakeError {
    pub fn code(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "VALIDATION_ERROR",
            IntakeError::Extraction(_) => "EXTRACTION_ERROR",
            IntakeError::Configuration(_) => "CONFIGURATION_ERROR",
            IntakeError::Generation(_) => "GENERATION_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IntakeError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            IntakeError::Generation(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn to_failure(&self) -> IntakeFailure {
        IntakeFailure {
            error: true,
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        match &self {
            IntakeError::Configuration(msg) => tracing::error!("Intake misconfigured: {msg}"),
            IntakeError::Generation(msg) => tracing::warn!("Intake generation failed: {msg}"),
            _ => {}
        }
        (self.status(), Json(self.to_failure())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_payload_shape() {
        let err = IntakeError::Validation("fileName must not be empty".into());
        let value = serde_json::to_value(err.to_failure()).unwrap();
        assert_eq!(value["error"], true);
        assert_eq!(value["code"], "VALIDATION_ERROR");
        assert_eq!(value["message"], "fileName must not be empty");
    }

    #[test]
    fn test_status_per_kind() {
        assert_eq!(
            IntakeError::Extraction(String::new()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            IntakeError::Configuration(String::new()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            IntakeError::Generation(String::new()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_into_response_keeps_status() {
        let response = IntakeError::Configuration("GEMINI_API_KEY is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
