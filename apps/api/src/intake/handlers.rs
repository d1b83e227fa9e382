//! Axum route handlers for resume intake.
//!
//! Both endpoints always answer with a structured body: the success payload,
//! or `{error: true, code, message}`. Malformed JSON is reported the same way.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::intake::error::IntakeError;
use crate::intake::pipeline::{IntakeMode, IntakeSuccess};
use crate::intake::validation::Submission;
use crate::session::Caller;
use crate::state::AppState;

/// POST /api/v1/apply
///
/// Scores the resume against the job and stores the outcome as a resume record.
/// Anonymous submissions are accepted.
pub async fn handle_apply(
    State(state): State<AppState>,
    caller: Option<Caller>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<IntakeSuccess>, IntakeError> {
    let submission = read_submission(payload)?;
    let success = state
        .intake
        .run(submission, caller.as_ref(), IntakeMode::Apply)
        .await?;
    Ok(Json(success))
}

/// POST /api/v1/upload
///
/// Scores the resume and generates questions without writing a resume record.
pub async fn handle_upload(
    State(state): State<AppState>,
    caller: Option<Caller>,
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Json<IntakeSuccess>, IntakeError> {
    let submission = read_submission(payload)?;
    let success = state
        .intake
        .run(submission, caller.as_ref(), IntakeMode::Preview)
        .await?;
    Ok(Json(success))
}

fn read_submission(
    payload: Result<Json<Submission>, JsonRejection>,
) -> Result<Submission, IntakeError> {
    payload.map(|Json(s)| s).map_err(|rejection| {
        IntakeError::Validation(format!(
            "No usable input data received: {}",
            rejection.body_text()
        ))
    })
}
