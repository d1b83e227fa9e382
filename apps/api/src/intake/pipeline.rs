//! Intake pipeline orchestration.
//!
//! Received → Validated → Extracted → Matched → Persisted (best effort) → Returned.
//! Stages run strictly forward and never retry one another. Any failure in
//! stages 1–3 ends the run with an `IntakeError`; stage 4 can only degrade the
//! response to `resumeId: null`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::intake::error::IntakeError;
use crate::intake::extract::{extract_text, DocumentParser};
use crate::intake::matching::{generate_match, Question};
use crate::intake::persist::{
    persist_outcome, store_document, DocumentLocation, DocumentStore, PersistRequest,
    ResumeStore,
};
use crate::intake::validation::{validate, Submission};
use crate::llm_client::StructuredGenerator;
use crate::session::Caller;

/// Whether a run writes a resume record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeMode {
    /// Candidate applies: the outcome is stored as a `ResumeRecord`.
    Apply,
    /// Score-only preview: the document is stored, no record is written.
    Preview,
}

/// Successful response payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSuccess {
    pub id: Uuid,
    pub path: String,
    pub score: u8,
    pub questions: Vec<Question>,
    pub job_id: Option<String>,
    pub org_id: Option<String>,
    pub resume_id: Option<Uuid>,
}

/// Collaborators of the pipeline. Cloned into every request via `AppState`.
#[derive(Clone)]
pub struct IntakePipeline {
    pub parser: Arc<dyn DocumentParser>,
    /// `None` when no generation credential is configured.
    pub generator: Option<Arc<dyn StructuredGenerator>>,
    pub documents: Arc<dyn DocumentStore>,
    pub resumes: Arc<dyn ResumeStore>,
    pub generation_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl IntakePipeline {
    pub async fn run(
        &self,
        submission: Submission,
        caller: Option<&Caller>,
        mode: IntakeMode,
    ) -> Result<IntakeSuccess, IntakeError> {
        let upload_id = Uuid::new_v4();
        info!(%upload_id, ?mode, file_name = %submission.file_name, "Received submission");

        // Stage 1: shape checks, before any decoding or I/O.
        let validated = validate(submission, self.max_upload_bytes)?;

        // The credential is checked before extraction so misconfiguration
        // surfaces without spending parse effort.
        let generator = self.generator.as_deref().ok_or_else(|| {
            IntakeError::Configuration(
                "GEMINI_API_KEY is required to generate structured match and questions."
                    .to_string(),
            )
        })?;

        let document = validated.decode_content(self.max_upload_bytes)?;

        // Stage 2
        let text = extract_text(self.parser.clone(), document.clone()).await?;
        info!(%upload_id, chars = text.len(), "Extracted document text");
        if text.is_empty() {
            warn!(%upload_id, "Document has no extractable text; matching against an empty resume");
        }

        // Stage 3
        let outcome = generate_match(
            generator,
            &text,
            validated.job_description(),
            self.generation_timeout,
        )
        .await?;
        info!(%upload_id, score = outcome.score, questions = outcome.questions.len(), "Match generated");

        // Stage 4: best effort. A warning is logged and dropped on purpose so the
        // caller still receives the computed match.
        let location = DocumentLocation::for_upload(upload_id);
        let resume_id = match mode {
            IntakeMode::Apply => {
                let request = PersistRequest {
                    location: &location,
                    document,
                    file_name: validated.file_name(),
                    owner_email: caller.map(Caller::email),
                    job_id: validated.job_id(),
                    org_id: validated.org_id(),
                };
                match persist_outcome(
                    self.documents.as_ref(),
                    self.resumes.as_ref(),
                    &outcome,
                    request,
                )
                .await
                {
                    Ok(resume_id) => {
                        info!(%upload_id, %resume_id, "Resume record stored");
                        Some(resume_id)
                    }
                    Err(warning) => {
                        warn!(%upload_id, "Failed to persist resume record: {warning}");
                        None
                    }
                }
            }
            IntakeMode::Preview => {
                if let Err(warning) =
                    store_document(self.documents.as_ref(), &location, document).await
                {
                    warn!(%upload_id, "Failed to store preview document: {warning}");
                }
                None
            }
        };

        let (job_id, org_id) = match mode {
            IntakeMode::Apply => (
                validated.job_id().map(str::to_string),
                validated.org_id().map(str::to_string),
            ),
            IntakeMode::Preview => (None, None),
        };

        Ok(IntakeSuccess {
            id: upload_id,
            path: location.path,
            score: outcome.score,
            questions: outcome.questions,
            job_id,
            org_id,
            resume_id,
        })
    }
}
