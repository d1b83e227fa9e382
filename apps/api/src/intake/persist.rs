//! Persistence Writer: stores the uploaded document and the resume record.
//!
//! Every failure in this stage is a `PersistenceWarning`. The orchestrator
//! logs it and still returns the computed match to the caller.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::intake::matching::{MatchResult, Question};
use crate::intake::validation::ACCEPTED_MIME_TYPE;

/// Where an upload's document lives: `key` in the bucket, `path` as shown to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLocation {
    pub key: String,
    pub path: String,
}

impl DocumentLocation {
    pub fn for_upload(upload_id: Uuid) -> Self {
        let key = format!("uploaded/{upload_id}/resume.pdf");
        Self {
            path: format!("/{key}"),
            key,
        }
    }
}

/// Object storage for uploaded documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()>;
}

/// Fields of a new `resumes` row.
#[derive(Debug, Clone)]
pub struct NewResumeRecord {
    pub file_name: String,
    pub path: String,
    pub score: u8,
    pub questions: Vec<Question>,
    /// Resolved to a user id at insert time; unknown emails leave the record unowned.
    pub owner_email: Option<String>,
    pub job_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
}

/// Write-once storage for resume records.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Inserts the record and returns its generated id.
    async fn create_resume(&self, record: &NewResumeRecord) -> Result<Uuid>;
}

#[derive(Debug, Error)]
pub enum PersistenceWarning {
    #[error("document could not be stored: {0:#}")]
    Document(anyhow::Error),

    #[error("{field} is not a valid identifier: '{value}'")]
    InvalidReference { field: &'static str, value: String },

    #[error("resume record could not be written: {0:#}")]
    Record(anyhow::Error),
}

/// Submission metadata the writer needs alongside the match.
pub struct PersistRequest<'a> {
    pub location: &'a DocumentLocation,
    pub document: Bytes,
    pub file_name: &'a str,
    pub owner_email: Option<&'a str>,
    pub job_id: Option<&'a str>,
    pub org_id: Option<&'a str>,
}

/// Stores the document only. Used by the preview flow, which writes no record.
pub async fn store_document(
    documents: &dyn DocumentStore,
    location: &DocumentLocation,
    document: Bytes,
) -> Result<(), PersistenceWarning> {
    documents
        .put(&location.key, document, ACCEPTED_MIME_TYPE)
        .await
        .map_err(PersistenceWarning::Document)
}

/// Stores the document, then writes the resume record.
///
/// The record is only written once the document is stored, so a record never
/// points at a missing file. References are checked before anything is written.
pub async fn persist_outcome(
    documents: &dyn DocumentStore,
    resumes: &dyn ResumeStore,
    outcome: &MatchResult,
    request: PersistRequest<'_>,
) -> Result<Uuid, PersistenceWarning> {
    let job_id = parse_reference("jobId", request.job_id)?;
    let organization_id = parse_reference("orgId", request.org_id)?;

    store_document(documents, request.location, request.document).await?;

    let record = NewResumeRecord {
        file_name: request.file_name.to_string(),
        path: request.location.path.clone(),
        score: outcome.score,
        questions: outcome.questions.clone(),
        owner_email: request.owner_email.map(str::to_string),
        job_id,
        organization_id,
    };

    resumes
        .create_resume(&record)
        .await
        .map_err(PersistenceWarning::Record)
}

fn parse_reference(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<Uuid>, PersistenceWarning> {
    value
        .map(|v| {
            Uuid::parse_str(v.trim()).map_err(|_| PersistenceWarning::InvalidReference {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

// ────────────────────────────────────────────────────────────────────────────
// Production stores
// ────────────────────────────────────────────────────────────────────────────

/// S3 / MinIO bucket holding uploaded documents.
pub struct S3DocumentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3DocumentStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded document to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// Owner lookup happens inside the insert: an unknown email yields NULL.
/// Emails compare case-insensitively, like `queries::FIND_USER_BY_EMAIL`.
pub const INSERT_RESUME: &str = r#"
    INSERT INTO resumes
        (id, file_name, path, score, questions, user_id, job_id, organization_id)
    VALUES ($1, $2, $3, $4, $5, (SELECT id FROM users WHERE lower(email) = lower($6)), $7, $8)
"#;

/// PostgreSQL `resumes` table.
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn create_resume(&self, record: &NewResumeRecord) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let questions =
            serde_json::to_value(&record.questions).context("Failed to serialize questions")?;

        sqlx::query(INSERT_RESUME)
        .bind(id)
        .bind(&record.file_name)
        .bind(&record.path)
        .bind(i32::from(record.score))
        .bind(&questions)
        .bind(record.owner_email.as_deref())
        .bind(record.job_id)
        .bind(record.organization_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}
