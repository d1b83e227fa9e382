use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored resume outcome joined with its owner's email (if any).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub file_name: String,
    pub path: String,
    pub score: i32,
    pub questions: Value,
    pub user_id: Option<Uuid>,
    pub user_email: Option<String>,
    pub job_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
