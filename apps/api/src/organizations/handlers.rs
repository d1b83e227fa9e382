//! Axum route handlers for organizations, jobs and candidate review.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::organization::{JobListingRow, JobRow, MemberRow, OrganizationRow};
use crate::models::resume::CandidateRow;
use crate::organizations::access::{
    authorize, job_in_organization, require_text, resolve_user, Role,
};
use crate::organizations::queries;
use crate::session::Caller;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddAdminRequest {
    pub user_email: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct OrganizationSummary {
    #[serde(flatten)]
    pub organization: OrganizationRow,
    pub members: Vec<MemberRow>,
    pub jobs: Vec<JobRow>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub organization: OrganizationRow,
    pub members: Vec<MemberRow>,
    pub jobs: Vec<JobRow>,
    pub resumes: Vec<CandidateRow>,
}

#[derive(Debug, Serialize)]
pub struct JobCandidatesResponse {
    pub job: JobRow,
    pub organization: OrganizationRow,
    pub candidates: Vec<CandidateRow>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/organizations
///
/// Creates an organization with the caller as its first admin.
pub async fn handle_create_organization(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationRow>), AppError> {
    let name = require_text("name", &request.name)?;
    let user = resolve_user(&state.db, &caller).await?;
    let organization = queries::create_organization(&state.db, &name, user.id).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

/// GET /api/v1/organizations
///
/// Organizations the caller belongs to, with members and jobs.
pub async fn handle_list_organizations(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<OrganizationSummary>>, AppError> {
    let user = resolve_user(&state.db, &caller).await?;
    let organizations = queries::list_organizations_for_user(&state.db, user.id).await?;
    let ids: Vec<Uuid> = organizations.iter().map(|o| o.id).collect();

    let members = queries::list_members(&state.db, &ids).await?;
    let jobs = queries::list_jobs(&state.db, &ids).await?;

    Ok(Json(group_by_organization(organizations, members, jobs)))
}

/// GET /api/v1/organizations/:org_id
pub async fn handle_get_organization(
    State(state): State<AppState>,
    caller: Caller,
    Path(org_id): Path<Uuid>,
) -> Result<Json<OrganizationDetail>, AppError> {
    let organization = queries::get_organization(&state.db, org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    authorize(&state.db, &caller, org_id, Role::Member).await?;

    let ids = [org_id];
    let members = queries::list_members(&state.db, &ids).await?;
    let jobs = queries::list_jobs(&state.db, &ids).await?;
    let resumes = queries::list_organization_resumes(&state.db, org_id).await?;

    Ok(Json(OrganizationDetail {
        organization,
        members,
        jobs,
        resumes,
    }))
}

/// POST /api/v1/organizations/:org_id/admins
///
/// Grants admin rights to an existing user. Admin only.
pub async fn handle_add_admin(
    State(state): State<AppState>,
    caller: Caller,
    Path(org_id): Path<Uuid>,
    Json(request): Json<AddAdminRequest>,
) -> Result<StatusCode, AppError> {
    authorize(&state.db, &caller, org_id, Role::Admin).await?;

    let target_email = require_text("user_email", &request.user_email)?;
    let target = queries::find_user_by_email(&state.db, &target_email)
        .await?
        .ok_or_else(|| AppError::NotFound("Target user not found".to_string()))?;

    queries::upsert_admin(&state.db, target.id, org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/organizations/:org_id/jobs
///
/// Posts a job. Admin only.
pub async fn handle_create_job(
    State(state): State<AppState>,
    caller: Caller,
    Path(org_id): Path<Uuid>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    authorize(&state.db, &caller, org_id, Role::Admin).await?;
    let title = require_text("title", &request.title)?;

    let job = queries::create_job(&state.db, org_id, &title, request.description.trim()).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// DELETE /api/v1/organizations/:org_id/jobs/:job_id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    caller: Caller,
    Path((org_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    authorize(&state.db, &caller, org_id, Role::Admin).await?;
    job_in_organization(&state.db, org_id, job_id).await?;

    queries::delete_job(&state.db, job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/organizations/:org_id
pub async fn handle_delete_organization(
    State(state): State<AppState>,
    caller: Caller,
    Path(org_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    authorize(&state.db, &caller, org_id, Role::Admin).await?;

    queries::delete_organization(&state.db, org_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs
///
/// Every open job, newest first. Any signed-in user may browse.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<JobListingRow>>, AppError> {
    resolve_user(&state.db, &caller).await?;
    Ok(Json(queries::list_job_board(&state.db).await?))
}

/// GET /api/v1/organizations/:org_id/jobs/:job_id/candidates
pub async fn handle_job_candidates(
    State(state): State<AppState>,
    caller: Caller,
    Path((org_id, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JobCandidatesResponse>, AppError> {
    authorize(&state.db, &caller, org_id, Role::Member).await?;
    let job = job_in_organization(&state.db, org_id, job_id).await?;
    let organization = queries::get_organization(&state.db, org_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

    let candidates = queries::list_job_candidates(&state.db, job_id).await?;

    Ok(Json(JobCandidatesResponse {
        job,
        organization,
        candidates,
    }))
}

/// Distributes members and jobs under their organizations, keeping input order.
fn group_by_organization(
    organizations: Vec<OrganizationRow>,
    members: Vec<MemberRow>,
    jobs: Vec<JobRow>,
) -> Vec<OrganizationSummary> {
    organizations
        .into_iter()
        .map(|organization| {
            let id = organization.id;
            OrganizationSummary {
                organization,
                members: members
                    .iter()
                    .filter(|m| m.organization_id == id)
                    .cloned()
                    .collect(),
                jobs: jobs
                    .iter()
                    .filter(|j| j.organization_id == id)
                    .cloned()
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn organization(name: &str) -> OrganizationRow {
        OrganizationRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn member(organization_id: Uuid, email: &str) -> MemberRow {
        MemberRow {
            user_id: Uuid::new_v4(),
            organization_id,
            email: email.to_string(),
            is_admin: true,
        }
    }

    fn job(organization_id: Uuid, title: &str) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            organization_id,
            title: title.to_string(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_organization() {
        let acme = organization("Acme");
        let globex = organization("Globex");
        let members = vec![
            member(acme.id, "a@acme.test"),
            member(globex.id, "g@globex.test"),
            member(acme.id, "b@acme.test"),
        ];
        let jobs = vec![job(globex.id, "SRE")];

        let grouped = group_by_organization(vec![acme.clone(), globex.clone()], members, jobs);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].organization.name, "Acme");
        let acme_emails: Vec<_> = grouped[0].members.iter().map(|m| m.email.as_str()).collect();
        assert_eq!(acme_emails, vec!["a@acme.test", "b@acme.test"]);
        assert!(grouped[0].jobs.is_empty());
        assert_eq!(grouped[1].jobs[0].title, "SRE");
    }

    #[test]
    fn test_summary_flattens_organization_fields() {
        let acme = organization("Acme");
        let summary = OrganizationSummary {
            organization: acme.clone(),
            members: vec![],
            jobs: vec![],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["name"], "Acme");
        assert_eq!(value["id"], acme.id.to_string());
        assert!(value["members"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_create_job_description_defaults_to_empty() {
        let request: CreateJobRequest = serde_json::from_str(r#"{"title": "SRE"}"#).unwrap();
        assert_eq!(request.description, "");
    }
}
