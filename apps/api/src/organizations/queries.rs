use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::organization::{
    JobListingRow, JobRow, MemberRow, MembershipRow, OrganizationRow,
};
use crate::models::resume::CandidateRow;
use crate::models::user::User;

const CANDIDATE_COLUMNS: &str = r#"
    r.id, r.file_name, r.path, r.score, r.questions, r.user_id,
    u.email AS user_email, r.job_id, r.organization_id, r.created_at
"#;

/// Emails are matched case-insensitively: users keep the casing they registered
/// with, callers may send any casing.
pub const FIND_USER_BY_EMAIL: &str =
    "SELECT id, email, created_at FROM users WHERE lower(email) = lower($1)";

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(FIND_USER_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_membership(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<Option<MembershipRow>, sqlx::Error> {
    sqlx::query_as::<_, MembershipRow>(
        r#"
        SELECT user_id, organization_id, is_admin
        FROM organization_users
        WHERE user_id = $1 AND organization_id = $2
        "#,
    )
    .bind(user_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

/// Creates the organization and makes `admin_id` its first admin, atomically.
pub async fn create_organization(
    pool: &PgPool,
    name: &str,
    admin_id: Uuid,
) -> Result<OrganizationRow, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let organization = sqlx::query_as::<_, OrganizationRow>(
        "INSERT INTO organizations (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO organization_users (user_id, organization_id, is_admin) VALUES ($1, $2, TRUE)",
    )
    .bind(admin_id)
    .bind(organization.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Created organization {} for user {admin_id}", organization.id);
    Ok(organization)
}

pub async fn get_organization(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Option<OrganizationRow>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationRow>(
        "SELECT id, name, created_at FROM organizations WHERE id = $1",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_organizations_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<OrganizationRow>, sqlx::Error> {
    sqlx::query_as::<_, OrganizationRow>(
        r#"
        SELECT o.id, o.name, o.created_at
        FROM organizations o
        JOIN organization_users ou ON ou.organization_id = o.id
        WHERE ou.user_id = $1
        ORDER BY o.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_members(
    pool: &PgPool,
    organization_ids: &[Uuid],
) -> Result<Vec<MemberRow>, sqlx::Error> {
    sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT ou.user_id, ou.organization_id, u.email, ou.is_admin
        FROM organization_users ou
        JOIN users u ON u.id = ou.user_id
        WHERE ou.organization_id = ANY($1)
        ORDER BY ou.is_admin DESC, u.email
        "#,
    )
    .bind(organization_ids)
    .fetch_all(pool)
    .await
}

pub async fn list_jobs(
    pool: &PgPool,
    organization_ids: &[Uuid],
) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, organization_id, title, description, created_at
        FROM jobs
        WHERE organization_id = ANY($1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(organization_ids)
    .fetch_all(pool)
    .await
}

/// Grants admin rights, adding the membership if it does not exist yet.
pub async fn upsert_admin(
    pool: &PgPool,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO organization_users (user_id, organization_id, is_admin)
        VALUES ($1, $2, TRUE)
        ON CONFLICT (user_id, organization_id) DO UPDATE SET is_admin = TRUE
        "#,
    )
    .bind(user_id)
    .bind(organization_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn create_job(
    pool: &PgPool,
    organization_id: Uuid,
    title: &str,
    description: &str,
) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, organization_id, title, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, organization_id, title, description, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(organization_id)
    .bind(title)
    .bind(description)
    .fetch_one(pool)
    .await
}

pub async fn find_job(pool: &PgPool, job_id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        "SELECT id, organization_id, title, description, created_at FROM jobs WHERE id = $1",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await
}

/// Deletes a job; its resumes go with it (ON DELETE CASCADE).
pub async fn delete_job(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;
    info!("Deleted job {job_id}");
    Ok(())
}

/// Deletes an organization; memberships, jobs and resumes cascade.
pub async fn delete_organization(pool: &PgPool, organization_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM organizations WHERE id = $1")
        .bind(organization_id)
        .execute(pool)
        .await?;
    info!("Deleted organization {organization_id}");
    Ok(())
}

pub async fn list_job_board(pool: &PgPool) -> Result<Vec<JobListingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobListingRow>(
        r#"
        SELECT j.id, j.organization_id, o.name AS organization_name,
               j.title, j.description, j.created_at
        FROM jobs j
        JOIN organizations o ON o.id = j.organization_id
        ORDER BY j.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_organization_resumes(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(&format!(
        r#"
        SELECT {CANDIDATE_COLUMNS}
        FROM resumes r
        LEFT JOIN users u ON u.id = r.user_id
        WHERE r.organization_id = $1
        ORDER BY r.created_at DESC
        "#
    ))
    .bind(organization_id)
    .fetch_all(pool)
    .await
}

/// Candidates for one job, best score first.
pub async fn list_job_candidates(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(&format!(
        r#"
        SELECT {CANDIDATE_COLUMNS}
        FROM resumes r
        LEFT JOIN users u ON u.id = r.user_id
        WHERE r.job_id = $1
        ORDER BY r.score DESC, r.created_at
        "#
    ))
    .bind(job_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::persist::INSERT_RESUME;

    /// Both identity lookups must agree on how emails compare.
    #[test]
    fn test_email_lookups_ignore_case() {
        assert!(FIND_USER_BY_EMAIL.contains("lower(email) = lower($1)"));
        assert!(INSERT_RESUME.contains("(SELECT id FROM users WHERE lower(email) = lower($6))"));
        assert!(!FIND_USER_BY_EMAIL.contains("WHERE email ="));
    }
}
