use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::organization::{JobRow, MembershipRow};
use crate::models::user::User;
use crate::organizations::queries::{find_job, find_membership, find_user_by_email};
use crate::session::Caller;

/// Minimum membership level an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Member,
    Admin,
}

/// Resolves the caller to a registered user.
pub async fn resolve_user(pool: &PgPool, caller: &Caller) -> Result<User, AppError> {
    find_user_by_email(pool, caller.email())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Resolves the caller and checks their membership in `organization_id`.
pub async fn authorize(
    pool: &PgPool,
    caller: &Caller,
    organization_id: Uuid,
    required: Role,
) -> Result<User, AppError> {
    let user = resolve_user(pool, caller).await?;
    let membership = find_membership(pool, user.id, organization_id).await?;
    check_role(membership.as_ref(), required)?;
    Ok(user)
}

pub fn check_role(membership: Option<&MembershipRow>, required: Role) -> Result<(), AppError> {
    match membership {
        None => Err(AppError::Forbidden(
            "Not a member of this organization".to_string(),
        )),
        Some(m) if required == Role::Admin && !m.is_admin => {
            Err(AppError::Forbidden("Not authorized".to_string()))
        }
        Some(_) => Ok(()),
    }
}

/// Loads a job and checks it belongs to `organization_id`.
pub async fn job_in_organization(
    pool: &PgPool,
    organization_id: Uuid,
    job_id: Uuid,
) -> Result<JobRow, AppError> {
    let job = find_job(pool, job_id).await?;
    check_job_owner(job, organization_id)
}

pub fn check_job_owner(job: Option<JobRow>, organization_id: Uuid) -> Result<JobRow, AppError> {
    let job = job.ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    if job.organization_id != organization_id {
        return Err(AppError::Validation(
            "Job does not belong to organization".to_string(),
        ));
    }
    Ok(job)
}

/// Trims `value` and rejects it when empty.
pub fn require_text(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn membership(is_admin: bool) -> MembershipRow {
        MembershipRow {
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            is_admin,
        }
    }

    fn job(organization_id: Uuid) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            organization_id,
            title: "Senior Go engineer".to_string(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_non_member_is_forbidden() {
        let err = check_role(None, Role::Member).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(msg) if msg.contains("member")));
    }

    #[test]
    fn test_member_passes_member_check_only() {
        let m = membership(false);
        assert!(check_role(Some(&m), Role::Member).is_ok());
        assert!(matches!(
            check_role(Some(&m), Role::Admin),
            Err(AppError::Forbidden(msg)) if msg == "Not authorized"
        ));
    }

    #[test]
    fn test_admin_passes_both_checks() {
        let m = membership(true);
        assert!(check_role(Some(&m), Role::Member).is_ok());
        assert!(check_role(Some(&m), Role::Admin).is_ok());
    }

    #[test]
    fn test_job_owner_check() {
        let org = Uuid::new_v4();
        assert!(check_job_owner(Some(job(org)), org).is_ok());
        assert!(matches!(
            check_job_owner(Some(job(Uuid::new_v4())), org),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(check_job_owner(None, org), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("name", "  Acme  ").unwrap(), "Acme");
        assert!(matches!(
            require_text("title", " \n "),
            Err(AppError::Validation(msg)) if msg == "title cannot be empty"
        ));
    }
}
