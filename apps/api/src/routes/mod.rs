pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::intake::handlers as intake;
use crate::organizations::handlers as organizations;
use crate::state::AppState;

/// Headroom over the encoded document for the other JSON fields.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Base64 inflates the document by 4/3.
    let body_limit = state.config.max_upload_bytes.div_ceil(3) * 4 + BODY_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Resume intake
        .route("/api/v1/apply", post(intake::handle_apply))
        .route("/api/v1/upload", post(intake::handle_upload))
        // Organizations and jobs
        .route(
            "/api/v1/organizations",
            get(organizations::handle_list_organizations)
                .post(organizations::handle_create_organization),
        )
        .route(
            "/api/v1/organizations/:org_id",
            get(organizations::handle_get_organization)
                .delete(organizations::handle_delete_organization),
        )
        .route(
            "/api/v1/organizations/:org_id/admins",
            post(organizations::handle_add_admin),
        )
        .route(
            "/api/v1/organizations/:org_id/jobs",
            post(organizations::handle_create_job),
        )
        .route(
            "/api/v1/organizations/:org_id/jobs/:job_id",
            delete(organizations::handle_delete_job),
        )
        .route(
            "/api/v1/organizations/:org_id/jobs/:job_id/candidates",
            get(organizations::handle_job_candidates),
        )
        .route("/api/v1/jobs", get(organizations::handle_list_jobs))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
