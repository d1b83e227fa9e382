use sqlx::PgPool;

use crate::config::Config;
use crate::intake::IntakePipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Resume intake collaborators: parser, generator, document and record stores.
    pub intake: IntakePipeline,
    pub config: Config,
}
