mod config;
mod db;
mod errors;
mod intake;
mod llm_client;
mod models;
mod organizations;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::intake::extract::PdfTextParser;
use crate::intake::persist::{PgResumeStore, S3DocumentStore};
use crate::intake::IntakePipeline;
use crate::llm_client::{LlmClient, StructuredGenerator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobfit API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client; without a key every submission is rejected up front
    let generator: Option<Arc<dyn StructuredGenerator>> = match &config.gemini_api_key {
        Some(key) => {
            let llm: Arc<dyn StructuredGenerator> =
                Arc::new(LlmClient::new(key.clone(), config.generation_timeout)?);
            info!(
                "LLM client initialized (model: {}, timeout: {}s)",
                llm_client::MODEL,
                config.generation_timeout.as_secs()
            );
            Some(llm)
        }
        None => {
            warn!("GEMINI_API_KEY is not set; resume submissions will be rejected");
            None
        }
    };

    let intake = IntakePipeline {
        parser: Arc::new(PdfTextParser),
        generator,
        documents: Arc::new(S3DocumentStore::new(s3, config.s3_bucket.clone())),
        resumes: Arc::new(PgResumeStore::new(db.clone())),
        generation_timeout: config.generation_timeout,
        max_upload_bytes: config.max_upload_bytes,
    };

    // Build app state
    let state = AppState {
        db,
        intake,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "jobfit-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
