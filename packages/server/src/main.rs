use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{Level, info};

use common::chunk::ChunkCipher;
use common::credentials::CredentialStore;
use common::storage::FilesystemChunkStore;
use common::store::JobStore;
use worker::JobExecutor;

use server::config::{AppConfig, CorsConfig};
use server::database;
use server::dispatch::{Dispatcher, ProcessLauncher};
use server::extractors::auth::StaticAuthorizer;
use server::state::AppState;
use server::{build_router, sweep};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize job store")?;
    let jobs = JobStore::new(db.clone());
    let credentials = CredentialStore::new(db);

    let authorizer = Arc::new(StaticAuthorizer::from_entries(&config.auth.principals));
    let dispatcher = Arc::new(Dispatcher::new(Box::new(ProcessLauncher::new(
        config.dispatch.worker_binary.clone(),
        config.dispatch.config_path.clone(),
        config.dispatch.enabled,
    ))));

    let store = Arc::new(
        FilesystemChunkStore::new(config.storage.root.clone())
            .await
            .context("Failed to open chunk store")?,
    );
    let cipher =
        ChunkCipher::from_hex(&config.encryption.key).context("Invalid encryption key")?;
    let executor = Arc::new(JobExecutor::new(
        jobs.clone(),
        store,
        cipher,
        config.storage.chunk_size,
    ));

    tokio::spawn(sweep::run_job_sweep(
        jobs.clone(),
        dispatcher.clone(),
        config.jobs.clone(),
    ));

    let cors = cors_layer(&config.server.cors);
    let timeout = TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs));
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        jobs,
        credentials,
        authorizer,
        dispatcher,
        executor,
    };

    let app = build_router(state).layer(cors).layer(timeout);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allow_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
