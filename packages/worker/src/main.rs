mod config;
mod error;
mod executor;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::Database;
use tracing::info;

use common::chunk::ChunkCipher;
use common::storage::FilesystemChunkStore;
use common::store::JobStore;
use executor::JobExecutor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = config::WorkerAppConfig::load().context("Failed to load config")?;
    info!("Worker starting: {}", config.worker.id);

    let db = Database::connect(&config.database.url)
        .await
        .context("Failed to connect to job store")?;
    let jobs = JobStore::new(db);

    let store = Arc::new(
        FilesystemChunkStore::new(config.storage.root.clone())
            .await
            .context("Failed to open chunk store")?,
    );
    let cipher =
        ChunkCipher::from_hex(&config.encryption.key).context("Invalid encryption key")?;

    let executor = JobExecutor::new(jobs, store, cipher, config.storage.chunk_size);

    if config.worker.daemon {
        info!(
            poll_interval_secs = config.worker.poll_interval_secs,
            "Running as daemon"
        );
        executor
            .run_daemon(Duration::from_secs(config.worker.poll_interval_secs))
            .await?;
    } else {
        let processed = executor.run_until_drained().await?;
        info!(processed, "Queue drained, exiting");
    }

    Ok(())
}
