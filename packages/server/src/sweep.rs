use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use common::store::JobStore;

use crate::config::JobsConfig;
use crate::dispatch::Dispatcher;

/// Run the periodic job sweep as a background task.
///
/// Closes the two gaps the claim protocol leaves open: a worker that died
/// mid-job would pin its claim in Processing forever, and a lost dispatch
/// signal would strand Pending jobs until the next submission.
pub async fn run_job_sweep(jobs: JobStore, dispatcher: Arc<Dispatcher>, config: JobsConfig) {
    let interval = Duration::from_secs(config.sweep_interval_secs);

    info!(
        claim_timeout_secs = config.claim_timeout_secs,
        sweep_interval_secs = config.sweep_interval_secs,
        "Starting job sweep"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        if let Err(e) = sweep_once(&jobs, &dispatcher, &config).await {
            error!(error = %e, "Job sweep failed");
        }
    }
}

/// One sweep pass: fail abandoned claims, relaunch a worker for stranded
/// Pending jobs.
pub async fn sweep_once(
    jobs: &JobStore,
    dispatcher: &Dispatcher,
    config: &JobsConfig,
) -> anyhow::Result<()> {
    let claim_cutoff = Utc::now() - chrono::Duration::seconds(config.claim_timeout_secs as i64);
    let failed = jobs
        .fail_stale_processing(
            claim_cutoff,
            "claim timed out: worker did not finish within the claim window",
        )
        .await?;
    if failed > 0 {
        warn!(count = failed, "Failed stale Processing jobs");
    }

    let redispatch_cutoff =
        Utc::now() - chrono::Duration::seconds(config.redispatch_after_secs as i64);
    let stranded = jobs.count_stale_pending(redispatch_cutoff).await?;
    if stranded > 0 {
        info!(count = stranded, "Pending jobs waiting, signalling worker");
        if let Err(e) = dispatcher.signal_work().await {
            // Jobs stay Pending; the next pass retries.
            warn!(error = %e, "Redispatch failed");
        }
    }

    Ok(())
}
