use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Worker launch failure. Distinct from job failure: the job record stays
/// Pending and is discovered later by the sweep or the next submission's
/// signal.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("worker launch is disabled by host policy")]
    Disabled,

    #[error("failed to launch worker process: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Liveness handle for a launched worker.
pub trait WorkerHandle: Send {
    fn is_running(&mut self) -> bool;
}

/// Host-provided primitive for starting a detached worker.
///
/// Abstracted so the executor's design stays decoupled from any particular
/// process-launch mechanism.
pub trait WorkerLauncher: Send + Sync {
    fn spawn_detached(&self) -> Result<Box<dyn WorkerHandle>, DispatchError>;
}

/// Launches the worker binary as a detached child process.
pub struct ProcessLauncher {
    binary: PathBuf,
    config_path: Option<String>,
    enabled: bool,
}

impl ProcessLauncher {
    pub fn new(binary: PathBuf, config_path: Option<String>, enabled: bool) -> Self {
        Self {
            binary,
            config_path,
            enabled,
        }
    }
}

struct ProcessHandle(Child);

impl WorkerHandle for ProcessHandle {
    fn is_running(&mut self) -> bool {
        matches!(self.0.try_wait(), Ok(None))
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn spawn_detached(&self) -> Result<Box<dyn WorkerHandle>, DispatchError> {
        if !self.enabled {
            return Err(DispatchError::Disabled);
        }

        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(path) = &self.config_path {
            cmd.env("COURIER_CONFIG", path);
        }

        let child = cmd.spawn().map_err(DispatchError::Spawn)?;
        Ok(Box::new(ProcessHandle(child)))
    }
}

/// Ensures a worker is running or will shortly run, without the caller
/// waiting for job completion.
///
/// Tracks the last launched worker and skips the spawn while it still runs.
/// That dedup is best-effort only: overlapping workers stay safe because the
/// store's claim is exclusive, not because of anything here.
pub struct Dispatcher {
    launcher: Box<dyn WorkerLauncher>,
    live: Mutex<Option<Box<dyn WorkerHandle>>>,
}

impl Dispatcher {
    pub fn new(launcher: Box<dyn WorkerLauncher>) -> Self {
        Self {
            launcher,
            live: Mutex::new(None),
        }
    }

    /// Non-blocking launch signal; returns as soon as the worker process
    /// exists.
    pub async fn signal_work(&self) -> Result<(), DispatchError> {
        let mut live = self.live.lock().await;
        if let Some(handle) = live.as_mut()
            && handle.is_running()
        {
            debug!("Worker already live, skipping launch");
            return Ok(());
        }

        let handle = self.launcher.spawn_detached()?;
        info!("Worker launched");
        *live = Some(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeHandle {
        alive: Arc<AtomicBool>,
    }

    impl WorkerHandle for FakeHandle {
        fn is_running(&mut self) -> bool {
            self.alive.load(Ordering::SeqCst)
        }
    }

    struct FakeLauncher {
        spawns: Arc<AtomicUsize>,
        alive: Arc<AtomicBool>,
        fail: bool,
    }

    impl WorkerLauncher for FakeLauncher {
        fn spawn_detached(&self) -> Result<Box<dyn WorkerHandle>, DispatchError> {
            if self.fail {
                return Err(DispatchError::Disabled);
            }
            self.spawns.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeHandle {
                alive: self.alive.clone(),
            }))
        }
    }

    fn fake(fail: bool) -> (Dispatcher, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let spawns = Arc::new(AtomicUsize::new(0));
        let alive = Arc::new(AtomicBool::new(true));
        let dispatcher = Dispatcher::new(Box::new(FakeLauncher {
            spawns: spawns.clone(),
            alive: alive.clone(),
            fail,
        }));
        (dispatcher, spawns, alive)
    }

    #[tokio::test]
    async fn repeated_signals_spawn_once_while_alive() {
        let (dispatcher, spawns, _alive) = fake(false);
        for _ in 0..5 {
            dispatcher.signal_work().await.unwrap();
        }
        assert_eq!(spawns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dead_worker_is_relaunched() {
        let (dispatcher, spawns, alive) = fake(false);
        dispatcher.signal_work().await.unwrap();
        alive.store(false, Ordering::SeqCst);
        dispatcher.signal_work().await.unwrap();
        assert_eq!(spawns.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn launch_failure_surfaces_dispatch_error() {
        let (dispatcher, spawns, _alive) = fake(true);
        assert!(matches!(
            dispatcher.signal_work().await,
            Err(DispatchError::Disabled)
        ));
        assert_eq!(spawns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disabled_process_launcher_refuses() {
        let launcher = ProcessLauncher::new("worker".into(), None, false);
        assert!(matches!(
            launcher.spawn_detached(),
            Err(DispatchError::Disabled)
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let launcher = ProcessLauncher::new("/nonexistent/courier-worker".into(), None, true);
        assert!(matches!(
            launcher.spawn_detached(),
            Err(DispatchError::Spawn(_))
        ));
    }
}
