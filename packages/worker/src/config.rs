use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{DatabaseConfig, EncryptionConfig, StorageConfig};

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Keep polling for new jobs instead of exiting once drained.
    /// Default: false (on-demand worker launched by the dispatcher).
    #[serde(default)]
    pub daemon: bool,
    /// Poll interval between drain passes in daemon mode. Default: 5.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_poll_interval_secs() -> u64 {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            daemon: false,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
}

impl WorkerAppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("COURIER_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.daemon", false)?
            .set_default("worker.poll_interval_secs", 5_i64)?
            .set_default("database.url", "postgres://localhost/courier")?
            .set_default("storage.root", "./data/chunks")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("COURIER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
