use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use common::config::{DatabaseConfig, EncryptionConfig, StorageConfig};
use common::job::JobAction;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on request handling time. Job execution itself is
    /// unbounded; only the short-lived submission/status paths are capped.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            cors: CorsConfig::default(),
        }
    }
}

/// Job queue behavior.
#[derive(Debug, Deserialize, Clone)]
pub struct JobsConfig {
    /// Actions executed inline on the submission path instead of being
    /// handed to a worker. Default: ["Delete"].
    #[serde(default = "default_synchronous_actions")]
    pub synchronous_actions: Vec<JobAction>,
    /// A Processing claim older than this is considered abandoned and is
    /// failed by the sweep. Default: 3600.
    #[serde(default = "default_claim_timeout_secs")]
    pub claim_timeout_secs: u64,
    /// How often the sweep runs. Default: 300.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Pending jobs older than this trigger a fresh worker launch on the
    /// next sweep pass. Default: 60.
    #[serde(default = "default_redispatch_after_secs")]
    pub redispatch_after_secs: u64,
}

fn default_synchronous_actions() -> Vec<JobAction> {
    vec![JobAction::Delete]
}
fn default_claim_timeout_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    300
}
fn default_redispatch_after_secs() -> u64 {
    60
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            synchronous_actions: default_synchronous_actions(),
            claim_timeout_secs: default_claim_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            redispatch_after_secs: default_redispatch_after_secs(),
        }
    }
}

impl JobsConfig {
    pub fn is_synchronous(&self, action: JobAction) -> bool {
        self.synchronous_actions.contains(&action)
    }
}

/// Worker launch settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Whether the host permits launching worker processes at all.
    #[serde(default = "default_dispatch_enabled")]
    pub enabled: bool,
    /// Worker binary, resolved on PATH when not absolute. Default: "worker".
    #[serde(default = "default_worker_binary")]
    pub worker_binary: std::path::PathBuf,
    /// Config file handed to spawned workers via COURIER_CONFIG.
    #[serde(default)]
    pub config_path: Option<String>,
}

fn default_dispatch_enabled() -> bool {
    true
}
fn default_worker_binary() -> std::path::PathBuf {
    "worker".into()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_dispatch_enabled(),
            worker_binary: default_worker_binary(),
            config_path: None,
        }
    }
}

/// One recognized principal of the external authorization collaborator.
#[derive(Debug, Deserialize, Clone)]
pub struct PrincipalEntry {
    pub token: String,
    pub id: String,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub principals: Vec<PrincipalEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("COURIER_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000_i64)?
            .set_default("database.url", "postgres://localhost/courier")?
            .set_default("storage.root", "./data/chunks")?
            .set_default("dispatch.worker_binary", "worker")?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., COURIER__ENCRYPTION__KEY)
            .add_source(Environment::with_prefix("COURIER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
