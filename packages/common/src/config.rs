use serde::Deserialize;

use crate::chunk::DEFAULT_CHUNK_SIZE;

/// Durable store connection settings, shared by server and worker.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL. Default: "postgres://localhost/courier".
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "postgres://localhost/courier".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

/// Chunk destination settings, shared by server and worker.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory for the filesystem chunk store. Default: "./data/chunks".
    #[serde(default = "default_storage_root")]
    pub root: std::path::PathBuf,
    /// Chunk size in bytes. Fixed per deployment; never renegotiated
    /// mid-file. Default: 3 MiB.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_storage_root() -> std::path::PathBuf {
    "./data/chunks".into()
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Encryption-at-rest settings, shared by server and worker.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EncryptionConfig {
    /// 64-character hex encoding of the 32-byte chunk key. No default: a
    /// deployment must provide its own key (e.g. COURIER__ENCRYPTION__KEY).
    #[serde(default)]
    pub key: String,
}
