use thiserror::Error;
use uuid::Uuid;

use common::chunk::ChunkError;
use common::storage::StorageError;
use common::store::JobStoreError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("job store error: {0}")]
    Store(#[from] JobStoreError),

    #[error("chunk codec error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("chunk storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("job {0} requires a source_ref")]
    MissingSource(Uuid),

    #[error("no chunks stored for '{0}'")]
    EmptyTarget(String),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
