use thiserror::Error;

/// Errors raised by a chunk storage destination.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No chunk exists at the requested (path, index).
    #[error("chunk {index} of '{path}' not found")]
    NotFound { path: String, index: u32 },

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend rejected or garbled a request (remote store errors,
    /// malformed listings).
    #[error("storage backend error: {0}")]
    Backend(String),
}
