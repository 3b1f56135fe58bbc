use thiserror::Error;

/// Errors raised while splitting, sealing or opening chunks.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("chunk read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("encryption key must be 64 hex characters (32 bytes)")]
    InvalidKey,

    /// Authentication or framing failure on a sealed chunk. Never unwraps to
    /// corrupted plaintext.
    #[error("chunk {index} failed integrity check")]
    Integrity { index: u32 },

    #[error("chunk {index} is missing from the sequence")]
    MissingChunk { index: u32 },
}
