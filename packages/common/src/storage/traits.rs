use async_trait::async_trait;

use super::error::StorageError;

/// A byte-addressable destination for encrypted chunks.
///
/// Chunks are addressed by the logical file path plus a zero-based index.
/// Implementations must write each chunk durably before returning; the worker
/// relies on that to abort a job cleanly on the first failed chunk.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store the sealed bytes for one chunk, replacing any previous content.
    async fn write(&self, path: &str, index: u32, bytes: &[u8]) -> Result<(), StorageError>;

    /// Retrieve the sealed bytes for one chunk.
    async fn read(&self, path: &str, index: u32) -> Result<Vec<u8>, StorageError>;

    /// Number of chunks stored for the logical path. Zero when the path has
    /// never been written.
    async fn chunk_count(&self, path: &str) -> Result<u32, StorageError>;

    /// Remove every chunk artifact for the logical path.
    ///
    /// Returns `false` when nothing existed; deleting a missing target is not
    /// an error.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Check whether any chunk exists for the logical path.
    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.chunk_count(path).await? > 0)
    }
}
