use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;

use super::error::StorageError;
use super::traits::ChunkStore;

const CHUNK_EXT: &str = "chunk";

/// Filesystem-backed chunk store.
///
/// Each logical file gets its own directory in a Git-style sharded layout
/// keyed by the SHA-256 of the logical path:
/// `{root}/{first 2 hex chars}/{remaining 62 hex chars}/{index:08}.chunk`.
/// Hashing the path keeps arbitrary logical identities out of the directory
/// namespace.
pub struct FilesystemChunkStore {
    root: PathBuf,
}

impl FilesystemChunkStore {
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root })
    }

    /// Directory holding every chunk of one logical file.
    fn file_dir(&self, path: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(path.as_bytes()));
        self.root.join(&digest[..2]).join(&digest[2..])
    }

    fn chunk_path(&self, path: &str, index: u32) -> PathBuf {
        self.file_dir(path).join(format!("{index:08}.{CHUNK_EXT}"))
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ChunkStore for FilesystemChunkStore {
    async fn write(&self, path: &str, index: u32, bytes: &[u8]) -> Result<(), StorageError> {
        let chunk_path = self.chunk_path(path, index);
        if let Some(parent) = chunk_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write through a temp file so a crashed write never leaves a
        // half-visible chunk.
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &chunk_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn read(&self, path: &str, index: u32) -> Result<Vec<u8>, StorageError> {
        match fs::read(self.chunk_path(path, index)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                path: path.to_string(),
                index,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn chunk_count(&self, path: &str) -> Result<u32, StorageError> {
        let dir = self.file_dir(path);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0u32;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == CHUNK_EXT) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        match fs::remove_dir_all(self.file_dir(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
