use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use common::chunk::{ChunkCipher, ChunkReader};
use common::entity::job;
use common::job::JobAction;
use common::storage::ChunkStore;
use common::store::JobStore;

use crate::error::{Result, WorkerError};

/// Claims pending jobs from the durable queue and performs their chunked
/// encrypt/decrypt I/O.
///
/// One executor handles one job at a time; running several executor
/// processes is safe because every claim is an exclusive single-row
/// transition in the store.
pub struct JobExecutor {
    jobs: JobStore,
    store: Arc<dyn ChunkStore>,
    cipher: ChunkCipher,
    chunk_size: usize,
}

impl JobExecutor {
    pub fn new(
        jobs: JobStore,
        store: Arc<dyn ChunkStore>,
        cipher: ChunkCipher,
        chunk_size: usize,
    ) -> Self {
        Self {
            jobs,
            store,
            cipher,
            chunk_size,
        }
    }

    /// Claim and process jobs until the queue is drained. Returns the number
    /// of jobs processed.
    pub async fn run_until_drained(&self) -> Result<u64> {
        let mut processed = 0u64;
        while let Some(claimed) = self.jobs.claim_next_pending().await? {
            self.process(claimed).await?;
            processed += 1;
        }
        Ok(processed)
    }

    /// Daemon mode: poll for new work forever.
    pub async fn run_daemon(&self, poll_interval: Duration) -> Result<()> {
        loop {
            let processed = self.run_until_drained().await?;
            if processed > 0 {
                debug!(processed, "Drain pass finished");
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Execute one already-claimed (Processing) job and record its terminal
    /// state.
    ///
    /// Execution errors mark the job Failed with a diagnostic; only store
    /// errors propagate to the caller.
    pub async fn process(&self, claimed: job::Model) -> Result<()> {
        info!(
            job_id = %claimed.id,
            action = %claimed.action,
            target = %claimed.target_path,
            "Executing job"
        );

        match self.execute(&claimed).await {
            Ok(()) => {
                self.jobs.mark_complete(claimed.id).await?;
                info!(job_id = %claimed.id, "Job complete");
            }
            Err(e) => {
                warn!(job_id = %claimed.id, error = %e, "Job failed");
                self.jobs.mark_failed(claimed.id, &e.to_string()).await?;
            }
        }
        Ok(())
    }

    async fn execute(&self, claimed: &job::Model) -> Result<()> {
        match claimed.action {
            JobAction::Upload => self.upload(claimed).await,
            JobAction::Download => self.download(claimed).await,
            JobAction::Delete => self.delete(claimed).await,
        }
    }

    /// Stream the staged source file through the chunk codec, sealing and
    /// writing each chunk before advancing. Any failure aborts the whole
    /// job; a resubmitted job restarts from chunk 0.
    async fn upload(&self, claimed: &job::Model) -> Result<()> {
        let source = claimed
            .source_ref
            .as_deref()
            .ok_or(WorkerError::MissingSource(claimed.id))?;

        // Stale chunks from a previous upload of the same target must not
        // survive into the reassembled file.
        self.store.delete(&claimed.target_path).await?;

        let file = std::fs::File::open(source)?;
        let mut reader = ChunkReader::new(std::io::BufReader::new(file), self.chunk_size)?;

        let mut written = 0u32;
        while let Some(chunk) = reader.next_chunk()? {
            let sealed = self.cipher.seal(&chunk)?;
            self.store
                .write(&claimed.target_path, chunk.index, &sealed)
                .await?;
            written += 1;
        }

        debug!(job_id = %claimed.id, chunks = written, "Upload wrote all chunks");
        Ok(())
    }

    /// Read, authenticate and reassemble every chunk of the target into the
    /// staged destination file, via a temp file so a failed download never
    /// leaves a truncated result.
    async fn download(&self, claimed: &job::Model) -> Result<()> {
        let dest = claimed
            .source_ref
            .as_deref()
            .ok_or(WorkerError::MissingSource(claimed.id))?;

        let count = self.store.chunk_count(&claimed.target_path).await?;
        if count == 0 {
            return Err(WorkerError::EmptyTarget(claimed.target_path.clone()));
        }

        let temp_path = format!("{dest}.part");
        let result = self.reassemble_into(&temp_path, &claimed.target_path, count).await;
        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
        std::fs::rename(&temp_path, dest)?;

        debug!(job_id = %claimed.id, chunks = count, "Download reassembled target");
        Ok(())
    }

    async fn reassemble_into(&self, temp_path: &str, target: &str, count: u32) -> Result<()> {
        let mut out = std::fs::File::create(temp_path)?;
        for index in 0..count {
            let sealed = self.store.read(target, index).await?;
            let chunk = self.cipher.open(index, &sealed)?;
            out.write_all(&chunk.data)?;
        }
        out.sync_all()?;
        Ok(())
    }

    /// Remove all chunk artifacts for the target. Missing artifacts are
    /// tolerated: delete is idempotent.
    async fn delete(&self, claimed: &job::Model) -> Result<()> {
        let existed = self.store.delete(&claimed.target_path).await?;
        debug!(job_id = %claimed.id, existed, "Delete finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::chunk::{NONCE_LEN, TAG_LEN};
    use common::job::JobStatus;
    use common::storage::FilesystemChunkStore;
    use common::store::NewJob;
    use sea_orm::Database;
    use std::path::Path;

    const TEST_CHUNK_SIZE: usize = 1024;

    struct Fixture {
        jobs: JobStore,
        store: Arc<FilesystemChunkStore>,
        executor: JobExecutor,
        dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("jobs.db").display()
        );
        let db = Database::connect(&url).await.unwrap();
        db.get_schema_registry("common::entity::*")
            .sync(&db)
            .await
            .unwrap();

        let jobs = JobStore::new(db);
        let store = Arc::new(
            FilesystemChunkStore::new(dir.path().join("chunks"))
                .await
                .unwrap(),
        );
        let executor = JobExecutor::new(
            jobs.clone(),
            store.clone(),
            ChunkCipher::new([9u8; 32]),
            TEST_CHUNK_SIZE,
        );
        Fixture {
            jobs,
            store,
            executor,
            dir,
        }
    }

    fn stage_file(dir: &Path, name: &str, data: &[u8]) -> String {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path.to_string_lossy().into_owned()
    }

    async fn submit(fx: &Fixture, action: JobAction, target: &str, source: Option<String>) -> uuid::Uuid {
        fx.jobs
            .insert(NewJob {
                action,
                target_path: target.into(),
                source_ref: source,
                owner_id: "admin-1".into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upload_writes_sealed_chunks() {
        let fx = fixture().await;
        // 3.5 chunks of payload -> 4 chunks, last one short.
        let data: Vec<u8> = (0..=255u8)
            .cycle()
            .take(TEST_CHUNK_SIZE * 3 + TEST_CHUNK_SIZE / 2)
            .collect();
        let source = stage_file(fx.dir.path(), "in.bin", &data);

        let id = submit(&fx, JobAction::Upload, "docs/in.bin", Some(source)).await;
        assert_eq!(fx.executor.run_until_drained().await.unwrap(), 1);

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert!(record.completed_at.is_some());

        assert_eq!(fx.store.chunk_count("docs/in.bin").await.unwrap(), 4);
        // Chunks are sealed, not plaintext: envelope overhead present and
        // content differs from the source slice.
        let sealed = fx.store.read("docs/in.bin", 0).await.unwrap();
        assert_eq!(sealed.len(), TEST_CHUNK_SIZE + NONCE_LEN + TAG_LEN);
        assert_ne!(&sealed[NONCE_LEN..NONCE_LEN + 16], &data[..16]);
    }

    #[tokio::test]
    async fn upload_download_round_trip() {
        let fx = fixture().await;
        let data: Vec<u8> = (0..TEST_CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let source = stage_file(fx.dir.path(), "original.bin", &data);

        submit(&fx, JobAction::Upload, "files/original", Some(source)).await;
        fx.executor.run_until_drained().await.unwrap();

        let restored = fx.dir.path().join("restored.bin");
        let download = submit(
            &fx,
            JobAction::Download,
            "files/original",
            Some(restored.to_string_lossy().into_owned()),
        )
        .await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(download).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert_eq!(std::fs::read(&restored).unwrap(), data);
    }

    #[tokio::test]
    async fn reupload_replaces_previous_chunks() {
        let fx = fixture().await;
        let big = stage_file(fx.dir.path(), "big.bin", &vec![1u8; TEST_CHUNK_SIZE * 3]);
        let small = stage_file(fx.dir.path(), "small.bin", &vec![2u8; TEST_CHUNK_SIZE]);

        submit(&fx, JobAction::Upload, "t", Some(big)).await;
        fx.executor.run_until_drained().await.unwrap();
        assert_eq!(fx.store.chunk_count("t").await.unwrap(), 3);

        submit(&fx, JobAction::Upload, "t", Some(small)).await;
        fx.executor.run_until_drained().await.unwrap();
        assert_eq!(fx.store.chunk_count("t").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upload_with_missing_source_fails_job() {
        let fx = fixture().await;
        let id = submit(
            &fx,
            JobAction::Upload,
            "docs/none",
            Some(fx.dir.path().join("does-not-exist").to_string_lossy().into_owned()),
        )
        .await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error_message.is_some());
    }

    #[tokio::test]
    async fn upload_without_source_ref_fails_job() {
        let fx = fixture().await;
        let id = submit(&fx, JobAction::Upload, "docs/none", None).await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert!(
            record
                .error_message
                .as_deref()
                .unwrap()
                .contains("source_ref")
        );
    }

    #[tokio::test]
    async fn download_with_tampered_chunk_fails_integrity() {
        let fx = fixture().await;
        let source = stage_file(fx.dir.path(), "x.bin", &vec![7u8; TEST_CHUNK_SIZE]);
        submit(&fx, JobAction::Upload, "x", Some(source)).await;
        fx.executor.run_until_drained().await.unwrap();

        // Corrupt the stored ciphertext.
        let mut sealed = fx.store.read("x", 0).await.unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        fx.store.write("x", 0, &sealed).await.unwrap();

        let out = fx.dir.path().join("out.bin");
        let id = submit(
            &fx,
            JobAction::Download,
            "x",
            Some(out.to_string_lossy().into_owned()),
        )
        .await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert!(
            record
                .error_message
                .as_deref()
                .unwrap()
                .contains("integrity")
        );
        // No truncated output left behind.
        assert!(!out.exists());
        assert!(!fx.dir.path().join("out.bin.part").exists());
    }

    #[tokio::test]
    async fn download_of_unknown_target_fails_job() {
        let fx = fixture().await;
        let out = fx.dir.path().join("out.bin");
        let id = submit(
            &fx,
            JobAction::Download,
            "never-uploaded",
            Some(out.to_string_lossy().into_owned()),
        )
        .await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn delete_existing_target_completes() {
        let fx = fixture().await;
        let source = stage_file(fx.dir.path(), "d.bin", &vec![3u8; TEST_CHUNK_SIZE * 2]);
        submit(&fx, JobAction::Upload, "d", Some(source)).await;
        fx.executor.run_until_drained().await.unwrap();
        assert!(fx.store.exists("d").await.unwrap());

        let id = submit(&fx, JobAction::Delete, "d", None).await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert!(!fx.store.exists("d").await.unwrap());
    }

    #[tokio::test]
    async fn delete_of_missing_target_is_idempotent() {
        let fx = fixture().await;
        let id = submit(&fx, JobAction::Delete, "never-existed", None).await;
        fx.executor.run_until_drained().await.unwrap();

        let record = fx.jobs.get(id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Complete);
        assert!(record.error_message.is_none());
    }

    #[tokio::test]
    async fn drained_queue_processes_all_jobs() {
        let fx = fixture().await;
        for i in 0..3 {
            let source = stage_file(fx.dir.path(), &format!("f{i}.bin"), &[i as u8; 64]);
            submit(&fx, JobAction::Upload, &format!("f{i}"), Some(source)).await;
        }
        assert_eq!(fx.executor.run_until_drained().await.unwrap(), 3);
        assert_eq!(fx.executor.run_until_drained().await.unwrap(), 0);
    }
}
