use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entity::job;
use crate::job::{JobAction, JobStatus};

/// Errors raised by the job record store.
#[derive(Debug, Error)]
pub enum JobStoreError {
    /// Required fields missing or malformed; never retried.
    #[error("{0}")]
    Validation(String),

    #[error("job {0} not found")]
    NotFound(Uuid),

    /// Attempted transition out of a terminal or unexpected state.
    #[error("job {id} is {status}, cannot mark it {requested}")]
    InvalidTransition {
        id: Uuid,
        status: JobStatus,
        requested: JobStatus,
    },

    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

/// Fields supplied at submission time.
#[derive(Clone, Debug)]
pub struct NewJob {
    pub action: JobAction,
    pub target_path: String,
    pub source_ref: Option<String>,
    pub owner_id: String,
}

/// Durable queue of distribution jobs.
///
/// Every status transition is a single-row conditional update, so concurrent
/// workers and request handlers coordinate exclusively through this table.
#[derive(Clone)]
pub struct JobStore {
    db: DatabaseConnection,
}

impl JobStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a Pending record and return its id.
    pub async fn insert(&self, new_job: NewJob) -> Result<Uuid, JobStoreError> {
        if new_job.target_path.trim().is_empty() {
            return Err(JobStoreError::Validation("target_path is required".into()));
        }
        if new_job.owner_id.trim().is_empty() {
            return Err(JobStoreError::Validation("owner_id is required".into()));
        }

        let id = Uuid::new_v4();
        let record = job::ActiveModel {
            id: Set(id),
            action: Set(new_job.action),
            status: Set(JobStatus::Pending),
            target_path: Set(new_job.target_path),
            source_ref: Set(new_job.source_ref),
            owner_id: Set(new_job.owner_id),
            created_at: Set(Utc::now()),
            started_at: Set(None),
            completed_at: Set(None),
            error_message: Set(None),
        };
        record.insert(&self.db).await?;

        debug!(job_id = %id, "Job record inserted");
        Ok(id)
    }

    /// Atomically claim the oldest Pending job, or `None` when the queue is
    /// drained.
    ///
    /// The transition is a conditional update filtered on the Pending status,
    /// so when several workers race for the same row exactly one sees
    /// `rows_affected == 1`; the losers move on to the next candidate.
    pub async fn claim_next_pending(&self) -> Result<Option<job::Model>, JobStoreError> {
        loop {
            let candidate = job::Entity::find()
                .filter(job::Column::Status.eq(JobStatus::Pending))
                .order_by(job::Column::CreatedAt, Order::Asc)
                .one(&self.db)
                .await?;

            let Some(candidate) = candidate else {
                return Ok(None);
            };

            if self.try_claim(candidate.id).await? {
                let claimed = job::Entity::find_by_id(candidate.id)
                    .one(&self.db)
                    .await?
                    .ok_or(JobStoreError::NotFound(candidate.id))?;
                return Ok(Some(claimed));
            }
            // Another claimant won the row; retry with the next candidate.
        }
    }

    /// Claim one specific job (synchronous execution path). Returns `None`
    /// when the job is not claimable (missing or no longer Pending).
    pub async fn claim(&self, id: Uuid) -> Result<Option<job::Model>, JobStoreError> {
        if !self.try_claim(id).await? {
            return Ok(None);
        }
        Ok(job::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn try_claim(&self, id: Uuid) -> Result<bool, JobStoreError> {
        let result = job::Entity::update_many()
            .col_expr(job::Column::Status, Expr::value(JobStatus::Processing))
            .col_expr(job::Column::StartedAt, Expr::value(Some(Utc::now())))
            .filter(job::Column::Id.eq(id))
            .filter(job::Column::Status.eq(JobStatus::Pending))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Terminal transition: Processing -> Complete.
    pub async fn mark_complete(&self, id: Uuid) -> Result<(), JobStoreError> {
        self.finish(id, JobStatus::Complete, None).await
    }

    /// Terminal transition: Processing -> Failed, recording the diagnostic.
    pub async fn mark_failed(&self, id: Uuid, message: &str) -> Result<(), JobStoreError> {
        self.finish(id, JobStatus::Failed, Some(message.to_string()))
            .await
    }

    async fn finish(
        &self,
        id: Uuid,
        status: JobStatus,
        error_message: Option<String>,
    ) -> Result<(), JobStoreError> {
        let result = job::Entity::update_many()
            .col_expr(job::Column::Status, Expr::value(status))
            .col_expr(job::Column::CompletedAt, Expr::value(Some(Utc::now())))
            .col_expr(job::Column::ErrorMessage, Expr::value(error_message))
            .filter(job::Column::Id.eq(id))
            .filter(job::Column::Status.eq(JobStatus::Processing))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        // Distinguish a vanished row from an illegal transition.
        match job::Entity::find_by_id(id).one(&self.db).await? {
            None => Err(JobStoreError::NotFound(id)),
            Some(row) => Err(JobStoreError::InvalidTransition {
                id,
                status: row.status,
                requested: status,
            }),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<job::Model>, JobStoreError> {
        Ok(job::Entity::find_by_id(id).one(&self.db).await?)
    }

    /// Most recent jobs first, for the management console.
    pub async fn list(&self, limit: u64) -> Result<Vec<job::Model>, JobStoreError> {
        Ok(job::Entity::find()
            .order_by(job::Column::CreatedAt, Order::Desc)
            .limit(limit)
            .all(&self.db)
            .await?)
    }

    /// Fail every Processing row claimed before `cutoff`. Keeps a dead
    /// worker's claim from pinning a job in Processing forever, while
    /// preserving forward-only transitions. Returns the number of rows
    /// swept.
    pub async fn fail_stale_processing(
        &self,
        cutoff: chrono::DateTime<Utc>,
        message: &str,
    ) -> Result<u64, JobStoreError> {
        let result = job::Entity::update_many()
            .col_expr(job::Column::Status, Expr::value(JobStatus::Failed))
            .col_expr(job::Column::CompletedAt, Expr::value(Some(Utc::now())))
            .col_expr(
                job::Column::ErrorMessage,
                Expr::value(Some(message.to_string())),
            )
            .filter(job::Column::Status.eq(JobStatus::Processing))
            .filter(job::Column::StartedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Count Pending rows created before `cutoff` — jobs whose dispatch
    /// signal was lost and that need a fresh worker launch.
    pub async fn count_stale_pending(
        &self,
        cutoff: chrono::DateTime<Utc>,
    ) -> Result<u64, JobStoreError> {
        use sea_orm::PaginatorTrait;

        Ok(job::Entity::find()
            .filter(job::Column::Status.eq(JobStatus::Pending))
            .filter(job::Column::CreatedAt.lt(cutoff))
            .count(&self.db)
            .await?)
    }
}
