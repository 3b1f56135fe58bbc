use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::job::{JobAction, JobStatus};

/// One row per distribution operation; the single source of truth for
/// progress.
///
/// Column ownership: the submission path writes the initial Pending row; the
/// worker is the only writer of `status`, `started_at`, `completed_at` and
/// `error_message` after insertion. `started_at` is null iff the row is
/// Pending; `error_message` is non-null iff it is Failed; terminal rows are
/// immutable.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job")]
pub struct Model {
    /// Opaque id assigned at submission, immutable.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub action: JobAction,
    pub status: JobStatus,

    /// Logical file identity at the chunk destination.
    pub target_path: String,
    /// Staged local file the worker reads (Upload) or writes (Download).
    pub source_ref: Option<String>,

    /// The submitting principal; used for authorization on status queries.
    pub owner_id: String,

    pub created_at: DateTimeUtc,
    pub started_at: Option<DateTimeUtc>,
    pub completed_at: Option<DateTimeUtc>,
    pub error_message: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
