use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::entity::job;
use common::job::{JobAction, JobStatus};

use crate::error::AppError;

/// Progress shown while a job is Processing. The record does not track
/// chunk-level progress, so this is a coarse two-point approximation, not a
/// byte-accurate measure.
const PROCESSING_PROGRESS: u8 = 50;

/// Longest accepted logical path or staged file reference.
const MAX_PATH_LEN: usize = 1024;

/// Request body for submitting a distribution job.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitJobRequest {
    pub action: JobAction,
    /// Logical file identity at the chunk destination.
    #[schema(example = "releases/v2/image.bin")]
    pub target_path: String,
    /// Staged file the worker reads (Upload) or writes (Download). Not used
    /// for Delete.
    #[schema(example = "/var/spool/courier/upload-01.bin")]
    pub source_ref: Option<String>,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
}

/// Normalized progress payload for polling clients.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    /// Diagnostic from the worker; only set on Failed jobs.
    pub error: Option<String>,
    /// Wall-clock seconds since submission.
    #[schema(example = 12)]
    pub time_elapsed: i64,
    /// 0 while Pending, 50 while Processing, 100 once terminal.
    #[schema(example = 50)]
    pub progress_percent: u8,
}

impl JobStatusResponse {
    pub fn from_record(record: &job::Model, now: DateTime<Utc>) -> Self {
        let progress_percent = match record.status {
            JobStatus::Pending => 0,
            JobStatus::Processing => PROCESSING_PROGRESS,
            JobStatus::Complete | JobStatus::Failed => 100,
        };
        Self {
            status: record.status,
            error: record.error_message.clone(),
            time_elapsed: (now - record.created_at).num_seconds().max(0),
            progress_percent,
        }
    }
}

/// Job summary for the management console listing.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobSummary {
    pub id: Uuid,
    pub action: JobAction,
    pub status: JobStatus,
    pub target_path: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl From<job::Model> for JobSummary {
    fn from(m: job::Model) -> Self {
        Self {
            id: m.id,
            action: m.action,
            status: m.status,
            target_path: m.target_path,
            owner_id: m.owner_id,
            created_at: m.created_at,
            completed_at: m.completed_at,
            error_message: m.error_message,
        }
    }
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct JobListResponse {
    pub data: Vec<JobSummary>,
}

/// Query parameters for the job listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct JobListQuery {
    /// Maximum rows returned. Default 50, capped at 500.
    #[param(example = 50)]
    pub limit: Option<u64>,
}

/// Dispatch signal outcome.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DispatchResponse {
    /// "success" or "failure".
    #[schema(example = "success")]
    pub status: String,
    pub message: String,
}

fn validate_path_field(value: &str, field: &str) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.len() > MAX_PATH_LEN {
        return Err(AppError::Validation(format!(
            "{field} exceeds {MAX_PATH_LEN} characters"
        )));
    }
    if value.contains('\0') {
        return Err(AppError::Validation(format!(
            "{field} contains a NUL byte"
        )));
    }
    Ok(())
}

/// Validate a job submission request.
pub fn validate_submit_job(req: &SubmitJobRequest) -> Result<(), AppError> {
    validate_path_field(&req.target_path, "target_path")?;

    if req.action.moves_data() {
        let source = req
            .source_ref
            .as_deref()
            .ok_or_else(|| AppError::Validation("source_ref is required for this action".into()))?;
        validate_path_field(source, "source_ref")?;
    }

    Ok(())
}

/// Validate job listing query parameters.
pub fn validate_job_list_query(query: &JobListQuery) -> Result<u64, AppError> {
    let limit = query.limit.unwrap_or(50);
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".into()));
    }
    Ok(limit.min(500))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: JobStatus) -> job::Model {
        job::Model {
            id: Uuid::new_v4(),
            action: JobAction::Upload,
            status,
            target_path: "t".into(),
            source_ref: Some("/staging/t".into()),
            owner_id: "admin-1".into(),
            created_at: Utc::now() - Duration::seconds(30),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    fn upload_request() -> SubmitJobRequest {
        SubmitJobRequest {
            action: JobAction::Upload,
            target_path: "releases/img.bin".into(),
            source_ref: Some("/staging/img.bin".into()),
        }
    }

    #[test]
    fn progress_follows_status() {
        assert_eq!(
            JobStatusResponse::from_record(&record(JobStatus::Pending), Utc::now())
                .progress_percent,
            0
        );
        assert_eq!(
            JobStatusResponse::from_record(&record(JobStatus::Processing), Utc::now())
                .progress_percent,
            50
        );
        assert_eq!(
            JobStatusResponse::from_record(&record(JobStatus::Complete), Utc::now())
                .progress_percent,
            100
        );
        assert_eq!(
            JobStatusResponse::from_record(&record(JobStatus::Failed), Utc::now())
                .progress_percent,
            100
        );
    }

    #[test]
    fn progress_is_monotonic_across_lifecycle() {
        let order = [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Complete,
        ];
        let now = Utc::now();
        let values: Vec<u8> = order
            .iter()
            .map(|s| JobStatusResponse::from_record(&record(*s), now).progress_percent)
            .collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn elapsed_counts_seconds_since_creation() {
        let r = record(JobStatus::Pending);
        let response = JobStatusResponse::from_record(&r, r.created_at + Duration::seconds(90));
        assert_eq!(response.time_elapsed, 90);
    }

    #[test]
    fn elapsed_never_negative_under_clock_skew() {
        let r = record(JobStatus::Pending);
        let response = JobStatusResponse::from_record(&r, r.created_at - Duration::seconds(5));
        assert_eq!(response.time_elapsed, 0);
    }

    #[test]
    fn valid_upload_passes() {
        assert!(validate_submit_job(&upload_request()).is_ok());
    }

    #[test]
    fn blank_target_rejected() {
        let mut req = upload_request();
        req.target_path = "   ".into();
        assert!(validate_submit_job(&req).is_err());
    }

    #[test]
    fn oversized_target_rejected() {
        let mut req = upload_request();
        req.target_path = "x".repeat(MAX_PATH_LEN + 1);
        assert!(validate_submit_job(&req).is_err());
    }

    #[test]
    fn nul_byte_rejected() {
        let mut req = upload_request();
        req.target_path = "bad\0path".into();
        assert!(validate_submit_job(&req).is_err());
    }

    #[test]
    fn upload_requires_source_ref() {
        let mut req = upload_request();
        req.source_ref = None;
        assert!(validate_submit_job(&req).is_err());
    }

    #[test]
    fn delete_needs_no_source_ref() {
        let req = SubmitJobRequest {
            action: JobAction::Delete,
            target_path: "releases/img.bin".into(),
            source_ref: None,
        };
        assert!(validate_submit_job(&req).is_ok());
    }

    #[test]
    fn list_query_limits() {
        assert_eq!(
            validate_job_list_query(&JobListQuery { limit: None }).unwrap(),
            50
        );
        assert_eq!(
            validate_job_list_query(&JobListQuery { limit: Some(9999) }).unwrap(),
            500
        );
        assert!(validate_job_list_query(&JobListQuery { limit: Some(0) }).is_err());
    }
}
