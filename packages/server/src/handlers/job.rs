use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::store::NewJob;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthPrincipal;
use crate::extractors::json::AppJson;
use crate::models::job::*;
use crate::state::AppState;

/// Submit a distribution job.
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "Jobs",
    operation_id = "submitJob",
    summary = "Submit a distribution job",
    description = "Validates the request, inserts a Pending job record and signals a worker launch. Asynchronous actions return immediately with the job id; actions configured as synchronous (default: Delete) are executed inline. Requires an admin principal.",
    request_body = SubmitJobRequest,
    responses(
        (status = 201, description = "Job accepted", body = SubmitJobResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 500, description = "Worker launch failed (DISPATCH_ERROR); the job stays Pending", body = ErrorBody),
    ),
    security(("bearer_token" = [])),
)]
#[instrument(skip(state, principal, payload))]
pub async fn submit_job(
    principal: AuthPrincipal,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;
    validate_submit_job(&payload)?;

    let action = payload.action;
    let job_id = state
        .jobs
        .insert(NewJob {
            action,
            target_path: payload.target_path.trim().to_string(),
            source_ref: payload.source_ref.map(|s| s.trim().to_string()),
            owner_id: principal.id.clone(),
        })
        .await?;

    if state.config.jobs.is_synchronous(action) {
        // No file I/O happens on this path for async actions; synchronous
        // ones (artifact removal) are cheap enough to run before replying.
        let claimed = state
            .jobs
            .claim(job_id)
            .await?
            .ok_or_else(|| AppError::Internal("synchronous job vanished before claim".into()))?;
        state.executor.process(claimed).await?;
        info!(job_id = %job_id, action = %action, "Synchronous job executed");
    } else {
        state.dispatcher.signal_work().await?;
        info!(job_id = %job_id, action = %action, "Job enqueued and worker signalled");
    }

    Ok((StatusCode::CREATED, Json(SubmitJobResponse { job_id })))
}

/// Poll the status of a job.
#[utoipa::path(
    post,
    path = "/jobs/{id}/status",
    tag = "Jobs",
    operation_id = "jobStatus",
    summary = "Poll job progress",
    description = "Returns the normalized progress payload for one job. Progress is a coarse approximation: 0 while Pending, 50 while Processing, 100 once terminal. Non-admin principals can only query their own jobs.",
    params(
        ("id" = String, Path, description = "Job ID (UUID)")
    ),
    responses(
        (status = 200, description = "Current job status", body = JobStatusResponse),
        (status = 400, description = "Malformed job id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Unknown job (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store error (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("bearer_token" = [])),
)]
#[instrument(skip(state, principal), fields(job_id = %id))]
pub async fn job_status(
    principal: AuthPrincipal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| AppError::Validation("job id must be a UUID".into()))?;

    let record = state
        .jobs
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".into()))?;

    if !principal.is_admin && record.owner_id != principal.id {
        return Err(AppError::NotFound("Job not found".into())); // Prevent enumeration
    }

    Ok(Json(JobStatusResponse::from_record(&record, Utc::now())))
}

/// List recent jobs.
#[utoipa::path(
    get,
    path = "/jobs",
    tag = "Jobs",
    operation_id = "listJobs",
    summary = "List recent jobs",
    description = "Returns the most recently submitted jobs for the management console. Requires an admin principal.",
    params(JobListQuery),
    responses(
        (status = 200, description = "Recent jobs, newest first", body = JobListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("bearer_token" = [])),
)]
#[instrument(skip(state, principal, query))]
pub async fn list_jobs(
    principal: AuthPrincipal,
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    principal.require_admin()?;
    let limit = validate_job_list_query(&query)?;

    let data = state
        .jobs
        .list(limit)
        .await?
        .into_iter()
        .map(JobSummary::from)
        .collect();

    Ok(Json(JobListResponse { data }))
}

/// Signal a worker launch.
#[utoipa::path(
    post,
    path = "/jobs/dispatch",
    tag = "Jobs",
    operation_id = "dispatchWorker",
    summary = "Ensure a worker is running",
    description = "Internal trigger with no payload. Launches a detached worker process when none is live; Pending jobs are then claimed out-of-band. Requires an admin principal.",
    responses(
        (status = 202, description = "Worker launch accepted", body = DispatchResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 500, description = "Worker launch failed", body = DispatchResponse),
    ),
    security(("bearer_token" = [])),
)]
#[instrument(skip(state, principal))]
pub async fn dispatch_worker(
    principal: AuthPrincipal,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    principal.require_admin()?;

    match state.dispatcher.signal_work().await {
        Ok(()) => Ok((
            StatusCode::ACCEPTED,
            Json(DispatchResponse {
                status: "success".into(),
                message: "Worker launch accepted".into(),
            }),
        )),
        Err(e) => {
            warn!(error = %e, "Dispatch signal failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DispatchResponse {
                    status: "failure".into(),
                    message: e.to_string(),
                }),
            ))
        }
    }
}
