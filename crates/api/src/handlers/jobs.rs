//! Handlers for the `/jobs` resource.
//!
//! All endpoints require authentication via [`AuthUser`], and every
//! job-scoped endpoint re-checks ownership against the job row -- there
//! is no cached authorization.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use feedframe_core::error::CoreError;
use feedframe_core::rect::PlacementRect;
use feedframe_core::types::DbId;
use feedframe_db::models::job::{CreateJob, Job};
use feedframe_db::repositories::{JobRepo, OutputRepo};
use feedframe_pipeline::store;
use feedframe_pipeline::{ExecutionMode, JobDescriptor};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a job by ID and verify the caller owns it.
///
/// Returns `NotFound` if the job does not exist, `Forbidden` if the
/// caller is not the owner. `action` is used in the error message
/// (e.g. "view", "process", "delete").
pub(crate) async fn find_and_authorize(
    pool: &sqlx::PgPool,
    job_id: DbId,
    auth: &AuthUser,
    action: &str,
) -> AppResult<Job> {
    let job = JobRepo::find_by_id(pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    if job.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Cannot {action} another user's job"
        ))));
    }

    Ok(job)
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/jobs`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Storage-relative path of an already-uploaded template image.
    #[validate(length(min = 1))]
    pub template_path: String,
    #[validate(url)]
    pub feed_url: String,
    /// Optional; most jobs get their placement later via
    /// `PUT /jobs/{id}/placement`.
    pub placement: Option<PlacementRect>,
}

/// POST /api/v1/jobs
///
/// Create a job definition. Returns 201 with the created job.
pub async fn create_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateJobRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if let Some(rect) = input.placement {
        rect.validate()?;
    }

    let job = JobRepo::create(
        &state.pool,
        auth.user_id,
        &CreateJob {
            name: input.name,
            template_path: input.template_path,
            feed_url: input.feed_url,
            placement: input.placement,
        },
    )
    .await?;

    tracing::info!(job_id = job.id, owner_id = auth.user_id, "Job created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: job })))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_and_authorize(&state.pool, job_id, &auth, "view").await?;
    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// PUT /api/v1/jobs/{id}/placement
///
/// Set or replace the placement rect. Validation happens here, at
/// submission time; the pipeline assumes stored placements are valid.
pub async fn set_placement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Json(rect): Json<PlacementRect>,
) -> AppResult<impl IntoResponse> {
    rect.validate()?;
    find_and_authorize(&state.pool, job_id, &auth, "configure").await?;

    let job = JobRepo::set_placement(&state.pool, job_id, rect)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    tracing::info!(job_id, "Placement updated");

    Ok(Json(DataResponse { data: job }))
}

// ---------------------------------------------------------------------------
// Process (the trigger)
// ---------------------------------------------------------------------------

/// Response body for `POST /api/v1/jobs/{id}/process`.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub job_id: DbId,
    /// The execution mode the run was submitted under.
    pub mode: &'static str,
}

/// POST /api/v1/jobs/{id}/process
///
/// Trigger a processing run for the job. Under `spawned` execution the
/// response is 202 and the run proceeds in the background; under
/// `inline` the response is 200 after the run has finished. Either way
/// progress is observable on the job's WebSocket topic, and re-running
/// converges on the same output set via the upsert key.
pub async fn process_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_and_authorize(&state.pool, job_id, &auth, "process").await?;

    let mode = state.config.execution_mode;
    let descriptor = JobDescriptor::from_job(&job);

    tracing::info!(job_id, mode = mode.name(), "Submitting processing run");
    Arc::clone(&state.runner).submit(descriptor, mode).await;

    let status = match mode {
        ExecutionMode::Spawned => StatusCode::ACCEPTED,
        ExecutionMode::Inline => StatusCode::OK,
    };

    Ok((
        status,
        Json(DataResponse {
            data: ProcessResponse {
                job_id,
                mode: mode.name(),
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Feed preview
// ---------------------------------------------------------------------------

/// Response body for `GET /api/v1/jobs/{id}/feed-preview`.
#[derive(Debug, Serialize)]
pub struct FeedPreviewResponse {
    /// First product image URL in the feed, if the feed has any.
    pub first_image_url: Option<String>,
}

/// GET /api/v1/jobs/{id}/feed-preview
///
/// Fetch the job's feed and return the first product image URL, for
/// positioning the placement rect against a real product image.
pub async fn feed_preview(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = find_and_authorize(&state.pool, job_id, &auth, "preview").await?;

    let first_image_url = state
        .runner
        .fetcher()
        .first_image_url(&job.feed_url)
        .await
        .map_err(|e| AppError::BadRequest(format!("Feed fetch failed: {e}")))?;

    Ok(Json(DataResponse {
        data: FeedPreviewResponse { first_image_url },
    }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/jobs/{id}
///
/// Delete the job, all its output records (explicit batch removal, no
/// FK cascade), their backing bytes, and the template image. Byte
/// removal failures are logged but do not fail the request.
pub async fn delete_job(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let job = find_and_authorize(&state.pool, job_id, &auth, "delete").await?;

    let removed = OutputRepo::delete_all_for_job(&state.pool, job_id).await?;

    if let Err(e) = state.store.remove_dir(&store::job_dir(job_id)).await {
        tracing::warn!(job_id, error = %e, "Failed to remove job output directory");
    }
    if let Err(e) = state.store.remove(&job.template_path).await {
        tracing::warn!(job_id, error = %e, "Failed to remove template image");
    }

    JobRepo::delete(&state.pool, job_id).await?;

    tracing::info!(job_id, removed, "Job deleted with its outputs");

    Ok(StatusCode::NO_CONTENT)
}
