//! Handlers for composite outputs: paginated listing under a job, and
//! owner-scoped deletion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use feedframe_core::error::CoreError;
use feedframe_core::types::{DbId, Timestamp};
use feedframe_db::models::output::{Output, OutputListQuery};
use feedframe_db::repositories::{JobRepo, OutputRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::jobs::find_and_authorize;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// One row of the output listing.
#[derive(Debug, Serialize)]
pub struct OutputItem {
    pub id: DbId,
    pub product_id: String,
    /// Storage-relative address of the composited image; `None` when
    /// the entry failed on the most recent run.
    pub image_url: Option<String>,
    pub created_at: Timestamp,
}

impl From<Output> for OutputItem {
    fn from(output: Output) -> Self {
        Self {
            id: output.id,
            product_id: output.product_id,
            image_url: output.result_path,
            created_at: output.created_at,
        }
    }
}

/// Paginated listing payload: one bounded page plus the total match
/// count for the current filter.
#[derive(Debug, Serialize)]
pub struct OutputPage {
    pub total: i64,
    pub page: Vec<OutputItem>,
}

/// GET /api/v1/jobs/{id}/outputs?offset&limit&search
///
/// List one job's outputs newest-first, optionally filtered by a
/// case-insensitive substring of the product id.
pub async fn list_outputs(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
    Query(params): Query<OutputListQuery>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, job_id, &auth, "view outputs of").await?;

    let (rows, total) = OutputRepo::list(&state.pool, job_id, &params).await?;
    let page = rows.into_iter().map(OutputItem::from).collect();

    Ok(Json(DataResponse {
        data: OutputPage { total, page },
    }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/outputs/{id}
///
/// Remove one output record and its backing bytes, scoped to the job
/// owner. Deleting an id that is already gone succeeds idempotently;
/// the anomaly is logged.
pub async fn delete_output(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(output_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let Some(output) = OutputRepo::find_by_id(&state.pool, output_id).await? else {
        tracing::warn!(output_id, "Deleting already-absent output");
        return Ok(StatusCode::NO_CONTENT);
    };

    // Ownership is carried by the job, not the output row.
    let job = JobRepo::find_by_id(&state.pool, output.job_id)
        .await?
        .ok_or(AppError::Core(CoreError::Internal(format!(
            "Output {output_id} references missing job {}",
            output.job_id
        ))))?;
    if job.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot delete another user's output".into(),
        )));
    }

    OutputRepo::delete(&state.pool, output_id).await?;

    if let Some(ref result_path) = output.result_path {
        if let Err(e) = state.store.remove(result_path).await {
            tracing::warn!(output_id, error = %e, "Failed to remove output bytes");
        }
    }

    tracing::info!(output_id, product_id = %output.product_id, "Output deleted");

    Ok(StatusCode::NO_CONTENT)
}
