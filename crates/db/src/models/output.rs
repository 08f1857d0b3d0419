//! Output entity model and DTOs.
//!
//! One output row per (job, product) pair; reruns overwrite the row in
//! place rather than inserting a second one.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use feedframe_core::types::{DbId, Timestamp};

/// A row from the `outputs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Output {
    pub id: DbId,
    pub job_id: DbId,
    pub product_id: String,
    pub source_image_url: String,
    /// Storage-relative path of the composited PNG; `None` means the
    /// entry failed to composite on the most recent run.
    pub result_path: Option<String>,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /api/v1/jobs/{id}/outputs`.
#[derive(Debug, Default, Deserialize)]
pub struct OutputListQuery {
    /// Case-insensitive substring filter on `product_id`.
    pub search: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
