//! Job entity model and DTOs.
//!
//! A job ties a template image to a product feed and a placement rect.
//! There is no persisted run status: run state exists only as live
//! progress events while a run is in flight.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use feedframe_core::rect::PlacementRect;
use feedframe_core::types::{DbId, Timestamp};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub name: String,
    pub owner_id: DbId,
    /// Storage-relative path of the template image.
    pub template_path: String,
    pub feed_url: String,
    /// Serialized [`PlacementRect`]; `None` until positioned.
    pub placement: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for creating a job via `POST /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct CreateJob {
    pub name: String,
    pub template_path: String,
    pub feed_url: String,
    /// Optional at creation; usually set later once the owner has
    /// positioned the product image on the template.
    pub placement: Option<PlacementRect>,
}
