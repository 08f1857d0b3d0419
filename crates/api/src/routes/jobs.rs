//! Route definitions for the `/jobs` resource.
//!
//! All endpoints require authentication; the progress WebSocket
//! re-checks job ownership at subscribe time.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{jobs, outputs};
use crate::state::AppState;
use crate::ws;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /                    -> create_job
/// GET    /{id}                -> get_job
/// DELETE /{id}                -> delete_job
/// PUT    /{id}/placement      -> set_placement
/// POST   /{id}/process        -> process_job
/// GET    /{id}/feed-preview   -> feed_preview
/// GET    /{id}/outputs        -> list_outputs
/// GET    /{id}/progress       -> progress WebSocket
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(jobs::create_job))
        .route("/{id}", get(jobs::get_job).delete(jobs::delete_job))
        .route("/{id}/placement", put(jobs::set_placement))
        .route("/{id}/process", post(jobs::process_job))
        .route("/{id}/feed-preview", get(jobs::feed_preview))
        .route("/{id}/outputs", get(outputs::list_outputs))
        .route("/{id}/progress", get(ws::progress_handler))
}
