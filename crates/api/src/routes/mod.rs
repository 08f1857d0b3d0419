pub mod health;
pub mod jobs;
pub mod outputs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs                       create (POST)
/// /jobs/{id}                  get, delete
/// /jobs/{id}/placement        set placement rect (PUT)
/// /jobs/{id}/process          trigger a processing run (POST)
/// /jobs/{id}/feed-preview     first feed image URL (GET)
/// /jobs/{id}/outputs          paginated output listing (GET)
/// /jobs/{id}/progress         live progress WebSocket
///
/// /outputs/{id}               delete one output (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/outputs", outputs::router())
}
