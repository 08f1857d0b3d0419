//! Route definitions for the `/outputs` resource.
//!
//! Listing lives under `/jobs/{id}/outputs`; only the single-record
//! delete is addressed by output id.

use axum::routing::delete;
use axum::Router;

use crate::handlers::outputs;
use crate::state::AppState;

/// Routes mounted at `/outputs`.
///
/// ```text
/// DELETE /{id} -> delete_output
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", delete(outputs::delete_output))
}
