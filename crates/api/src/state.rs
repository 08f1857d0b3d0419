use std::sync::Arc;

use feedframe_events::ProgressHub;
use feedframe_pipeline::{ImageStore, JobRunner};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: feedframe_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Filesystem store for template and output bytes.
    pub store: ImageStore,
    /// Topic-keyed progress pub/sub hub.
    pub hub: Arc<ProgressHub>,
    /// The job orchestrator shared by trigger handlers.
    pub runner: Arc<JobRunner>,
}
