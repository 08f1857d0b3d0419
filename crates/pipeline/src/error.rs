//! Pipeline error taxonomy.
//!
//! [`PipelineError`] covers only job-fatal conditions -- the ones that
//! terminate a run with a single error event. Entry-local failures
//! ([`CompositeError`](crate::compositor::CompositeError), output
//! store/database write failures) never surface here; the runner
//! records or logs them and keeps the loop going.

use crate::feed::FeedError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The job descriptor cannot be run (missing or invalid placement).
    #[error("Job is not runnable: {0}")]
    Config(String),

    /// The feed could not be retrieved or parsed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// The template image could not be loaded from storage.
    #[error(transparent)]
    Store(#[from] StoreError),
}
