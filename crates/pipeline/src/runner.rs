//! The job orchestrator: drives fetch → composite → persist → notify
//! for one job, end to end.
//!
//! Entries are processed strictly sequentially, in feed order. A fatal
//! condition (missing placement, unreadable template, feed failure)
//! publishes exactly one error event and ends the run; everything else
//! is entry-local and the loop keeps going. There is no cancellation:
//! a started run goes to completion or to its fatal error.

use std::sync::Arc;

use sqlx::PgPool;

use feedframe_core::error::CoreError;
use feedframe_core::rect::PlacementRect;
use feedframe_core::types::DbId;
use feedframe_db::models::job::Job;
use feedframe_db::repositories::OutputRepo;
use feedframe_events::{ProgressEvent, ProgressHub};

use crate::compositor::Compositor;
use crate::error::PipelineError;
use crate::feed::FeedFetcher;
use crate::store::{self, ImageStore};

// ---------------------------------------------------------------------------
// ExecutionMode
// ---------------------------------------------------------------------------

/// How a submitted job is executed. Chosen once from configuration --
/// there is no fallback from one mode to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Fire-and-forget: the run is spawned onto the runtime and the
    /// caller returns immediately.
    #[default]
    Spawned,
    /// The caller awaits the run in place. Same pipeline, same events.
    Inline,
}

impl ExecutionMode {
    /// Parse from the `EXECUTION_MODE` configuration value.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "spawned" => Ok(Self::Spawned),
            "inline" => Ok(Self::Inline),
            other => Err(CoreError::Validation(format!(
                "Unknown execution mode '{other}'. Must be one of: spawned, inline"
            ))),
        }
    }

    /// Configuration name value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Spawned => "spawned",
            Self::Inline => "inline",
        }
    }
}

// ---------------------------------------------------------------------------
// JobDescriptor
// ---------------------------------------------------------------------------

/// Everything a run needs, passed by value into the executing task.
/// Deliberately self-contained: no session or request state leaks into
/// the pipeline.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub job_id: DbId,
    /// Storage-relative path of the template image.
    pub template_path: String,
    pub feed_url: String,
    /// Raw stored placement; validated at the top of the run.
    pub placement: Option<serde_json::Value>,
}

impl JobDescriptor {
    /// Build a descriptor from a job row.
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id,
            template_path: job.template_path.clone(),
            feed_url: job.feed_url.clone(),
            placement: job.placement.clone(),
        }
    }
}

/// Counters from a completed (non-fatal) run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub processed: u32,
    pub total: u32,
    pub succeeded: u32,
}

// ---------------------------------------------------------------------------
// JobRunner
// ---------------------------------------------------------------------------

/// Orchestrates one job: feed fetch, per-entry composite, idempotent
/// persistence, and per-entry progress publication.
///
/// Shared via `Arc` between the API handlers; safe to drive any number
/// of concurrent jobs (they share only the pool, the store root, and
/// the hub).
pub struct JobRunner {
    pool: PgPool,
    store: ImageStore,
    hub: Arc<ProgressHub>,
    fetcher: FeedFetcher,
    compositor: Compositor,
}

impl JobRunner {
    /// Create a runner. `client` should carry a bounded timeout; it is
    /// shared by the feed fetch and every product-image fetch.
    pub fn new(
        pool: PgPool,
        store: ImageStore,
        hub: Arc<ProgressHub>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            pool,
            store,
            hub,
            fetcher: FeedFetcher::new(client.clone()),
            compositor: Compositor::new(client),
        }
    }

    /// Access the fetcher (used by the feed-preview endpoint).
    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// Submit a run under the given execution mode.
    ///
    /// `Spawned` returns as soon as the task is scheduled; `Inline`
    /// returns after the run finishes. Both execute the identical
    /// [`run`](Self::run) future.
    pub async fn submit(self: Arc<Self>, descriptor: JobDescriptor, mode: ExecutionMode) {
        match mode {
            ExecutionMode::Spawned => {
                tokio::spawn(async move {
                    self.run(&descriptor).await;
                });
            }
            ExecutionMode::Inline => self.run(&descriptor).await,
        }
    }

    /// Drive one job to completion or to its fatal error.
    ///
    /// Fatal conditions publish exactly one error event on the job's
    /// topic. Per-entry failures are recorded as null-result outputs
    /// and never abort the run.
    pub async fn run(&self, job: &JobDescriptor) {
        tracing::info!(job_id = job.job_id, feed_url = %job.feed_url, "Starting feed processing run");

        match self.execute(job).await {
            Ok(summary) => {
                tracing::info!(
                    job_id = job.job_id,
                    processed = summary.processed,
                    total = summary.total,
                    succeeded = summary.succeeded,
                    "Feed processing completed",
                );
            }
            Err(e) => {
                tracing::error!(job_id = job.job_id, error = %e, "Feed processing failed");
                self.hub
                    .publish(job.job_id, ProgressEvent::error(e.to_string()))
                    .await;
            }
        }
    }

    async fn execute(&self, job: &JobDescriptor) -> Result<RunSummary, PipelineError> {
        // A job without a valid placement never enters the loop.
        let rect = match &job.placement {
            None => {
                return Err(PipelineError::Config(
                    "no placement rect configured".into(),
                ))
            }
            Some(value) => PlacementRect::from_json(value)
                .map_err(|e| PipelineError::Config(e.to_string()))?,
        };

        let template = self.store.read(&job.template_path).await?;

        let entries = self.fetcher.fetch(&job.feed_url).await?;
        let total = entries.len() as u32;
        tracing::info!(job_id = job.job_id, total, "Fetched feed entries");

        let mut processed = 0u32;
        let mut succeeded = 0u32;

        for entry in entries {
            let result_path = match self
                .compositor
                .composite(&template, &entry.image_url, rect)
                .await
            {
                Ok(bytes) => {
                    let rel_path = store::output_path(job.job_id, &entry.product_id);
                    match self.store.put(&rel_path, &bytes).await {
                        Ok(()) => {
                            succeeded += 1;
                            Some(rel_path)
                        }
                        Err(e) => {
                            tracing::error!(
                                job_id = job.job_id,
                                product_id = %entry.product_id,
                                error = %e,
                                "Failed to store composited output",
                            );
                            None
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        job_id = job.job_id,
                        product_id = %entry.product_id,
                        error = %e,
                        "Entry failed to composite",
                    );
                    None
                }
            };

            // The failure case is recorded too: a null result path
            // marks the entry as attempted-and-failed for this run.
            if let Err(e) = OutputRepo::upsert(
                &self.pool,
                job.job_id,
                &entry.product_id,
                &entry.image_url,
                result_path.as_deref(),
            )
            .await
            {
                tracing::error!(
                    job_id = job.job_id,
                    product_id = %entry.product_id,
                    error = %e,
                    "Failed to persist output record",
                );
            }

            processed += 1;
            self.hub
                .publish(
                    job.job_id,
                    ProgressEvent::entry(processed, total, entry.product_id),
                )
                .await;
        }

        Ok(RunSummary {
            processed,
            total,
            succeeded,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_mode_from_name() {
        assert_eq!(ExecutionMode::from_name("spawned").unwrap(), ExecutionMode::Spawned);
        assert_eq!(ExecutionMode::from_name("inline").unwrap(), ExecutionMode::Inline);
        assert!(ExecutionMode::from_name("async").is_err());
        assert!(ExecutionMode::from_name("").is_err());
    }

    #[test]
    fn execution_mode_names_roundtrip() {
        for mode in [ExecutionMode::Spawned, ExecutionMode::Inline] {
            assert_eq!(ExecutionMode::from_name(mode.name()).unwrap(), mode);
        }
    }

    #[test]
    fn default_mode_is_spawned() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Spawned);
    }
}
