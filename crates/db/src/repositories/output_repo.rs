//! Repository for the `outputs` table.
//!
//! The table is keyed UNIQUE (job_id, product_id); every write goes
//! through [`OutputRepo::upsert`] so reruns of a job converge on one
//! row per product instead of accumulating duplicates.

use sqlx::PgPool;

use feedframe_core::types::DbId;

use crate::models::output::{Output, OutputListQuery};

/// Column list for `outputs` queries.
const COLUMNS: &str = "id, job_id, product_id, source_image_url, result_path, created_at";

/// Maximum page size for output listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for output listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides write and query operations for per-entry composite outputs.
pub struct OutputRepo;

impl OutputRepo {
    /// Insert or overwrite the record at (job_id, product_id).
    ///
    /// `result_path` is `None` when the entry failed to composite; the
    /// failure is recorded, not dropped. `created_at` is refreshed on
    /// overwrite so newest-first ordering reflects the latest run.
    /// Duplicate product ids within one feed resolve to last-write-wins.
    pub async fn upsert(
        pool: &PgPool,
        job_id: DbId,
        product_id: &str,
        source_image_url: &str,
        result_path: Option<&str>,
    ) -> Result<Output, sqlx::Error> {
        let query = format!(
            "INSERT INTO outputs (job_id, product_id, source_image_url, result_path) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (job_id, product_id) DO UPDATE \
             SET source_image_url = EXCLUDED.source_image_url, \
                 result_path = EXCLUDED.result_path, \
                 created_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Output>(&query)
            .bind(job_id)
            .bind(product_id)
            .bind(source_image_url)
            .bind(result_path)
            .fetch_one(pool)
            .await
    }

    /// Find an output by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Output>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM outputs WHERE id = $1");
        sqlx::query_as::<_, Output>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one job's outputs, newest first, with an optional
    /// case-insensitive substring filter on `product_id`.
    ///
    /// Returns the bounded page together with the total match count so
    /// callers can paginate.
    pub async fn list(
        pool: &PgPool,
        job_id: DbId,
        params: &OutputListQuery,
    ) -> Result<(Vec<Output>, i64), sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(0, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);
        let search = params
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let filter = if search.is_some() {
            "AND product_id ILIKE $2"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM outputs WHERE job_id = $1 {filter}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query).bind(job_id);
        if let Some(ref pattern) = search {
            count_q = count_q.bind(pattern);
        }
        let total = count_q.fetch_one(pool).await?;

        let (limit_idx, offset_idx) = if search.is_some() { (3, 4) } else { (2, 3) };
        let page_query = format!(
            "SELECT {COLUMNS} FROM outputs \
             WHERE job_id = $1 {filter} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${limit_idx} OFFSET ${offset_idx}"
        );
        let mut page_q = sqlx::query_as::<_, Output>(&page_query).bind(job_id);
        if let Some(ref pattern) = search {
            page_q = page_q.bind(pattern);
        }
        let page = page_q.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok((page, total))
    }

    /// Delete an output row, returning the deleted row so the caller
    /// can remove its backing bytes. Deleting an id that is already
    /// gone returns `None` and is not an error.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Output>, sqlx::Error> {
        let query = format!("DELETE FROM outputs WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Output>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Remove every output belonging to `job_id`. Explicit batch
    /// operation invoked when the job itself is deleted; returns the
    /// number of rows removed.
    pub async fn delete_all_for_job(pool: &PgPool, job_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM outputs WHERE job_id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        let removed = result.rows_affected();
        tracing::debug!(job_id, removed, "Removed all outputs for job");
        Ok(removed)
    }
}
