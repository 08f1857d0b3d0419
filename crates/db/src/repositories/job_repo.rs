//! Repository for the `jobs` table.

use sqlx::PgPool;

use feedframe_core::rect::PlacementRect;
use feedframe_core::types::DbId;

use crate::models::job::{CreateJob, Job};

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, name, owner_id, template_path, feed_url, placement, created_at";

/// Provides CRUD operations for job definitions.
pub struct JobRepo;

impl JobRepo {
    /// Create a new job owned by `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateJob,
    ) -> Result<Job, sqlx::Error> {
        let placement = input.placement.map(|rect| rect.to_json());

        let query = format!(
            "INSERT INTO jobs (name, owner_id, template_path, feed_url, placement) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(&input.name)
            .bind(owner_id)
            .bind(&input.template_path)
            .bind(&input.feed_url)
            .bind(placement)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the placement rect. Returns the updated job, or `None`
    /// if it does not exist.
    pub async fn set_placement(
        pool: &PgPool,
        id: DbId,
        rect: PlacementRect,
    ) -> Result<Option<Job>, sqlx::Error> {
        let placement = rect.to_json();

        let query = format!(
            "UPDATE jobs SET placement = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(placement)
            .fetch_optional(pool)
            .await
    }

    /// Delete a job row. Returns `true` if a row was deleted.
    ///
    /// Callers must remove the job's outputs first
    /// (`OutputRepo::delete_all_for_job`); there is no cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
