//! SQLite implementation of the job queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use descry_core::{CorrelationId, Error, Job, JobQueue, NewJob, QueueLease, QueueLock, Result};

/// SQLite-backed FIFO queue.
///
/// Clones share the pool and the worker lock.
#[derive(Debug, Clone)]
pub struct SqliteJobQueue {
    pool: SqlitePool,
    lock: QueueLock,
}

impl SqliteJobQueue {
    /// Create a queue over an already-migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            lock: QueueLock::new(),
        }
    }

    fn check_lease(&self, lease: &QueueLease) -> Result<()> {
        if self.lock.issued(lease) {
            Ok(())
        } else {
            Err(Error::Internal(
                "queue lease was issued by a different store".to_string(),
            ))
        }
    }

    fn parse_job_row(row: SqliteRow) -> Result<Job> {
        let retry_count: i64 = row.try_get("retry_count").map_err(Error::Database)?;
        let enqueued_at: Option<DateTime<Utc>> =
            row.try_get("enqueued_at").map_err(Error::Database)?;
        Ok(Job {
            id: row.try_get("id").map_err(Error::Database)?,
            correlation_id: CorrelationId(row.try_get("correlation_id").map_err(Error::Database)?),
            input_path: row.try_get("input_path").map_err(Error::Database)?,
            model_selector: row.try_get("model_selector").map_err(Error::Database)?,
            retry_count: to_retry_count(retry_count)?,
            enqueued_at,
        })
    }
}

fn to_retry_count(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::Internal(format!("retry_count out of range: {value}")))
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: NewJob) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO jobs (correlation_id, input_path, model_selector, retry_count, enqueued_at)
             VALUES (?, ?, ?, 0, ?)
             RETURNING id",
        )
        .bind(job.correlation_id.0)
        .bind(&job.input_path)
        .bind(job.model_selector.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "queue",
            op = "enqueue",
            job_id = id,
            correlation_id = job.correlation_id.0,
            model = job.model_selector.as_str(),
            "Job enqueued"
        );
        Ok(id)
    }

    async fn acquire(&self) -> QueueLease {
        self.lock.acquire().await
    }

    async fn peek_oldest(&self, lease: &QueueLease) -> Result<Option<Job>> {
        self.check_lease(lease)?;
        let row = sqlx::query(
            "SELECT id, correlation_id, input_path, model_selector,
                    COALESCE(retry_count, 0) AS retry_count, enqueued_at
             FROM jobs
             ORDER BY id
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_job_row).transpose()
    }

    async fn delete(&self, lease: &QueueLease, job_id: i64) -> Result<()> {
        self.check_lease(lease)?;
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            debug!(
                subsystem = "db",
                component = "queue",
                op = "delete",
                job_id,
                "Job already gone"
            );
        }
        Ok(())
    }

    async fn increment_retry(&self, lease: &QueueLease, job_id: i64) -> Result<Option<u32>> {
        self.check_lease(lease)?;
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE jobs SET retry_count = COALESCE(retry_count, 0) + 1
             WHERE id = ?
             RETURNING retry_count",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        count.map(to_retry_count).transpose()
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn remove_by_correlation_id(&self, correlation_id: CorrelationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE correlation_id = ?")
            .bind(correlation_id.0)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "queue",
            op = "remove_by_correlation_id",
            correlation_id = correlation_id.0,
            removed = result.rows_affected(),
            "Removed jobs by correlation id"
        );
        Ok(result.rows_affected() > 0)
    }
}
