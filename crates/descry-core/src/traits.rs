//! Core traits for descry abstractions.
//!
//! These traits define the seams between the worker loop and its
//! collaborators so that stores and extraction backends can be swapped in
//! tests.

use async_trait::async_trait;

use crate::error::{ExtractionError, Result};
use crate::lease::QueueLease;
use crate::models::*;

// =============================================================================
// JOB QUEUE
// =============================================================================

/// Durable FIFO queue of pending jobs.
///
/// Worker-side operations take a [`QueueLease`] issued by [`JobQueue::acquire`].
/// External operations run without it.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Insert a job with `retry_count = 0` and return its id.
    async fn enqueue(&self, job: NewJob) -> Result<i64>;

    /// Take the single-consumer lease.
    async fn acquire(&self) -> QueueLease;

    /// Oldest pending job, if any. Does not remove it.
    async fn peek_oldest(&self, lease: &QueueLease) -> Result<Option<Job>>;

    /// Delete a job by id. Missing ids are not an error.
    async fn delete(&self, lease: &QueueLease, job_id: i64) -> Result<()>;

    /// Atomically increment the retry count and return the new value.
    ///
    /// Returns `None` when the row no longer exists.
    async fn increment_retry(&self, lease: &QueueLease, job_id: i64) -> Result<Option<u32>>;

    /// Number of pending jobs.
    async fn count(&self) -> Result<i64>;

    /// Delete every job carrying `correlation_id`. Returns whether any existed.
    async fn remove_by_correlation_id(&self, correlation_id: CorrelationId) -> Result<bool>;
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Produces a text description for an input artifact.
///
/// An empty description is a valid result.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        input_path: &str,
        model: ModelSelector,
    ) -> std::result::Result<String, ExtractionError>;
}
