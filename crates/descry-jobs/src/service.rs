//! Queue operations exposed to the API layer.

use std::sync::Arc;

use tracing::info;

use descry_core::{CorrelationId, JobQueue, NewJob, NotificationStatus, Result};

use crate::notify::Notifier;

/// Enqueue, cancel and count, each paired with its receiver notification.
///
/// None of these take the worker lease.
#[derive(Clone)]
pub struct QueueService {
    queue: Arc<dyn JobQueue>,
    notifier: Arc<dyn Notifier>,
}

impl QueueService {
    pub fn new(queue: Arc<dyn JobQueue>, notifier: Arc<dyn Notifier>) -> Self {
        Self { queue, notifier }
    }

    /// Persist a job, then report it as queued.
    pub async fn enqueue(&self, job: NewJob) -> Result<i64> {
        let correlation_id = job.correlation_id;
        let id = self.queue.enqueue(job).await?;
        self.notifier
            .status(correlation_id, NotificationStatus::Queued)
            .await;
        info!(
            subsystem = "jobs",
            component = "service",
            op = "enqueue",
            job_id = id,
            correlation_id = correlation_id.0,
            "Job added to queue"
        );
        Ok(id)
    }

    /// Remove every job for `correlation_id`.
    ///
    /// Reports `NotStarted` when something was removed and `Done` when nothing
    /// was queued. Returns whether a job existed.
    pub async fn remove(&self, correlation_id: CorrelationId) -> Result<bool> {
        let existed = self.queue.remove_by_correlation_id(correlation_id).await?;
        let status = if existed {
            NotificationStatus::NotStarted
        } else {
            NotificationStatus::Done
        };
        self.notifier.status(correlation_id, status).await;
        info!(
            subsystem = "jobs",
            component = "service",
            op = "remove",
            correlation_id = correlation_id.0,
            existed,
            "Job removal requested"
        );
        Ok(existed)
    }

    /// Number of pending jobs.
    pub async fn count(&self) -> Result<i64> {
        self.queue.count().await
    }
}
