//! Single-consumer worker draining the job queue.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use descry_core::{
    defaults, CorrelationId, Error, ExtractionError, Extractor, Job, JobQueue, ModelSelector,
    NotificationStatus, QueueLease, Result,
};

use crate::classify::{
    classify, classify_retry, exhausted_message, parse_delays, FailureClass, RetryDecision,
    RetryPolicy,
};
use crate::notify::Notifier;

/// Configuration for the queue worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue is empty or the store failed.
    pub idle_interval: Duration,
    /// Backoff table and retry ceiling.
    pub retry: RetryPolicy,
    /// Upper bound for a single extraction call.
    pub extraction_timeout: Duration,
    /// Prefix for relative input paths.
    pub input_root: Option<PathBuf>,
    /// Whether to process jobs at all.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_secs(defaults::IDLE_INTERVAL_SECS),
            retry: RetryPolicy::default(),
            extraction_timeout: Duration::from_secs(defaults::EXTRACTION_TIMEOUT_SECS),
            input_root: None,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `IDLE_INTERVAL_SECS` | `5` | Sleep when the queue is empty |
    /// | `RETRY_DELAYS_SECS` | `5,10,20` | Backoff per retry attempt |
    /// | `MAX_RETRY_ATTEMPTS` | `3` | Transient failures before giving up |
    /// | `EXTRACTION_TIMEOUT_SECS` | `300` | Limit for one extraction |
    /// | `INPUT_ROOT` | unset | Prefix for relative input paths |
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let enabled = std::env::var(defaults::ENV_WORKER_ENABLED)
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let idle_interval_secs = std::env::var(defaults::ENV_IDLE_INTERVAL_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::IDLE_INTERVAL_SECS);

        let max_attempts = std::env::var(defaults::ENV_MAX_RETRY_ATTEMPTS)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults::MAX_RETRY_ATTEMPTS);

        let extraction_timeout_secs = std::env::var(defaults::ENV_EXTRACTION_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::EXTRACTION_TIMEOUT_SECS);

        let mut retry = RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        };
        if let Ok(value) = std::env::var(defaults::ENV_RETRY_DELAYS_SECS) {
            match parse_delays(&value) {
                Ok(delays) => retry.delays = delays,
                Err(e) => warn!(error = %e, "Ignoring RETRY_DELAYS_SECS, using defaults"),
            }
        }

        let input_root = std::env::var(defaults::ENV_INPUT_ROOT)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            idle_interval: Duration::from_secs(idle_interval_secs),
            retry,
            extraction_timeout: Duration::from_secs(extraction_timeout_secs),
            input_root,
            enabled,
        }
    }

    pub fn with_idle_interval(mut self, interval: Duration) -> Self {
        self.idle_interval = interval;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    pub fn with_input_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.input_root = Some(root.into());
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The queue was empty.
    Idle,
    /// Extraction succeeded and the job was removed.
    Completed,
    /// The job failed permanently or ran out of retries and was removed.
    Failed,
    /// A transient failure was counted; the job stays queued.
    Retrying(Duration),
    /// The job disappeared from the store while it was being processed.
    Cancelled,
    /// The store itself failed; nothing about the job was recorded.
    StoreError,
}

impl CycleOutcome {
    /// How long the loop sleeps before the next cycle, if at all.
    pub fn pause(&self, idle_interval: Duration) -> Option<Duration> {
        match self {
            Self::Idle | Self::StoreError => Some(idle_interval),
            Self::Retrying(delay) => Some(*delay),
            Self::Completed | Self::Failed | Self::Cancelled => None,
        }
    }
}

/// Event emitted by the queue worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// Worker started.
    WorkerStarted,
    /// A job was dequeued and extraction is about to run.
    JobStarted {
        job_id: i64,
        correlation_id: CorrelationId,
    },
    /// A job completed successfully.
    JobCompleted {
        job_id: i64,
        correlation_id: CorrelationId,
    },
    /// A transient failure was recorded.
    JobRetrying {
        job_id: i64,
        correlation_id: CorrelationId,
        retry_count: u32,
        delay: Duration,
    },
    /// A job failed for good.
    JobFailed {
        job_id: i64,
        correlation_id: CorrelationId,
        error: String,
    },
    /// A job was removed externally while it was in flight.
    JobCancelled {
        job_id: i64,
        correlation_id: CorrelationId,
    },
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    ///
    /// Sleeps are interrupted; an in-flight extraction runs to completion.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }

    /// Wait for the worker task to exit.
    pub async fn join(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Worker task failed: {e}")))
    }
}

/// Drains the queue one job at a time.
pub struct QueueWorker {
    queue: Arc<dyn JobQueue>,
    extractor: Arc<dyn Extractor>,
    notifier: Arc<dyn Notifier>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl QueueWorker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        extractor: Arc<dyn Extractor>,
        notifier: Arc<dyn Notifier>,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);
        Self {
            queue,
            extractor,
            notifier,
            config,
            event_tx,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        let task = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
            task,
        }
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Queue worker is disabled, not starting");
            return;
        }

        info!(
            subsystem = "jobs",
            component = "worker",
            idle_interval_ms = self.config.idle_interval.as_millis() as u64,
            max_attempts = self.config.retry.max_attempts,
            "Queue worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!("Queue worker received shutdown signal");
                break;
            }

            let outcome = self.run_cycle().await;

            if let Some(pause) = outcome.pause(self.config.idle_interval) {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Queue worker received shutdown signal");
                        break;
                    }
                    _ = sleep(pause) => {}
                }
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!("Queue worker stopped");
    }

    /// Process at most one job.
    ///
    /// The lease is held from dequeue through the terminal store update and
    /// dropped before returning, so the caller's sleep never holds it.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let lease = self.queue.acquire().await;
        match self.process_next(&lease).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    error = %e,
                    "Queue store error, backing off"
                );
                CycleOutcome::StoreError
            }
        }
    }

    async fn process_next(&self, lease: &QueueLease) -> Result<CycleOutcome> {
        let Some(job) = self.queue.peek_oldest(lease).await? else {
            debug!(subsystem = "jobs", component = "worker", "Queue empty");
            return Ok(CycleOutcome::Idle);
        };

        let start = Instant::now();
        info!(
            subsystem = "jobs",
            component = "worker",
            job_id = job.id,
            correlation_id = job.correlation_id.0,
            model = %job.model_selector,
            retry_count = job.retry_count,
            "Processing job"
        );
        self.notifier
            .status(job.correlation_id, NotificationStatus::InProgress)
            .await;
        self.emit(WorkerEvent::JobStarted {
            job_id: job.id,
            correlation_id: job.correlation_id,
        });

        match self.extract(&job).await {
            Ok(description) => {
                self.notifier
                    .description(job.correlation_id, &description)
                    .await;
                self.notifier
                    .status(job.correlation_id, NotificationStatus::Done)
                    .await;
                self.queue.delete(lease, job.id).await?;
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    job_id = job.id,
                    correlation_id = job.correlation_id.0,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job completed"
                );
                self.emit(WorkerEvent::JobCompleted {
                    job_id: job.id,
                    correlation_id: job.correlation_id,
                });
                Ok(CycleOutcome::Completed)
            }
            Err(err) => match classify(&err) {
                FailureClass::Permanent => {
                    self.fail(lease, &job, err.message()).await?;
                    Ok(CycleOutcome::Failed)
                }
                FailureClass::Transient => self.retry_or_give_up(lease, &job, &err).await,
            },
        }
    }

    async fn retry_or_give_up(
        &self,
        lease: &QueueLease,
        job: &Job,
        err: &ExtractionError,
    ) -> Result<CycleOutcome> {
        // A job can come back at the ceiling when its terminal delete failed.
        if job.retry_count >= self.config.retry.max_attempts {
            let message = exhausted_message(self.config.retry.max_attempts, err);
            self.fail(lease, job, &message).await?;
            return Ok(CycleOutcome::Failed);
        }

        let Some(retry_count) = self.queue.increment_retry(lease, job.id).await? else {
            info!(
                subsystem = "jobs",
                component = "worker",
                job_id = job.id,
                correlation_id = job.correlation_id.0,
                "Job was removed during extraction"
            );
            self.emit(WorkerEvent::JobCancelled {
                job_id: job.id,
                correlation_id: job.correlation_id,
            });
            return Ok(CycleOutcome::Cancelled);
        };

        match classify_retry(retry_count, &self.config.retry) {
            RetryDecision::GiveUp => {
                let message = exhausted_message(self.config.retry.max_attempts, err);
                self.fail(lease, job, &message).await?;
                Ok(CycleOutcome::Failed)
            }
            RetryDecision::Retry(delay) => {
                warn!(
                    subsystem = "jobs",
                    component = "worker",
                    job_id = job.id,
                    correlation_id = job.correlation_id.0,
                    retry_count,
                    max_attempts = self.config.retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry"
                );
                self.emit(WorkerEvent::JobRetrying {
                    job_id: job.id,
                    correlation_id: job.correlation_id,
                    retry_count,
                    delay,
                });
                Ok(CycleOutcome::Retrying(delay))
            }
        }
    }

    async fn fail(&self, lease: &QueueLease, job: &Job, message: &str) -> Result<()> {
        self.notifier.failure(job.correlation_id, message).await;
        self.queue.delete(lease, job.id).await?;
        error!(
            subsystem = "jobs",
            component = "worker",
            job_id = job.id,
            correlation_id = job.correlation_id.0,
            error = message,
            "Job failed"
        );
        self.emit(WorkerEvent::JobFailed {
            job_id: job.id,
            correlation_id: job.correlation_id,
            error: message.to_string(),
        });
        Ok(())
    }

    /// Run the extractor with panics and the timeout folded into
    /// [`ExtractionError::Unclassified`].
    async fn extract(&self, job: &Job) -> std::result::Result<String, ExtractionError> {
        let model: ModelSelector = job.model_selector.parse()?;
        let path = self.resolve_path(&job.input_path);

        let call = AssertUnwindSafe(self.extractor.extract(&path, model)).catch_unwind();
        match tokio::time::timeout(self.config.extraction_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(ExtractionError::Unclassified(format!(
                "Extraction panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Err(_) => Err(ExtractionError::Unclassified(format!(
                "Extraction exceeded timeout of {}s",
                self.config.extraction_timeout.as_secs()
            ))),
        }
    }

    fn resolve_path(&self, input_path: &str) -> String {
        match &self.config.input_root {
            Some(root) if Path::new(input_path).is_relative() => {
                root.join(input_path).display().to_string()
            }
            _ => input_path.to_string(),
        }
    }

    fn emit(&self, event: WorkerEvent) {
        let _ = self.event_tx.send(event);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
