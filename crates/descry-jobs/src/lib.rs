//! # descry-jobs
//!
//! Queue worker for descry.
//!
//! This crate provides:
//! - A single-consumer worker that drains the queue in id order
//! - Permanent/transient failure classification and a backoff retry policy
//! - Best-effort HTTP notifications of job status and descriptions
//! - The enqueue/remove/count service used by the API
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use descry_db::Database;
//! use descry_inference::ExtractorRegistry;
//! use descry_jobs::{HttpNotifier, QueueWorker, WorkerConfig};
//!
//! let db = Database::connect("sqlite://descry_queue.db").await?;
//! db.migrate().await?;
//!
//! let worker = QueueWorker::new(
//!     Arc::new(db.queue.clone()),
//!     Arc::new(ExtractorRegistry::from_env()),
//!     Arc::new(HttpNotifier::from_env()),
//!     WorkerConfig::from_env(),
//! );
//! let handle = worker.start();
//!
//! // Graceful shutdown
//! handle.shutdown().await?;
//! ```

pub mod classify;
pub mod notify;
pub mod service;
pub mod worker;

pub use classify::{
    classify, classify_retry, exhausted_message, parse_delays, FailureClass, RetryDecision,
    RetryPolicy,
};
pub use notify::{HttpNotifier, Notifier};
pub use service::QueueService;
pub use worker::{CycleOutcome, QueueWorker, WorkerConfig, WorkerEvent, WorkerHandle};
