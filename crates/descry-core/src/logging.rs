//! Structured logging field names for descry.
//!
//! All crates use these names for `tracing` fields so the queue, worker,
//! notifier and API logs can be filtered the same way.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Store failures, permanently failed jobs |
//! | WARN  | Transient failures, undelivered notifications |
//! | INFO  | Lifecycle events, job start/finish |
//! | DEBUG | Idle polls, decision points, config choices |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "worker", "notifier", "queue", "pool", "vision"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "peek_oldest", "increment_retry", "status", "extract"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Queue row id.
pub const JOB_ID: &str = "job_id";

/// External identifier of the item a job describes.
pub const CORRELATION_ID: &str = "correlation_id";

/// Extraction model selector.
pub const MODEL: &str = "model";

/// Path of the input artifact.
pub const INPUT_PATH: &str = "input_path";

// ─── Retry fields ──────────────────────────────────────────────────────────

/// Retry count after the latest increment.
pub const RETRY_COUNT: &str = "retry_count";

/// Configured retry ceiling.
pub const MAX_ATTEMPTS: &str = "max_attempts";

/// Backoff delay before the next poll, in milliseconds.
pub const DELAY_MS: &str = "delay_ms";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of pending jobs.
pub const QUEUE_LENGTH: &str = "queue_length";

/// HTTP status code returned by a remote endpoint.
pub const HTTP_STATUS: &str = "http_status";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_snake_case() {
        for name in [
            SUBSYSTEM,
            COMPONENT,
            OPERATION,
            JOB_ID,
            CORRELATION_ID,
            MODEL,
            INPUT_PATH,
            RETRY_COUNT,
            MAX_ATTEMPTS,
            DELAY_MS,
            DURATION_MS,
            QUEUE_LENGTH,
            HTTP_STATUS,
            ERROR_MSG,
        ] {
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
