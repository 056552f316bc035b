//! Failure classification and the retry policy.
//!
//! Both functions here are pure so that the worker's threshold logic can be
//! tested without a store or an extractor.

use std::time::Duration;

use descry_core::{defaults, Error, ExtractionError, Result};

/// How the worker reacts to a failed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Delete the job and report failure.
    Permanent,
    /// Count a retry and try again later.
    Transient,
}

/// Unclassified failures are retried like transient ones.
pub fn classify(err: &ExtractionError) -> FailureClass {
    match err {
        ExtractionError::Permanent(_) => FailureClass::Permanent,
        ExtractionError::Transient(_) | ExtractionError::Unclassified(_) => FailureClass::Transient,
    }
}

/// What to do after the retry count was incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Leave the job queued and sleep this long before the next poll.
    Retry(Duration),
    /// Retries exhausted; fail the job.
    GiveUp,
}

/// Backoff table and retry ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before retry attempt `n` is `delays[n - 1]`, capped at the last entry.
    pub delays: Vec<Duration>,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delays: defaults::RETRY_DELAYS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
            max_attempts: defaults::MAX_RETRY_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>, max_attempts: u32) -> Self {
        Self {
            delays,
            max_attempts,
        }
    }

    /// Delay before retry attempt `attempt` (1-based). An empty table means no delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let Some(last) = self.delays.len().checked_sub(1) else {
            return Duration::ZERO;
        };
        let index = (attempt.saturating_sub(1) as usize).min(last);
        self.delays[index]
    }
}

/// Decide between another attempt and giving up, given the retry count
/// after the latest increment.
pub fn classify_retry(new_count: u32, policy: &RetryPolicy) -> RetryDecision {
    if new_count >= policy.max_attempts {
        RetryDecision::GiveUp
    } else {
        RetryDecision::Retry(policy.delay_for_attempt(new_count))
    }
}

/// Failure message reported when a job runs out of retries.
pub fn exhausted_message(max_attempts: u32, last_error: &ExtractionError) -> String {
    format!(
        "Max retries ({}) exceeded. Last error: {}",
        max_attempts,
        last_error.message()
    )
}

/// Parse a comma-separated list of whole seconds, e.g. `"5,10,20"`.
pub fn parse_delays(value: &str) -> Result<Vec<Duration>> {
    let delays = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| Error::Config(format!("invalid retry delay {s:?} in {value:?}")))
        })
        .collect::<Result<Vec<_>>>()?;

    if delays.is_empty() {
        return Err(Error::Config("retry delay list is empty".to_string()));
    }
    Ok(delays)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_classify_variants() {
        assert_eq!(
            classify(&ExtractionError::Permanent("missing".into())),
            FailureClass::Permanent
        );
        assert_eq!(
            classify(&ExtractionError::Transient("oom".into())),
            FailureClass::Transient
        );
        assert_eq!(
            classify(&ExtractionError::Unclassified("boom".into())),
            FailureClass::Transient
        );
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delays, vec![secs(5), secs(10), secs(20)]);
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn test_delay_table_is_capped_at_last_entry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), secs(5));
        assert_eq!(policy.delay_for_attempt(2), secs(10));
        assert_eq!(policy.delay_for_attempt(3), secs(20));
        assert_eq!(policy.delay_for_attempt(4), secs(20));
        assert_eq!(policy.delay_for_attempt(100), secs(20));
    }

    #[test]
    fn test_delay_for_attempt_zero_uses_first_entry() {
        assert_eq!(RetryPolicy::default().delay_for_attempt(0), secs(5));
    }

    #[test]
    fn test_empty_delay_table() {
        let policy = RetryPolicy::new(Vec::new(), 3);
        assert_eq!(policy.delay_for_attempt(2), Duration::ZERO);
    }

    #[test]
    fn test_classify_retry_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(classify_retry(1, &policy), RetryDecision::Retry(secs(5)));
        assert_eq!(classify_retry(2, &policy), RetryDecision::Retry(secs(10)));
        assert_eq!(classify_retry(3, &policy), RetryDecision::GiveUp);
        assert_eq!(classify_retry(4, &policy), RetryDecision::GiveUp);
    }

    #[test]
    fn test_classify_retry_raised_limit_reuses_last_delay() {
        let policy = RetryPolicy::new(vec![secs(5), secs(10), secs(20)], 6);
        assert_eq!(classify_retry(3, &policy), RetryDecision::Retry(secs(20)));
        assert_eq!(classify_retry(4, &policy), RetryDecision::Retry(secs(20)));
        assert_eq!(classify_retry(6, &policy), RetryDecision::GiveUp);
    }

    #[test]
    fn test_classify_retry_zero_attempts_always_gives_up() {
        let policy = RetryPolicy::new(vec![secs(1)], 0);
        assert_eq!(classify_retry(1, &policy), RetryDecision::GiveUp);
    }

    #[test]
    fn test_exhausted_message() {
        let msg = exhausted_message(3, &ExtractionError::Transient("connection refused".into()));
        assert_eq!(msg, "Max retries (3) exceeded. Last error: connection refused");
    }

    #[test]
    fn test_parse_delays() {
        assert_eq!(parse_delays("5,10,20").unwrap(), vec![secs(5), secs(10), secs(20)]);
        assert_eq!(parse_delays(" 1 , 2 ").unwrap(), vec![secs(1), secs(2)]);
        assert!(matches!(parse_delays("5,ten"), Err(Error::Config(_))));
        assert!(matches!(parse_delays(""), Err(Error::Config(_))));
        assert!(matches!(parse_delays("-1"), Err(Error::Config(_))));
    }
}
