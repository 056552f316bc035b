//! Data models for the descry queue.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// External identifier of the item a job describes.
///
/// Opaque to the queue: the store neither validates nor deduplicates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub i64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for CorrelationId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

// =============================================================================
// MODEL SELECTOR
// =============================================================================

/// Extraction variant requested for a job.
///
/// The set is closed; anything else is rejected before it reaches the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSelector {
    /// Deterministic backend used by integration environments.
    #[serde(rename = "test")]
    Test,
    #[default]
    #[serde(rename = "Florence-2-base")]
    Florence2Base,
    #[serde(rename = "Florence-2-large")]
    Florence2Large,
    #[serde(rename = "SmolVLM-256M-Instruct")]
    SmolVlm256M,
    #[serde(rename = "SmolVLM-500M-Instruct")]
    SmolVlm500M,
    #[serde(rename = "moondream2")]
    Moondream2,
}

impl ModelSelector {
    /// Every accepted selector, in display order.
    pub const ALL: [ModelSelector; 6] = [
        ModelSelector::Test,
        ModelSelector::Florence2Base,
        ModelSelector::Florence2Large,
        ModelSelector::SmolVlm256M,
        ModelSelector::SmolVlm500M,
        ModelSelector::Moondream2,
    ];

    /// Name stored in the queue and accepted on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Florence2Base => "Florence-2-base",
            Self::Florence2Large => "Florence-2-large",
            Self::SmolVlm256M => "SmolVLM-256M-Instruct",
            Self::SmolVlm500M => "SmolVLM-500M-Instruct",
            Self::Moondream2 => "moondream2",
        }
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                Error::InvalidInput(format!("model must be one of {:?}", names))
            })
    }
}

// =============================================================================
// NOTIFICATION STATUS
// =============================================================================

/// Status codes reported to the notification receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationStatus {
    NotStarted,
    Queued,
    InProgress,
    Done,
    /// Code 4 is reserved by the receiver and never sent.
    Reserved,
    Failed,
}

impl NotificationStatus {
    /// Wire code of this status.
    pub fn code(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Queued => 1,
            Self::InProgress => 2,
            Self::Done => 3,
            Self::Reserved => 4,
            Self::Failed => 5,
        }
    }
}

// =============================================================================
// JOB
// =============================================================================

/// A pending job as persisted in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Store-assigned, monotonically increasing id. Defines FIFO order.
    pub id: i64,
    pub correlation_id: CorrelationId,
    pub input_path: String,
    /// Raw selector as stored. Parsed by the extractor boundary.
    pub model_selector: String,
    pub retry_count: u32,
    /// `None` for rows written before the column existed.
    pub enqueued_at: Option<DateTime<Utc>>,
}

/// Request to add a job to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub correlation_id: CorrelationId,
    pub input_path: String,
    pub model_selector: ModelSelector,
}

impl NewJob {
    pub fn new(
        correlation_id: impl Into<CorrelationId>,
        input_path: impl Into<String>,
        model_selector: ModelSelector,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            input_path: input_path.into(),
            model_selector,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_selector_roundtrip_names() {
        for model in ModelSelector::ALL {
            assert_eq!(model.as_str().parse::<ModelSelector>().unwrap(), model);
        }
    }

    #[test]
    fn test_model_selector_default_is_florence_base() {
        assert_eq!(ModelSelector::default().as_str(), "Florence-2-base");
    }

    #[test]
    fn test_model_selector_rejects_unknown() {
        let err = "invalid-model-name".parse::<ModelSelector>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("moondream2"));
    }

    #[test]
    fn test_model_selector_is_case_sensitive() {
        assert!("florence-2-base".parse::<ModelSelector>().is_err());
        assert!("TEST".parse::<ModelSelector>().is_err());
    }

    #[test]
    fn test_model_selector_serde_uses_wire_names() {
        let json = serde_json::to_string(&ModelSelector::SmolVlm256M).unwrap();
        assert_eq!(json, "\"SmolVLM-256M-Instruct\"");
        let parsed: ModelSelector = serde_json::from_str("\"test\"").unwrap();
        assert_eq!(parsed, ModelSelector::Test);
        assert!(serde_json::from_str::<ModelSelector>("\"gpt\"").is_err());
    }

    #[test]
    fn test_notification_status_codes() {
        assert_eq!(NotificationStatus::NotStarted.code(), 0);
        assert_eq!(NotificationStatus::Queued.code(), 1);
        assert_eq!(NotificationStatus::InProgress.code(), 2);
        assert_eq!(NotificationStatus::Done.code(), 3);
        assert_eq!(NotificationStatus::Reserved.code(), 4);
        assert_eq!(NotificationStatus::Failed.code(), 5);
    }

    #[test]
    fn test_correlation_id_serializes_transparently() {
        let json = serde_json::to_string(&CorrelationId(7)).unwrap();
        assert_eq!(json, "7");
        assert_eq!(CorrelationId(42).to_string(), "42");
    }

    #[test]
    fn test_new_job_constructor() {
        let job = NewJob::new(3, "/memes/cat.png", ModelSelector::Test);
        assert_eq!(job.correlation_id, CorrelationId(3));
        assert_eq!(job.input_path, "/memes/cat.png");
        assert_eq!(job.model_selector, ModelSelector::Test);
    }
}
