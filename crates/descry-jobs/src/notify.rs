//! Best-effort delivery of job events to the notification receiver.
//!
//! Every call makes exactly one HTTP attempt. Failures are logged and
//! swallowed so that an unreachable receiver never stalls the worker.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use descry_core::{defaults, CorrelationId, NotificationStatus};

/// Receiver of job lifecycle events.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Report a status code for an item.
    async fn status(&self, correlation_id: CorrelationId, status: NotificationStatus);

    /// Deliver a description for an item.
    async fn description(&self, correlation_id: CorrelationId, text: &str);

    /// Report a terminal failure: `Failed` status, then the message as an
    /// `Error: ` description.
    async fn failure(&self, correlation_id: CorrelationId, message: &str) {
        self.status(correlation_id, NotificationStatus::Failed).await;
        self.description(correlation_id, &format!("Error: {message}")).await;
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct StatusPayload {
    correlation_id: CorrelationId,
    status: u8,
}

#[derive(Serialize)]
struct DescriptionPayload<'a> {
    correlation_id: CorrelationId,
    description: &'a str,
}

/// [`Notifier`] that POSTs JSON to `{base_url}status_receiver` and
/// `{base_url}description_receiver`.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(defaults::NOTIFY_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `NOTIFY_BASE_URL` | `http://127.0.0.1:3000/image_cores/` |
    /// | `NOTIFY_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_NOTIFY_BASE_URL)
            .unwrap_or_else(|_| defaults::NOTIFY_BASE_URL.to_string());
        let timeout_secs = std::env::var(defaults::ENV_NOTIFY_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::NOTIFY_TIMEOUT_SECS);
        Self::new(base_url).with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T>(&self, endpoint: &str, correlation_id: CorrelationId, data: T)
    where
        T: Serialize + Send + Sync,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let result = self
            .client
            .post(&url)
            .json(&Envelope { data })
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!(
                    subsystem = "jobs",
                    component = "notifier",
                    op = endpoint,
                    correlation_id = correlation_id.0,
                    http_status = resp.status().as_u16(),
                    "Notification delivered"
                );
            }
            Ok(resp) => {
                warn!(
                    subsystem = "jobs",
                    component = "notifier",
                    op = endpoint,
                    correlation_id = correlation_id.0,
                    http_status = resp.status().as_u16(),
                    "Notification rejected by receiver"
                );
            }
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "notifier",
                    op = endpoint,
                    correlation_id = correlation_id.0,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn status(&self, correlation_id: CorrelationId, status: NotificationStatus) {
        self.post(
            defaults::STATUS_ENDPOINT,
            correlation_id,
            StatusPayload {
                correlation_id,
                status: status.code(),
            },
        )
        .await;
    }

    async fn description(&self, correlation_id: CorrelationId, text: &str) {
        self.post(
            defaults::DESCRIPTION_ENDPOINT,
            correlation_id,
            DescriptionPayload {
                correlation_id,
                description: text,
            },
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let notifier = HttpNotifier::new("http://localhost:3000/image_cores");
        assert_eq!(notifier.base_url(), "http://localhost:3000/image_cores/");

        let notifier = HttpNotifier::new("http://localhost:3000/image_cores/");
        assert_eq!(notifier.base_url(), "http://localhost:3000/image_cores/");
    }

    #[test]
    fn test_status_payload_shape() {
        let body = serde_json::to_value(Envelope {
            data: StatusPayload {
                correlation_id: CorrelationId(7),
                status: NotificationStatus::InProgress.code(),
            },
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"data": {"correlation_id": 7, "status": 2}}));
    }

    #[test]
    fn test_description_payload_shape() {
        let body = serde_json::to_value(Envelope {
            data: DescriptionPayload {
                correlation_id: CorrelationId(7),
                description: "a cat",
            },
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"data": {"correlation_id": 7, "description": "a cat"}})
        );
    }
}
