//! Ollama vision extractor.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use descry_core::{defaults, ExtractionError, Extractor, ModelSelector};

use crate::validation::{max_input_bytes_from_env, validate_input};

/// Describes images through an Ollama server's `/api/generate` endpoint.
///
/// Each [`ModelSelector`] is sent as the Ollama model tag unless a fixed tag
/// was configured with [`OllamaVisionExtractor::with_model_tag`].
#[derive(Debug, Clone)]
pub struct OllamaVisionExtractor {
    base_url: String,
    model_tag: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
    max_input_bytes: u64,
}

impl OllamaVisionExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model_tag: None,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(defaults::VISION_TIMEOUT_SECS),
            max_input_bytes: defaults::MAX_INPUT_SIZE_BYTES,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OLLAMA_URL` | `http://127.0.0.1:11434` |
    /// | `OLLAMA_VISION_MODEL` | selector name |
    /// | `MAX_INPUT_SIZE_BYTES` | `10485760` |
    ///
    /// Without `OLLAMA_VISION_MODEL` the selector name (e.g. `Florence-2-base`)
    /// is sent as the Ollama tag. Ollama answers 404 for tags it has not
    /// pulled, which is retried as transient until the job's retries run out.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_OLLAMA_URL)
            .unwrap_or_else(|_| defaults::OLLAMA_URL.to_string());
        let extractor =
            Self::new(base_url).with_max_input_bytes(max_input_bytes_from_env());
        match model_tag_override(std::env::var(defaults::ENV_OLLAMA_VISION_MODEL).ok()) {
            Some(tag) => extractor.with_model_tag(tag),
            None => {
                warn!(
                    subsystem = "inference",
                    component = "vision",
                    "OLLAMA_VISION_MODEL not set, sending selector names as Ollama model tags"
                );
                extractor
            }
        }
    }

    /// Send this tag for every selector.
    pub fn with_model_tag(mut self, tag: impl Into<String>) -> Self {
        self.model_tag = Some(tag.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_input_bytes(mut self, max: u64) -> Self {
        self.max_input_bytes = max;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tag_for(&self, model: ModelSelector) -> String {
        self.model_tag
            .clone()
            .unwrap_or_else(|| model.as_str().to_string())
    }
}

/// A blank `OLLAMA_VISION_MODEL` counts as unset.
fn model_tag_override(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Map a non-success HTTP status from the vision server to a failure class.
fn classify_status(status: StatusCode, tag: &str, body: &str) -> ExtractionError {
    if status == StatusCode::NOT_FOUND {
        ExtractionError::Transient(format!("Model {tag} is not available: {body}"))
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        ExtractionError::Transient(format!("Vision API returned {status}: {body}"))
    } else {
        ExtractionError::Permanent(format!("Vision API rejected input with {status}: {body}"))
    }
}

#[async_trait]
impl Extractor for OllamaVisionExtractor {
    async fn extract(
        &self,
        input_path: &str,
        model: ModelSelector,
    ) -> Result<String, ExtractionError> {
        use base64::Engine;

        let input = validate_input(Path::new(input_path), self.max_input_bytes).await?;
        let tag = self.tag_for(model);
        let start = Instant::now();

        let request = OllamaGenerateRequest {
            model: tag.clone(),
            prompt: defaults::VISION_PROMPT.to_string(),
            images: vec![base64::engine::general_purpose::STANDARD.encode(&input.bytes)],
            stream: false,
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ExtractionError::Transient(format!("Vision request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "inference",
                component = "vision",
                op = "extract",
                model = %tag,
                http_status = status.as_u16(),
                "Vision API returned an error"
            );
            return Err(classify_status(status, &tag, &body));
        }

        let result: OllamaGenerateResponse = response.json().await.map_err(|e| {
            ExtractionError::Unclassified(format!("Failed to parse vision response: {e}"))
        })?;

        debug!(
            subsystem = "inference",
            component = "vision",
            op = "extract",
            model = %tag,
            mime_type = input.mime_type,
            duration_ms = start.elapsed().as_millis() as u64,
            "Image described"
        );
        Ok(result.response)
    }
}
