//! Deterministic extractor for the `test` selector.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use descry_core::{defaults, ExtractionError, Extractor, ModelSelector};

use crate::validation::validate_input;

/// Default description returned by [`FixedExtractor`].
pub const FIXED_DESCRIPTION: &str = "This is a test description.";

/// Validates the input like a real backend, then returns a fixed description.
#[derive(Debug, Clone)]
pub struct FixedExtractor {
    description: String,
    delay: Duration,
    max_input_bytes: u64,
}

impl Default for FixedExtractor {
    fn default() -> Self {
        Self {
            description: FIXED_DESCRIPTION.to_string(),
            delay: Duration::ZERO,
            max_input_bytes: defaults::MAX_INPUT_SIZE_BYTES,
        }
    }
}

impl FixedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Simulated processing time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_input_bytes(mut self, max: u64) -> Self {
        self.max_input_bytes = max;
        self
    }
}

#[async_trait]
impl Extractor for FixedExtractor {
    async fn extract(
        &self,
        input_path: &str,
        model: ModelSelector,
    ) -> Result<String, ExtractionError> {
        validate_input(Path::new(input_path), self.max_input_bytes).await?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(
            subsystem = "inference",
            component = "fixed",
            op = "extract",
            model = model.as_str(),
            input_path,
            "Returning fixed description"
        );
        Ok(self.description.clone())
    }
}
