//! Selector-to-backend routing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use descry_core::{ExtractionError, Extractor, ModelSelector};

use crate::fixed::FixedExtractor;
use crate::validation::max_input_bytes_from_env;
use crate::vision::OllamaVisionExtractor;

/// Routes each [`ModelSelector`] to the extractor registered for it.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<ModelSelector, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `test` goes to a [`FixedExtractor`], every other selector to Ollama.
    ///
    /// Set `OLLAMA_VISION_MODEL` to a pulled vision model; see
    /// [`OllamaVisionExtractor::from_env`].
    pub fn from_env() -> Self {
        let vision: Arc<dyn Extractor> = Arc::new(OllamaVisionExtractor::from_env());
        let fixed = FixedExtractor::new().with_max_input_bytes(max_input_bytes_from_env());
        let mut registry = Self::new().with(ModelSelector::Test, Arc::new(fixed));
        for model in ModelSelector::ALL {
            if model != ModelSelector::Test {
                registry.register(model, vision.clone());
            }
        }
        registry
    }

    pub fn register(&mut self, model: ModelSelector, extractor: Arc<dyn Extractor>) {
        self.extractors.insert(model, extractor);
    }

    pub fn with(mut self, model: ModelSelector, extractor: Arc<dyn Extractor>) -> Self {
        self.register(model, extractor);
        self
    }

    pub fn get(&self, model: ModelSelector) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&model).cloned()
    }

    pub fn is_registered(&self, model: ModelSelector) -> bool {
        self.extractors.contains_key(&model)
    }
}

#[async_trait]
impl Extractor for ExtractorRegistry {
    async fn extract(
        &self,
        input_path: &str,
        model: ModelSelector,
    ) -> Result<String, ExtractionError> {
        match self.extractors.get(&model) {
            Some(extractor) => extractor.extract(input_path, model).await,
            None => Err(ExtractionError::Permanent(format!(
                "No extractor registered for model {model}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_registers_every_selector() {
        let registry = ExtractorRegistry::from_env();
        for model in ModelSelector::ALL {
            assert!(registry.is_registered(model), "{model} not registered");
        }
    }

    #[tokio::test]
    async fn test_unregistered_selector_is_permanent() {
        let registry = ExtractorRegistry::new();
        let err = registry
            .extract("/tmp/x.png", ModelSelector::Florence2Large)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Permanent(_)));
    }
}
