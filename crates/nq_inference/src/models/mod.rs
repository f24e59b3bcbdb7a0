use std::sync::Arc;

use nq_core::{LanguageModel, Result};

use crate::config::{ModelConfig, ModelKind};

pub mod deepseek;
pub mod extractive;
pub mod gemini;
pub mod ollama;

pub use deepseek::DeepSeekModel;
pub use extractive::ExtractiveModel;
pub use gemini::GeminiModel;
pub use ollama::OllamaModel;

/// Build the backend described by `config`. Hosted backends fail here when
/// their API key is missing rather than on the first query.
pub fn create_model(config: &ModelConfig) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.kind {
        ModelKind::Ollama => Arc::new(OllamaModel::new(config)?),
        ModelKind::Gemini => Arc::new(GeminiModel::new(config)?),
        ModelKind::DeepSeek => Arc::new(DeepSeekModel::new(config)?),
        ModelKind::Extractive => Arc::new(ExtractiveModel::new()),
    };
    tracing::debug!("Created {} model from {:?}", model.name(), config);
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model() {
        let model = create_model(&ModelConfig::new(ModelKind::Extractive)).unwrap();
        assert_eq!(model.name(), "Extractive");

        let model = create_model(&ModelConfig::new(ModelKind::Ollama)).unwrap();
        assert_eq!(model.name(), "Ollama");

        assert!(create_model(&ModelConfig::new(ModelKind::Gemini)).is_err());

        let config = ModelConfig::new(ModelKind::DeepSeek).with_api_key(Some("key".to_string()));
        assert_eq!(create_model(&config).unwrap().name(), "DeepSeek");
    }
}
