use std::path::Path;

use nq_core::{Error, Result};
use nq_inference::{GenerationConfig, ReviewConfig};
use serde::{Deserialize, Serialize};

use crate::retriever::RetrievalConfig;

/// Tuning for every stage of the pipeline. Missing sections and fields keep
/// their defaults, so a config file only needs what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub review: ReviewConfig,
}

impl PipelineConfig {
    pub fn from_json(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let input = tokio::fs::read_to_string(path).await?;
        Self::from_json(&input)
    }

    pub fn validate(&self) -> Result<()> {
        let relevance = self.retrieval.min_relevance;
        if !relevance.is_finite() || !(0.0..=100.0).contains(&relevance) {
            return Err(Error::Config(format!(
                "retrieval.min_relevance must be within 0..=100, got {}",
                relevance
            )));
        }
        if self.generation.max_answer_chars == 0 {
            return Err(Error::Config(
                "generation.max_answer_chars must be positive".to_string(),
            ));
        }
        if self.generation.max_context_chars == 0 {
            return Err(Error::Config(
                "generation.max_context_chars must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
