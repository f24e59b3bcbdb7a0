use std::fmt;

use async_trait::async_trait;
use nq_core::{CompletionRequest, Error, LanguageModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ModelConfig;

const DEFAULT_HOST: &str = "http://localhost";
const DEFAULT_PORT: u16 = 11434;
const DEFAULT_MODEL: &str = "gemma3:12b";

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaModelConfig {
    host: String,
    port: u16,
    model_name: String,
}

impl Default for OllamaModelConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_name: DEFAULT_MODEL.to_string(),
        }
    }
}

impl OllamaModelConfig {
    /// Accepts `http://host:port/model`; the path names the model unless
    /// `model_name` is set explicitly.
    pub fn from_model_config(config: &ModelConfig) -> Result<Self> {
        let defaults = Self::default();

        let (host, port, path_model) = match config.url.as_deref() {
            Some(raw) => {
                let url = Url::parse(raw)
                    .map_err(|e| Error::Config(format!("Invalid Ollama URL '{}': {}", raw, e)))?;
                let host = url
                    .host_str()
                    .ok_or_else(|| Error::Config(format!("Ollama URL '{}' has no host", raw)))?;
                (
                    format!("{}://{}", url.scheme(), host),
                    url.port().unwrap_or(DEFAULT_PORT),
                    url.path().trim_matches('/').to_string(),
                )
            }
            None => (defaults.host, defaults.port, String::new()),
        };

        let model_name = config
            .model_name
            .clone()
            .or_else(|| (!path_model.is_empty()).then_some(path_model))
            .unwrap_or(defaults.model_name);

        Ok(Self {
            host,
            port,
            model_name,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}/api/generate", self.host, self.port)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaModel {
    client: Client,
    config: OllamaModelConfig,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

impl OllamaModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            config: OllamaModelConfig::from_model_config(config)?,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = GenerateRequest {
            model: self.config.model_name(),
            system: &request.system,
            prompt: request.render_prompt(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(response.response)
    }
}
