use std::env;
use std::fmt;
use std::str::FromStr;

use nq_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Ollama,
    Gemini,
    DeepSeek,
    Extractive,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Ollama,
        ModelKind::Gemini,
        ModelKind::DeepSeek,
        ModelKind::Extractive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Ollama => "ollama",
            ModelKind::Gemini => "gemini",
            ModelKind::DeepSeek => "deepseek",
            ModelKind::Extractive => "extractive",
        }
    }

    /// Environment variable holding the API key, for hosted models.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            ModelKind::Gemini => Some("GEMINI_API_KEY"),
            ModelKind::DeepSeek => Some("DEEPSEEK_API_KEY"),
            ModelKind::Ollama | ModelKind::Extractive => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.as_str()).collect();
                Error::Config(format!(
                    "Unknown model '{}'. Available models: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Which backend to talk to and how to reach it.
#[derive(Clone)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub url: Option<String>,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("model_name", &self.model_name)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ModelConfig {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            url: None,
            model_name: None,
            api_key: None,
        }
    }

    /// Like `new`, picking the API key up from the environment.
    pub fn from_env(kind: ModelKind) -> Self {
        let api_key = kind
            .api_key_var()
            .and_then(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty());
        Self {
            api_key,
            ..Self::new(kind)
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.url = url;
        }
        self
    }

    pub fn with_model_name(mut self, model_name: Option<String>) -> Self {
        if model_name.is_some() {
            self.model_name = model_name;
        }
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if api_key.is_some() {
            self.api_key = api_key;
        }
        self
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ModelKind::Ollama)
    }
}

/// Durations written as (fractional) seconds in configuration files.
pub mod duration_secs {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(D::Error::custom(format!(
                "timeout must be a positive number of seconds, got {}",
                secs
            )));
        }
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
