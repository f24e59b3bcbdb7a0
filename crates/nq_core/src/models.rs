use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// What a completion is for. Remote models only see the rendered prompt;
/// offline models use it to pick a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Answer,
    Review,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextBlock {
    pub label: String,
    pub text: String,
}

impl ContextBlock {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub purpose: Purpose,
    /// Instructions for the model.
    pub system: String,
    pub context: Vec<ContextBlock>,
    /// The question when answering, the draft when reviewing.
    pub input: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Single-string prompt for backends without a separate system slot.
    pub fn render_prompt(&self) -> String {
        let mut prompt = String::new();
        for block in &self.context {
            prompt.push_str(&format!("[{}]\n{}\n\n", block.label, block.text.trim()));
        }
        let input_label = match self.purpose {
            Purpose::Answer => "질문",
            Purpose::Review => "검토할 답변",
        };
        prompt.push_str(&format!("[{}]\n{}", input_label, self.input.trim()));
        prompt
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Run one completion. Implementations honour `request.timeout` where the
    /// transport allows it; callers still bound the whole call.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
