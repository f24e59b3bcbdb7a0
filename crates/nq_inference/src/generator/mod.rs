use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use nq_core::{
    CompletionRequest, ContextBlock, DraftAnswer, Error, LanguageModel, Purpose, Result,
    ScoredArticle,
};
use serde::{Deserialize, Serialize};

use crate::config::duration_secs;
use crate::text::{bound_length, truncate_chars};

/// Answer used when retrieval found no article worth grounding on.
pub const NO_INFORMATION_MESSAGE: &str =
    "죄송합니다. 질문과 관련된 기사를 찾을 수 없습니다. 다른 질문을 입력해 주세요.";

/// Answer used when an article was found but no answer could be generated.
pub const GENERATION_FALLBACK_MESSAGE: &str =
    "죄송합니다. 지금은 답변을 생성할 수 없습니다. 아래 관련 기사를 참고해 주세요.";

const ANSWER_INSTRUCTIONS: &str = "당신은 뉴스 기사에 근거해 질문에 답하는 어시스턴트입니다. \
주어진 [주요 기사]에 있는 사실만 사용해 한국어로 간결하게 답하세요. \
[관련 기사]는 보조 맥락으로만 참고하세요. \
기사에 없는 내용은 추측하지 말고 기사에서 확인할 수 없다고 말하세요. \
답변은 다섯 문장을 넘지 않게 작성하세요.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub max_context_chars: usize,
    pub related_excerpt_chars: usize,
    pub max_answer_chars: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_context_chars: 4000,
            related_excerpt_chars: 300,
            max_answer_chars: 1200,
            max_tokens: 512,
            temperature: 0.2,
        }
    }
}

pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    config: GenerationConfig,
}

impl fmt::Debug for AnswerGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerGenerator")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

fn article_label(prefix: &str, scored: &ScoredArticle) -> String {
    match scored.article.published_date {
        Some(date) => format!(
            "{}: {} ({})",
            prefix,
            scored.article.title,
            date.format("%Y-%m-%d")
        ),
        None => format!("{}: {}", prefix, scored.article.title),
    }
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, config: GenerationConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn build_request(
        &self,
        query: &str,
        primary: &ScoredArticle,
        related: &[ScoredArticle],
    ) -> CompletionRequest {
        let mut context = vec![ContextBlock::new(
            article_label("주요 기사", primary),
            truncate_chars(&primary.article.content, self.config.max_context_chars),
        )];
        context.extend(related.iter().map(|r| {
            ContextBlock::new(
                article_label("관련 기사", r),
                truncate_chars(&r.article.content, self.config.related_excerpt_chars),
            )
        }));

        CompletionRequest {
            purpose: Purpose::Answer,
            system: ANSWER_INSTRUCTIONS.to_string(),
            context,
            input: query.trim().to_string(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            timeout: self.config.timeout,
        }
    }

    /// Draft an answer grounded in `primary`. Without a primary article the
    /// backend is not called at all.
    pub async fn generate(
        &self,
        query: &str,
        primary: Option<&ScoredArticle>,
        related: &[ScoredArticle],
    ) -> Result<DraftAnswer> {
        let Some(primary) = primary else {
            tracing::info!("🔎 No relevant article, answering with the no-information message");
            return Ok(DraftAnswer::fallback(NO_INFORMATION_MESSAGE));
        };

        let request = self.build_request(query, primary, related);
        tracing::debug!("Generation prompt:\n{}", request.render_prompt());

        let text = match tokio::time::timeout(self.config.timeout, self.model.complete(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                return Err(Error::GenerationUnavailable(format!(
                    "{} failed: {}",
                    self.model.name(),
                    e
                )))
            }
            Err(_) => {
                return Err(Error::GenerationUnavailable(format!(
                    "{} timed out after {:?}",
                    self.model.name(),
                    self.config.timeout
                )))
            }
        };

        let text = bound_length(&text, self.config.max_answer_chars);
        if text.is_empty() {
            return Err(Error::GenerationUnavailable(format!(
                "{} returned an empty answer",
                self.model.name()
            )));
        }

        tracing::info!("✍️ Drafted answer from '{}'", primary.article.title);
        Ok(DraftAnswer::generated(text))
    }
}
