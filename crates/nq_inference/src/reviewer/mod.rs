use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use nq_core::{
    CompletionRequest, ContextBlock, DraftAnswer, Error, LanguageModel, Purpose, Result,
    ReviewedAnswer, ScoredArticle,
};
use serde::{Deserialize, Serialize};

use crate::config::duration_secs;
use crate::text::truncate_chars;

/// Headers that introduce a replacement answer. The first one is the one the
/// reviewer is asked to use.
pub const REPLACEMENT_MARKERS: &[&str] = &["수정된 답변", "개선된 답변", "Revised answer"];

/// Headers after which everything is reviewer metadata.
pub const CRITIQUE_MARKERS: &[&str] = &["개선 사항", "개선사항", "검토 의견", "Improvement notes"];

fn review_instructions() -> String {
    format!(
        "당신은 뉴스 답변 검토자입니다. [검토할 답변]이 [주요 기사]에 있는 사실만 말하는지(근거성), \
그리고 [질문]에 실제로 답하는지(완결성)를 확인하세요.\n\
- 문제가 없으면 답변을 그대로 다시 출력하세요.\n\
- 고쳐야 하면 첫 줄에 \"{replace}:\"를 쓰고 그 아래에 고친 답변 전체를 쓰세요.\n\
- 답변은 그대로 두고 의견만 남기려면 답변 뒤에 \"{critique}:\" 줄을 쓰고 그 아래에 의견을 쓰세요.\n\
두 표시는 함께 쓰지 말고, 기사에 없는 사실을 추가하지 마세요.",
        replace = REPLACEMENT_MARKERS[0],
        critique = CRITIQUE_MARKERS[0],
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub enabled: bool,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub max_context_chars: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(30),
            max_context_chars: 4000,
            max_tokens: 768,
            temperature: 0.0,
        }
    }
}

/// Takes a draft to its reviewed form in one step. Review is best effort:
/// whatever goes wrong, the draft comes back unrefined.
pub struct AnswerReviewer {
    model: Arc<dyn LanguageModel>,
    config: ReviewConfig,
}

impl fmt::Debug for AnswerReviewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerReviewer")
            .field("model", &self.model.name())
            .field("config", &self.config)
            .finish()
    }
}

impl AnswerReviewer {
    pub fn new(model: Arc<dyn LanguageModel>, config: ReviewConfig) -> Self {
        Self { model, config }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn build_request(
        &self,
        draft: &DraftAnswer,
        query: &str,
        primary: &ScoredArticle,
    ) -> CompletionRequest {
        CompletionRequest {
            purpose: Purpose::Review,
            system: review_instructions(),
            context: vec![
                ContextBlock::new(
                    format!("주요 기사: {}", primary.article.title),
                    truncate_chars(&primary.article.content, self.config.max_context_chars),
                ),
                ContextBlock::new("질문", query.trim()),
            ],
            input: draft.text.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            timeout: self.config.timeout,
        }
    }

    async fn run(&self, draft: &DraftAnswer, query: &str, primary: &ScoredArticle) -> Result<String> {
        let request = self.build_request(draft, query, primary);
        let output = tokio::time::timeout(self.config.timeout, self.model.complete(&request))
            .await
            .map_err(|_| {
                Error::ReviewUnavailable(format!(
                    "{} timed out after {:?}",
                    self.model.name(),
                    self.config.timeout
                ))
            })?
            .map_err(|e| Error::ReviewUnavailable(format!("{} failed: {}", self.model.name(), e)))?;

        if output.trim().is_empty() {
            return Err(Error::ReviewUnavailable(format!(
                "{} returned an empty review",
                self.model.name()
            )));
        }
        Ok(output)
    }

    pub async fn review(
        &self,
        draft: &DraftAnswer,
        query: &str,
        primary: Option<&ScoredArticle>,
    ) -> ReviewedAnswer {
        let primary = match primary {
            Some(primary) if self.config.enabled && !draft.fallback => primary,
            _ => return ReviewedAnswer::unrefined(draft),
        };

        match self.run(draft, query, primary).await {
            Ok(output) => {
                let refined = output.trim() != draft.text.trim();
                if refined {
                    tracing::info!("🧐 Reviewer refined the draft answer");
                } else {
                    tracing::debug!("Reviewer kept the draft answer");
                }
                ReviewedAnswer {
                    text: output,
                    refined,
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ {}; keeping the draft answer", e);
                ReviewedAnswer::unrefined(draft)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;
    use nq_core::Article;

    fn primary() -> ScoredArticle {
        ScoredArticle::new(
            Arc::new(Article::new(
                "1",
                "AI 투자 급증",
                "http://news.test/1",
                None,
                vec![],
                "AI 투자가 급증했다.",
            )),
            82.3,
        )
    }

    fn reviewer(model: Arc<ScriptedModel>) -> AnswerReviewer {
        AnswerReviewer::new(
            model,
            ReviewConfig {
                timeout: Duration::from_millis(50),
                ..ReviewConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_unchanged_review_is_not_refined() {
        let model = Arc::new(ScriptedModel::replying("AI 투자가 급증했습니다.\n"));
        let draft = DraftAnswer::generated("AI 투자가 급증했습니다.");
        let reviewed = reviewer(model).review(&draft, "AI", Some(&primary())).await;
        assert!(!reviewed.refined);
    }

    #[tokio::test]
    async fn test_refined_review_keeps_markers() {
        let output = "수정된 답변:\nAI 스타트업 투자가 급증했습니다.";
        let model = Arc::new(ScriptedModel::replying(output));
        let draft = DraftAnswer::generated("AI 투자가 줄었습니다.");
        let reviewed = reviewer(model.clone())
            .review(&draft, "AI 기술 동향", Some(&primary()))
            .await;
        assert_eq!(reviewed.text, output);
        assert!(reviewed.refined);

        let request = model.last_request().unwrap();
        assert_eq!(request.purpose, Purpose::Review);
        assert_eq!(request.input, "AI 투자가 줄었습니다.");
        assert_eq!(request.context[1].text, "AI 기술 동향");
        assert!(request.system.contains("수정된 답변:"));
        assert!(request.system.contains("개선 사항:"));
    }

    #[tokio::test]
    async fn test_failures_pass_draft_through() {
        let draft = DraftAnswer::generated("초안");
        for model in [
            ScriptedModel::failing("503"),
            ScriptedModel::hanging(),
            ScriptedModel::replying("  \n"),
        ] {
            let reviewed = reviewer(Arc::new(model)).review(&draft, "AI", Some(&primary())).await;
            assert_eq!(reviewed, ReviewedAnswer::unrefined(&draft));
        }
    }

    #[tokio::test]
    async fn test_fallback_and_disabled_skip_backend() {
        let model = Arc::new(ScriptedModel::replying("unused"));
        let fallback = DraftAnswer::fallback("없음");
        let reviewed = reviewer(model.clone()).review(&fallback, "AI", Some(&primary())).await;
        assert_eq!(reviewed.text, "없음");
        let reviewed = reviewer(model.clone())
            .review(&DraftAnswer::generated("초안"), "AI", None)
            .await;
        assert_eq!(reviewed.text, "초안");

        let disabled = AnswerReviewer::new(
            model.clone(),
            ReviewConfig {
                enabled: false,
                ..ReviewConfig::default()
            },
        );
        disabled
            .review(&DraftAnswer::generated("초안"), "AI", Some(&primary()))
            .await;
        assert_eq!(model.calls(), 0);
    }
}
