use std::fmt;
use std::sync::Arc;

use nq_core::{
    ArticleIndex, DraftAnswer, LanguageModel, PipelineResult, ReviewedAnswer,
};
use nq_inference::{AnswerGenerator, AnswerReviewer, GENERATION_FALLBACK_MESSAGE};
use tokio::task::{AbortHandle, JoinHandle};

use crate::config::PipelineConfig;
use crate::critique::strip_critique;
use crate::error::PipelineError;
use crate::retriever::Retriever;

/// Retrieval, generation and review for one question at a time. Holds no
/// per-query state, so one instance serves any number of concurrent queries.
pub struct QueryProcessor {
    retriever: Retriever,
    generator: AnswerGenerator,
    reviewer: AnswerReviewer,
}

impl fmt::Debug for QueryProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryProcessor")
            .field("retriever", &self.retriever)
            .field("generator", &self.generator)
            .field("reviewer", &self.reviewer)
            .finish()
    }
}

/// User-facing text of a reviewed answer.
fn final_answer(draft: &DraftAnswer, reviewed: &ReviewedAnswer) -> String {
    let cleaned = strip_critique(&reviewed.text);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        draft.text.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

impl QueryProcessor {
    pub fn new(
        index: Arc<dyn ArticleIndex>,
        generation_model: Arc<dyn LanguageModel>,
        review_model: Arc<dyn LanguageModel>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            retriever: Retriever::new(index, config.retrieval),
            generator: AnswerGenerator::new(generation_model, config.generation),
            reviewer: AnswerReviewer::new(review_model, config.review),
        }
    }

    pub fn index(&self) -> &Arc<dyn ArticleIndex> {
        self.retriever.index()
    }

    #[tracing::instrument(skip_all, fields(query = %query))]
    pub async fn process_query(&self, query: &str) -> Result<PipelineResult, PipelineError> {
        let retrieval = self
            .retriever
            .retrieve(query)
            .await
            .map_err(|e| PipelineError::new(format!("Article search failed: {}", e)))?;

        let draft = match self
            .generator
            .generate(query, retrieval.primary.as_ref(), &retrieval.related)
            .await
        {
            Ok(draft) => draft,
            Err(e) if e.is_recoverable() => {
                tracing::warn!("⚠️ {}, answering with the fallback message", e);
                DraftAnswer::fallback(GENERATION_FALLBACK_MESSAGE)
            }
            Err(e) => {
                return Err(PipelineError::new(format!("Answer generation failed: {}", e))
                    .with_partial(retrieval))
            }
        };

        let reviewed = self
            .reviewer
            .review(&draft, query, retrieval.primary.as_ref())
            .await;
        let answer = final_answer(&draft, &reviewed);

        tracing::info!(
            "✅ Answered with {} article(s), refined: {}",
            retrieval.primary.iter().count() + retrieval.related.len(),
            reviewed.refined
        );
        Ok(PipelineResult::new(&retrieval, answer))
    }

    /// Run a query as its own task so that the caller can abandon it.
    pub fn spawn_query(self: &Arc<Self>, query: impl Into<String>) -> QueryHandle {
        let processor = Arc::clone(self);
        let query = query.into();
        QueryHandle {
            handle: tokio::spawn(async move { processor.process_query(&query).await }),
        }
    }
}

/// A query running in the background.
#[derive(Debug)]
pub struct QueryHandle {
    handle: JoinHandle<Result<PipelineResult, PipelineError>>,
}

impl QueryHandle {
    /// Abort the query. In-flight backend requests are dropped with it.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Cancels the query without consuming the handle.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<PipelineResult, PipelineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(PipelineError::new("Query was cancelled")),
            Err(e) => Err(PipelineError::new(format!("Query task failed: {}", e))),
        }
    }
}
