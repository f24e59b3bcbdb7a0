use std::fmt;
use std::sync::Arc;

use nq_core::{ArticleIndex, Result, RetrievalResult, ScoredArticle};
use serde::{Deserialize, Serialize};

/// Number of related articles returned next to the primary one.
pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// Minimum percentage relevance for an article to ground an answer.
pub const DEFAULT_MIN_RELEVANCE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub related_limit: usize,
    pub min_relevance: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            related_limit: DEFAULT_RELATED_LIMIT,
            min_relevance: DEFAULT_MIN_RELEVANCE,
        }
    }
}

pub struct Retriever {
    index: Arc<dyn ArticleIndex>,
    config: RetrievalConfig,
}

impl fmt::Debug for Retriever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retriever")
            .field("index", &format!("<{} articles>", self.index.len()))
            .field("config", &self.config)
            .finish()
    }
}

impl Retriever {
    pub fn new(index: Arc<dyn ArticleIndex>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    pub fn index(&self) -> &Arc<dyn ArticleIndex> {
        &self.index
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        if query.trim().is_empty() {
            return Ok(RetrievalResult::empty());
        }

        let mut hits: Vec<ScoredArticle> = self
            .index
            .search(query, 1 + self.config.related_limit)
            .await?
            .into_iter()
            .map(|hit| ScoredArticle::new(hit.article, hit.score))
            .collect();
        // Indexes promise rank order; keep the invariant even if one slips.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut hits = hits.into_iter();
        let primary = match hits.next() {
            Some(top) if top.score >= self.config.min_relevance => top,
            Some(top) => {
                tracing::info!(
                    "🔎 Best match '{}' scored {:.2}, below the {:.2} threshold",
                    top.article.title,
                    top.score,
                    self.config.min_relevance
                );
                return Ok(RetrievalResult::empty());
            }
            None => {
                tracing::info!("🔎 No article matches the query");
                return Ok(RetrievalResult::empty());
            }
        };

        let related: Vec<ScoredArticle> = hits
            .filter(|hit| hit.id() != primary.id())
            .take(self.config.related_limit)
            .collect();

        tracing::info!(
            "📰 Primary article '{}' ({:.2}%), {} related",
            primary.article.title,
            primary.score,
            related.len()
        );
        Ok(RetrievalResult {
            primary: Some(primary),
            related,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{article, StaticIndex};
    use nq_storage::MemoryIndex;

    fn retriever(index: StaticIndex) -> Retriever {
        Retriever::new(Arc::new(index), RetrievalConfig::default())
    }

    #[tokio::test]
    async fn test_scenario_primary_and_related() {
        let index = StaticIndex::new(vec![
            (article("a", "AI 투자 급증"), 82.3),
            (article("b", "반도체 수출"), 40.1),
            (article("c", "클라우드 시장"), 25.0),
        ]);
        let result = retriever(index).retrieve("AI 기술 동향").await.unwrap();

        let primary = result.primary.as_ref().unwrap();
        assert_eq!(primary.article.title, "AI 투자 급증");
        assert_eq!(primary.score, 82.3);
        let related: Vec<&str> = result.related.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(related, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_below_threshold_yields_nothing() {
        let index = StaticIndex::new(vec![(article("a", "AI"), 9.9), (article("b", "B"), 5.0)]);
        let result = retriever(index).retrieve("AI").await.unwrap();
        assert!(result.primary.is_none());
        assert!(result.related.is_empty());
        assert_eq!(result.primary_score(), 0.0);
    }

    #[tokio::test]
    async fn test_related_limited_and_deduplicated() {
        let a = article("a", "AI");
        let index = StaticIndex::new(vec![
            (a.clone(), 90.0),
            (a, 80.0),
            (article("b", "B"), 70.0),
            (article("c", "C"), 60.0),
            (article("d", "D"), 50.0),
            (article("e", "E"), 40.0),
        ]);
        let result = retriever(index).retrieve("AI").await.unwrap();
        let related: Vec<&str> = result.related.iter().map(|r| r.id().as_str()).collect();
        // search is asked for 1 + K hits, the duplicate takes one slot
        assert_eq!(related, vec!["b", "c"]);
        assert!(result.related.iter().all(|r| r.id().as_str() != "a"));
    }

    #[tokio::test]
    async fn test_out_of_order_scores_are_sorted() {
        let index = StaticIndex::new(vec![
            (article("low", "L"), 20.0),
            (article("high", "H"), 95.0),
            (article("mid", "M"), 50.0),
        ]);
        let result = retriever(index).retrieve("AI").await.unwrap();
        assert_eq!(result.primary.unwrap().id().as_str(), "high");
        let scores: Vec<f64> = result.related.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![50.0, 20.0]);
    }

    #[tokio::test]
    async fn test_empty_index_and_blank_query() {
        let retriever = Retriever::new(Arc::new(MemoryIndex::empty()), RetrievalConfig::default());
        assert!(!retriever.retrieve("AI 기술 동향").await.unwrap().has_primary());

        let index = StaticIndex::new(vec![(article("a", "AI"), 90.0)]);
        let retriever = Retriever::new(Arc::new(index), RetrievalConfig::default());
        assert!(!retriever.retrieve("   ").await.unwrap().has_primary());
    }

    #[tokio::test]
    async fn test_scores_non_increasing_on_memory_index() {
        let index = MemoryIndex::new(vec![
            nq_core::Article::new("1", "AI 투자 급증", "http://n.test/1", None, vec![], "AI 기술 투자"),
            nq_core::Article::new("2", "AI 반도체", "http://n.test/2", None, vec![], "AI 서버"),
            nq_core::Article::new("3", "AI 규제", "http://n.test/3", None, vec![], "AI 법안 기술"),
            nq_core::Article::new("4", "부동산", "http://n.test/4", None, vec![], "아파트"),
        ])
        .unwrap();
        let retriever = Retriever::new(
            Arc::new(index),
            RetrievalConfig {
                min_relevance: 0.0,
                ..RetrievalConfig::default()
            },
        );
        let result = retriever.retrieve("AI 기술 투자").await.unwrap();
        let primary = result.primary.unwrap();
        let mut previous = primary.score;
        for related in &result.related {
            assert!(related.score <= previous);
            previous = related.score;
        }
    }
}
