use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use nq_core::{Article, ArticleIndex, Error, Result, ScoredArticle};

use crate::signature::Vocabulary;

/// Corpus held in memory. Built once, then only read, so it is shared
/// across concurrent queries without locking.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    articles: Vec<Arc<Article>>,
    vocabulary: Vocabulary,
}

impl MemoryIndex {
    pub fn new(articles: Vec<Article>) -> Result<Self> {
        let mut seen = HashSet::new();
        for article in &articles {
            if !seen.insert(article.id.clone()) {
                return Err(Error::InvalidArticle(format!(
                    "duplicate article id: {}",
                    article.id
                )));
            }
        }

        let vocabulary = Vocabulary::build(&articles);
        let articles = articles
            .into_iter()
            .map(|article| {
                let signature = vocabulary.article_signature(&article);
                Arc::new(article.with_signature(signature))
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Indexed {} articles ({} documents in vocabulary)",
            articles.len(),
            vocabulary.documents()
        );
        Ok(Self {
            articles,
            vocabulary,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn rank(&self, query: &str, limit: usize) -> Vec<ScoredArticle> {
        if limit == 0 || query.trim().is_empty() || self.articles.is_empty() {
            return Vec::new();
        }

        let query = self.vocabulary.query_signature(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, ScoredArticle)> = self
            .articles
            .iter()
            .enumerate()
            .filter_map(|(position, article)| {
                let similarity = article.signature.cosine(&query) as f64;
                (similarity > 0.0)
                    .then(|| (position, ScoredArticle::new(article.clone(), similarity * 100.0)))
            })
            .collect();

        scored.sort_by(|(pa, a), (pb, b)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.article.published_date.cmp(&a.article.published_date))
                .then_with(|| pa.cmp(pb))
        });
        scored.truncate(limit);
        scored.into_iter().map(|(_, scored)| scored).collect()
    }
}

#[async_trait]
impl ArticleIndex for MemoryIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredArticle>> {
        Ok(self.rank(query, limit))
    }

    fn len(&self) -> usize {
        self.articles.len()
    }

    fn articles(&self) -> Vec<Arc<Article>> {
        self.articles.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(id: &str, title: &str, content: &str, day: Option<u32>) -> Article {
        Article::new(
            id,
            title,
            format!("http://news.test/{}", id),
            day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap()),
            vec!["경제".to_string()],
            content,
        )
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = MemoryIndex::empty();
        assert!(index.is_empty());
        assert!(index.search("AI 기술 동향", 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_by_relevance() {
        let index = MemoryIndex::new(vec![
            article("1", "부동산 시장 위축", "아파트 거래가 크게 줄었다", Some(1)),
            article("2", "AI 투자 급증", "AI 기술 기업에 대한 투자가 급증했다", Some(2)),
            article("3", "반도체 수출", "AI 서버용 반도체 수출이 늘었다", Some(3)),
        ])
        .unwrap();

        let results = index.search("AI 기술 투자", 4).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id().as_str(), "2");
        assert_eq!(results[1].id().as_str(), "3");
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| r.score > 0.0 && r.score <= 100.0));
    }

    #[tokio::test]
    async fn test_ties_prefer_recent_then_corpus_order() {
        let index = MemoryIndex::new(vec![
            article("old", "AI 뉴스", "내용", Some(1)),
            article("undated", "AI 뉴스", "내용", None),
            article("new", "AI 뉴스", "내용", Some(5)),
            article("new-2", "AI 뉴스", "내용", Some(5)),
        ])
        .unwrap();

        let ids: Vec<String> = index
            .search("AI 뉴스", 10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["new", "new-2", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_limit_and_blank_queries() {
        let index = MemoryIndex::new(vec![
            article("1", "AI 뉴스", "내용", Some(1)),
            article("2", "AI 소식", "내용", Some(2)),
        ])
        .unwrap();
        assert_eq!(index.search("AI", 1).await.unwrap().len(), 1);
        assert!(index.search("AI", 0).await.unwrap().is_empty());
        assert!(index.search("   ", 3).await.unwrap().is_empty());
        assert!(index.search("우주 탐사", 3).await.unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = MemoryIndex::new(vec![
            article("1", "AI 뉴스", "내용", None),
            article("1", "AI 소식", "내용", None),
        ]);
        assert!(matches!(result, Err(Error::InvalidArticle(_))));
    }

    #[tokio::test]
    async fn test_concurrent_readers() {
        let index = Arc::new(
            MemoryIndex::new(vec![
                article("1", "AI 투자 급증", "AI 기술", Some(1)),
                article("2", "AI 반도체", "AI 서버", Some(2)),
            ])
            .unwrap(),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let index = index.clone();
                tokio::spawn(async move { index.search("AI 기술", 2).await.unwrap() })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            let results = handle.await.unwrap();
            outcomes.push(
                results
                    .iter()
                    .map(|r| (r.id().to_string(), r.score))
                    .collect::<Vec<_>>(),
            );
        }
        assert!(outcomes.windows(2).all(|w| w[0] == w[1]));
    }
}
