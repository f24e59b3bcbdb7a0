use std::sync::Arc;

use async_trait::async_trait;
use nq_core::{Article, ArticleIndex, Result, ScoredArticle};

pub fn article(id: &str, title: &str) -> Article {
    Article::new(
        id,
        title,
        format!("http://news.test/{}", id),
        None,
        vec![],
        format!("{} 관련 기사 본문입니다.", title),
    )
}

/// Index returning a fixed ranking, whatever the query.
pub struct StaticIndex {
    hits: Vec<(Arc<Article>, f64)>,
}

impl StaticIndex {
    pub fn new(hits: Vec<(Article, f64)>) -> Self {
        Self {
            hits: hits.into_iter().map(|(a, s)| (Arc::new(a), s)).collect(),
        }
    }
}

#[async_trait]
impl ArticleIndex for StaticIndex {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<ScoredArticle>> {
        Ok(self
            .hits
            .iter()
            .take(limit)
            .map(|(a, s)| ScoredArticle::new(a.clone(), *s))
            .collect())
    }

    fn len(&self) -> usize {
        self.hits.len()
    }

    fn articles(&self) -> Vec<Arc<Article>> {
        self.hits.iter().map(|(a, _)| a.clone()).collect()
    }
}

/// Index whose search always fails.
pub struct BrokenIndex;

#[async_trait]
impl ArticleIndex for BrokenIndex {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<ScoredArticle>> {
        Err(nq_core::Error::Index("index offline".to_string()))
    }

    fn len(&self) -> usize {
        0
    }

    fn articles(&self) -> Vec<Arc<Article>> {
        Vec::new()
    }
}
