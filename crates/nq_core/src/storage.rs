use async_trait::async_trait;

use crate::types::{Article, ScoredArticle};
use crate::Result;

/// Read-only view over an indexed corpus.
#[async_trait]
pub trait ArticleIndex: Send + Sync {
    /// Rank articles against `query`, best first, at most `limit` entries.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredArticle>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All indexed articles in corpus order.
    fn articles(&self) -> Vec<std::sync::Arc<Article>>;
}
