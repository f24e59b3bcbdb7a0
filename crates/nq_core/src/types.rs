use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Category assigned to articles indexed without any.
pub const UNCATEGORIZED: &str = "미분류";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sparse, L2-normalized term vector. Terms are kept sorted so that the dot
/// product is a merge and sums happen in the same order on every call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermSignature {
    terms: Vec<(String, f32)>,
}

impl TermSignature {
    /// Builds a signature from raw weights, merging duplicate terms and
    /// normalizing to unit length. Non-positive weights are dropped.
    pub fn from_weights<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (String, f32)>,
    {
        let mut terms: Vec<(String, f32)> = weights
            .into_iter()
            .filter(|(_, w)| w.is_finite() && *w > 0.0)
            .collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));
        terms.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });

        let norm = terms.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in terms.iter_mut() {
                *w /= norm;
            }
        }
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn weight(&self, term: &str) -> Option<f32> {
        self.terms
            .binary_search_by(|(t, _)| t.as_str().cmp(term))
            .ok()
            .map(|i| self.terms[i].1)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, f32)> {
        self.terms.iter().map(|(t, w)| (t.as_str(), *w))
    }

    /// Cosine similarity of two normalized signatures, in `[0, 1]`.
    pub fn cosine(&self, other: &TermSignature) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0f32;
        while i < self.terms.len() && j < other.terms.len() {
            match self.terms[i].0.cmp(&other.terms[j].0) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    dot += self.terms[i].1 * other.terms[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0)
    }
}

/// An indexed news article. Never mutated once it is handed to an index.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub url: String,
    pub published_date: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    #[serde(skip)]
    pub content: String,
    #[serde(skip)]
    pub signature: TermSignature,
}

impl Article {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        published_date: Option<DateTime<Utc>>,
        categories: Vec<String>,
        content: impl Into<String>,
    ) -> Self {
        let categories: Vec<String> = categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let categories = if categories.is_empty() {
            vec![UNCATEGORIZED.to_string()]
        } else {
            categories
        };

        Self {
            id: ArticleId::new(id),
            title: title.into(),
            url: url.into(),
            published_date,
            categories,
            content: content.into(),
            signature: TermSignature::default(),
        }
    }

    pub fn with_signature(mut self, signature: TermSignature) -> Self {
        self.signature = signature;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredArticle {
    pub article: Arc<Article>,
    /// Percentage relevance in `[0, 100]`.
    pub score: f64,
}

impl ScoredArticle {
    pub fn new(article: Arc<Article>, score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self { article, score }
    }

    pub fn id(&self) -> &ArticleId {
        &self.article.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub primary: Option<ScoredArticle>,
    pub related: Vec<ScoredArticle>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn primary_score(&self) -> f64 {
        self.primary.as_ref().map(|p| p.score).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftAnswer {
    pub text: String,
    /// Canned text that was not produced from any article.
    pub fallback: bool,
}

impl DraftAnswer {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fallback: false,
        }
    }

    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewedAnswer {
    /// Reviewer output; may still carry critique markers.
    pub text: String,
    pub refined: bool,
}

impl ReviewedAnswer {
    pub fn unrefined(draft: &DraftAnswer) -> Self {
        Self {
            text: draft.text.clone(),
            refined: false,
        }
    }
}

/// The only value handed back to callers of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub primary: Option<Arc<Article>>,
    pub related: Vec<Arc<Article>>,
    pub score: f64,
    pub answer: String,
}

impl PipelineResult {
    pub fn new(retrieval: &RetrievalResult, answer: String) -> Self {
        Self {
            primary: retrieval.primary.as_ref().map(|p| p.article.clone()),
            related: retrieval.related.iter().map(|r| r.article.clone()).collect(),
            score: retrieval.primary_score(),
            answer,
        }
    }

    /// Primary first, then related, in rank order.
    pub fn articles(&self) -> impl Iterator<Item = &Arc<Article>> {
        self.primary.iter().chain(self.related.iter())
    }
}

impl PartialEq for PipelineResult {
    fn eq(&self, other: &Self) -> bool {
        let ids = |r: &PipelineResult| r.articles().map(|a| a.id.clone()).collect::<Vec<_>>();
        self.primary.as_ref().map(|a| &a.id) == other.primary.as_ref().map(|a| &a.id)
            && ids(self) == ids(other)
            && self.score == other.score
            && self.answer == other.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(terms: &[(&str, f32)]) -> TermSignature {
        TermSignature::from_weights(terms.iter().map(|(t, w)| (t.to_string(), *w)))
    }

    #[test]
    fn test_article_defaults_categories() {
        let article = Article::new("1", "Title", "http://test.com", None, vec![], "Body");
        assert_eq!(article.categories, vec![UNCATEGORIZED.to_string()]);

        let article = Article::new(
            "1",
            "Title",
            "http://test.com",
            None,
            vec![" 경제 ".to_string(), "".to_string()],
            "Body",
        );
        assert_eq!(article.categories, vec!["경제".to_string()]);
    }

    #[test]
    fn test_signature_is_normalized_and_merged() {
        let sig = signature(&[("ai", 3.0), ("투자", 4.0), ("ai", 0.0), ("bad", -1.0)]);
        assert_eq!(sig.len(), 2);
        let norm: f32 = sig.terms().map(|(_, w)| w * w).sum();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!((sig.weight("ai").unwrap() - 0.6).abs() < 1e-5);
        assert!(sig.weight("bad").is_none());
    }

    #[test]
    fn test_cosine() {
        let a = signature(&[("ai", 1.0), ("기술", 1.0)]);
        let b = signature(&[("ai", 1.0), ("기술", 1.0)]);
        let c = signature(&[("경제", 1.0)]);
        assert!((a.cosine(&b) - 1.0).abs() < 1e-5);
        assert_eq!(a.cosine(&c), 0.0);
        assert_eq!(a.cosine(&TermSignature::default()), 0.0);
    }

    #[test]
    fn test_scored_article_clamps() {
        let article = Arc::new(Article::new("1", "T", "http://t", None, vec![], "c"));
        assert_eq!(ScoredArticle::new(article.clone(), 140.0).score, 100.0);
        assert_eq!(ScoredArticle::new(article.clone(), -3.0).score, 0.0);
        assert_eq!(ScoredArticle::new(article, f64::NAN).score, 0.0);
    }

    #[test]
    fn test_pipeline_result_serialization_hides_content() {
        let article = Arc::new(Article::new(
            "1",
            "AI 투자 급증",
            "http://news.test/ai",
            None,
            vec![],
            "secret body",
        ));
        let retrieval = RetrievalResult {
            primary: Some(ScoredArticle::new(article, 82.3)),
            related: vec![],
        };
        let result = PipelineResult::new(&retrieval, "answer".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["primary"]["title"], "AI 투자 급증");
        assert_eq!(json["primary"]["categories"][0], UNCATEGORIZED);
        assert!(json["primary"].get("content").is_none());
        assert_eq!(json["score"], 82.3);
    }
}
