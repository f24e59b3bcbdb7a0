use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nq_core::{Article, Error, Result};
use serde::Deserialize;
use url::Url;

/// A corpus record as found on disk, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub content: String,
}

pub fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl ArticleRecord {
    /// Validate the record; `position` only feeds error messages.
    pub fn into_article(self, position: usize) -> Result<Article> {
        let invalid = |reason: String| Error::InvalidArticle(format!("record {}: {}", position, reason));

        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(invalid("missing title".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(invalid(format!("missing content for '{}'", title)));
        }

        let url = self.url.trim().to_string();
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(invalid(format!("unsupported url scheme '{}'", parsed.scheme())))
            }
            Err(e) => return Err(invalid(format!("invalid url '{}': {}", url, e))),
        }

        let published_date = match self.published_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_published_date(raw)
                    .ok_or_else(|| invalid(format!("invalid published_date '{}'", raw)))?,
            ),
        };

        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| url.clone());

        Ok(Article::new(
            id,
            title,
            url,
            published_date,
            self.categories.unwrap_or_default(),
            self.content,
        ))
    }
}

fn into_articles(records: Vec<ArticleRecord>) -> Result<Vec<Article>> {
    records
        .into_iter()
        .enumerate()
        .map(|(position, record)| record.into_article(position))
        .collect()
}

/// Corpus stored as one JSON array.
pub fn parse_json(input: &str) -> Result<Vec<Article>> {
    let records: Vec<ArticleRecord> = serde_json::from_str(input)?;
    into_articles(records)
}

/// Corpus stored as JSON Lines; blank lines are skipped.
pub fn parse_jsonl(input: &str) -> Result<Vec<Article>> {
    let records = input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<ArticleRecord>)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    into_articles(records)
}

pub async fn load_corpus(path: &Path) -> Result<Vec<Article>> {
    let input = tokio::fs::read_to_string(path).await?;
    let articles = match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("ndjson") => parse_jsonl(&input)?,
        _ => parse_json(&input)?,
    };
    tracing::info!("📚 Loaded {} articles from {}", articles.len(), path.display());
    Ok(articles)
}
