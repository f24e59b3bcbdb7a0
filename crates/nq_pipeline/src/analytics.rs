use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use nq_core::PipelineResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    pub percentage: f64,
}

/// Aggregates over results the caller chose to keep. Lives only as long as
/// its owner; nothing is persisted.
#[derive(Debug, Default)]
pub struct SearchAnalytics {
    queries: Vec<String>,
    distinct_queries: HashSet<String>,
    primary_dates: Vec<Option<DateTime<Utc>>>,
    categories: HashMap<String, usize>,
}

impl SearchAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the primary article counts toward article statistics.
    pub fn record(&mut self, query: &str, result: &PipelineResult) {
        let query = query.trim().to_string();
        if self.distinct_queries.insert(query.clone()) {
            self.queries.push(query);
        } else if let Some(pos) = self.queries.iter().position(|q| *q == query) {
            let repeated = self.queries.remove(pos);
            self.queries.push(repeated);
        }

        if let Some(primary) = &result.primary {
            self.primary_dates.push(primary.published_date);
            for category in &primary.categories {
                *self.categories.entry(category.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn total_queries(&self) -> usize {
        self.distinct_queries.len()
    }

    pub fn total_articles(&self) -> usize {
        self.primary_dates.len()
    }

    /// Most recent first.
    pub fn recent_queries(&self, limit: usize) -> Vec<&str> {
        self.queries.iter().rev().take(limit).map(String::as_str).collect()
    }

    /// Largest share first, ties by name.
    pub fn category_distribution(&self) -> Vec<CategoryShare> {
        let total: usize = self.categories.values().sum();
        let mut shares: Vec<CategoryShare> = self
            .categories
            .iter()
            .map(|(category, &count)| CategoryShare {
                category: category.clone(),
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
            })
            .collect();
        shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        shares
    }

    /// Articles per publication day, most recent day first.
    pub fn date_distribution(&self) -> Vec<(NaiveDate, usize)> {
        let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for date in self.primary_dates.iter().flatten() {
            *days.entry(date.date_naive()).or_insert(0) += 1;
        }
        days.into_iter().rev().collect()
    }

    pub fn latest_article_date(&self) -> Option<DateTime<Utc>> {
        self.primary_dates.iter().flatten().max().copied()
    }
}
