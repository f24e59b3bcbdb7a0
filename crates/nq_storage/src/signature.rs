use std::collections::{BTreeSet, HashMap};

use nq_core::{Article, TermSignature};

const TITLE_WEIGHT: f32 = 2.0;

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

/// Lowercased terms of `text`. Hangul runs also yield their character
/// bigrams so that stems still match when a particle is attached.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.is_empty() {
            continue;
        }
        let token = raw.to_lowercase();
        let chars: Vec<char> = token.chars().collect();
        if chars.len() >= 2 {
            terms.push(token.clone());
        }
        if chars.len() >= 3 && chars.iter().any(|c| is_hangul(*c)) {
            for pair in chars.windows(2) {
                terms.push(pair.iter().collect());
            }
        }
    }
    terms
}

fn count_terms<'a, I>(groups: I) -> HashMap<String, f32>
where
    I: IntoIterator<Item = (&'a str, f32)>,
{
    let mut counts = HashMap::new();
    for (text, weight) in groups {
        for term in tokenize(text) {
            *counts.entry(term).or_insert(0.0) += weight;
        }
    }
    counts
}

fn article_counts(article: &Article) -> HashMap<String, f32> {
    let categories = article.categories.join(" ");
    count_terms([
        (article.title.as_str(), TITLE_WEIGHT),
        (categories.as_str(), 1.0),
        (article.content.as_str(), 1.0),
    ])
}

/// Sublinear term frequency.
fn tf(count: f32) -> f32 {
    if count <= 0.0 {
        0.0
    } else {
        1.0 + count.ln().max(0.0)
    }
}

/// Document frequencies of a fixed corpus.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    documents: usize,
    df: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn build(articles: &[Article]) -> Self {
        let mut df = HashMap::new();
        for article in articles {
            let distinct: BTreeSet<String> = article_counts(article).into_keys().collect();
            for term in distinct {
                *df.entry(term).or_insert(0) += 1;
            }
        }
        Self {
            documents: articles.len(),
            df,
        }
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.df
            .get(term)
            .map(|&df| (1.0 + self.documents as f32 / df as f32).ln())
    }

    pub fn article_signature(&self, article: &Article) -> TermSignature {
        self.weigh(article_counts(article))
    }

    /// Terms unknown to the corpus are dropped; they cannot match anything.
    pub fn query_signature(&self, query: &str) -> TermSignature {
        self.weigh(count_terms([(query, 1.0)]))
    }

    fn weigh(&self, counts: HashMap<String, f32>) -> TermSignature {
        TermSignature::from_weights(counts.into_iter().filter_map(|(term, count)| {
            let idf = self.idf(&term)?;
            Some((term, tf(count) * idf))
        }))
    }
}
