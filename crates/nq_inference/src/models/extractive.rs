use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use nq_core::{CompletionRequest, Error, LanguageModel, Purpose, Result};
use nq_storage::signature::tokenize;

use crate::reviewer::REPLACEMENT_MARKERS;
use crate::text::split_sentences;

const ANSWER_SENTENCES: usize = 3;
/// Share of a sentence's terms that must occur in the article.
const SUPPORT_RATIO: f32 = 0.5;

/// Offline model that answers by quoting the best matching sentences of the
/// first context block and reviews by dropping unsupported sentences.
/// Deterministic, so it doubles as a stand-in when no backend is running.
#[derive(Default)]
pub struct ExtractiveModel;

impl fmt::Debug for ExtractiveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractiveModel").finish()
    }
}

impl ExtractiveModel {
    pub fn new() -> Self {
        Self
    }

    fn article<'a>(&self, request: &'a CompletionRequest) -> Result<&'a str> {
        request
            .context
            .first()
            .map(|block| block.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::Inference("no article context to extract from".to_string()))
    }

    fn answer(&self, article: &str, question: &str) -> String {
        let wanted: HashSet<String> = tokenize(question).into_iter().collect();
        let sentences = split_sentences(article);

        let mut ranked: Vec<(usize, usize)> = sentences
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                let overlap = tokenize(sentence)
                    .into_iter()
                    .collect::<HashSet<_>>()
                    .intersection(&wanted)
                    .count();
                (i, overlap)
            })
            .filter(|(_, overlap)| *overlap > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut picked: Vec<usize> = ranked
            .into_iter()
            .take(ANSWER_SENTENCES)
            .map(|(i, _)| i)
            .collect();
        if picked.is_empty() {
            picked = (0..sentences.len().min(2)).collect();
        }
        picked.sort_unstable();

        picked
            .into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_supported(sentence: &str, article_terms: &HashSet<String>) -> bool {
        let terms = tokenize(sentence);
        if terms.is_empty() {
            return true;
        }
        let found = terms.iter().filter(|t| article_terms.contains(*t)).count();
        found as f32 / terms.len() as f32 >= SUPPORT_RATIO
    }

    fn review(&self, article: &str, draft: &str) -> String {
        let article_terms: HashSet<String> = tokenize(article).into_iter().collect();
        let sentences = split_sentences(draft);
        let supported: Vec<&str> = sentences
            .iter()
            .copied()
            .filter(|s| Self::is_supported(s, &article_terms))
            .collect();

        if supported.len() == sentences.len() {
            return draft.to_string();
        }

        let replacement = if supported.is_empty() {
            split_sentences(article)
                .into_iter()
                .take(2)
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            supported.join(" ")
        };
        format!("{}:\n{}", REPLACEMENT_MARKERS[0], replacement)
    }
}

#[async_trait]
impl LanguageModel for ExtractiveModel {
    fn name(&self) -> &str {
        "Extractive"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let article = self.article(request)?;
        let output = match request.purpose {
            Purpose::Answer => self.answer(article, &request.input),
            Purpose::Review => self.review(article, &request.input),
        };
        tracing::debug!("Extractive {:?} output: {}", request.purpose, output);
        Ok(output)
    }
}
