//! Question answering over a news corpus: retrieve the best article, draft
//! an answer grounded in it, review the draft and strip reviewer notes.

pub mod analytics;
pub mod config;
pub mod critique;
pub mod error;
pub mod processor;
pub mod retriever;

#[cfg(test)]
mod test_support;

pub use analytics::{CategoryShare, SearchAnalytics};
pub use config::PipelineConfig;
pub use critique::strip_critique;
pub use error::PipelineError;
pub use processor::{QueryHandle, QueryProcessor};
pub use retriever::{RetrievalConfig, Retriever};

pub mod prelude {
    pub use super::{PipelineConfig, PipelineError, QueryProcessor};
    pub use nq_core::{Article, PipelineResult};
}
