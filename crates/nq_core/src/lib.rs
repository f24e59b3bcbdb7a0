pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{CompletionRequest, ContextBlock, LanguageModel, Purpose};
pub use storage::ArticleIndex;
pub use types::{
    Article, ArticleId, DraftAnswer, PipelineResult, RetrievalResult, ReviewedAnswer,
    ScoredArticle, TermSignature, UNCATEGORIZED,
};

pub mod prelude {
    pub use crate::{
        Article, ArticleIndex, Error, LanguageModel, PipelineResult, Result, ScoredArticle,
    };
}
