use std::path::Path;
use std::sync::Arc;

use nq_core::{ArticleIndex, Error, Result};

pub mod backends;
pub mod loader;
pub mod signature;

pub use backends::*;
pub use loader::{load_corpus, ArticleRecord};

pub const AVAILABLE_BACKENDS: &[&str] = &["memory"];

/// Build the index named by `backend` from the corpus at `corpus`.
/// Without a corpus the index is empty, which is valid: every query then
/// ends in the no-information answer.
pub async fn create_index(backend: &str, corpus: Option<&Path>) -> Result<Arc<dyn ArticleIndex>> {
    match backend {
        "memory" => {
            let articles = match corpus {
                Some(path) => load_corpus(path).await?,
                None => {
                    tracing::warn!("No corpus given, starting with an empty index");
                    Vec::new()
                }
            };
            Ok(Arc::new(MemoryIndex::new(articles)?))
        }
        other => Err(Error::Config(format!(
            "Unknown index backend '{}'. Available backends: {}",
            other,
            AVAILABLE_BACKENDS.join(", ")
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_index;
}
