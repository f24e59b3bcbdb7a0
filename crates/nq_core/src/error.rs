use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid article: {0}")]
    InvalidArticle(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Inference error: {0}")]
    Inference(String),

    /// The generation backend failed, timed out or produced nothing.
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The review backend failed, timed out or produced nothing.
    #[error("Review unavailable: {0}")]
    ReviewUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Failures a pipeline stage is allowed to absorb locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::GenerationUnavailable(_) | Error::ReviewUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(Error::GenerationUnavailable("timeout".into()).is_recoverable());
        assert!(Error::ReviewUnavailable("down".into()).is_recoverable());
        assert!(!Error::Index("broken".into()).is_recoverable());
        assert!(!Error::Inference("bad status".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::GenerationUnavailable("timed out after 30s".to_string());
        assert_eq!(err.to_string(), "Generation unavailable: timed out after 30s");
    }
}
