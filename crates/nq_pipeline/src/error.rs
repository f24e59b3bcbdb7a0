use nq_core::RetrievalResult;
use thiserror::Error;

/// The single failure a caller of the pipeline can see. Whatever retrieval
/// had already found is kept so the caller may still show it.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PipelineError {
    pub message: String,
    pub partial: Option<RetrievalResult>,
}

impl PipelineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: RetrievalResult) -> Self {
        self.partial = Some(partial);
        self
    }
}

impl From<nq_core::Error> for PipelineError {
    fn from(e: nq_core::Error) -> Self {
        Self::new(e.to_string())
    }
}
