pub mod config;
pub mod generator;
pub mod models;
pub mod reviewer;
pub mod testing;
pub mod text;

pub use config::{ModelConfig, ModelKind};
pub use generator::{
    AnswerGenerator, GenerationConfig, GENERATION_FALLBACK_MESSAGE, NO_INFORMATION_MESSAGE,
};
pub use models::create_model;
pub use nq_core::LanguageModel;
pub use reviewer::{AnswerReviewer, ReviewConfig, CRITIQUE_MARKERS, REPLACEMENT_MARKERS};

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{AnswerGenerator, AnswerReviewer, ModelConfig, ModelKind};
    pub use nq_core::{Article, Error, LanguageModel, Result};
}
