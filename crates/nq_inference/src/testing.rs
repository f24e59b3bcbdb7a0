//! Scripted backends for exercising the pipeline without a model server.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use nq_core::{CompletionRequest, Error, LanguageModel, Result};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never answers; only a timeout gets the caller out.
    Hang,
}

pub struct ScriptedModel {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl fmt::Debug for ScriptedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedModel")
            .field("reply", &self.reply)
            .field("calls", &self.calls())
            .finish()
    }
}

impl ScriptedModel {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(Reply::Text(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(Reply::Fail(message.into()))
    }

    pub fn hanging() -> Self {
        Self::new(Reply::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(Error::Inference(message.clone())),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }
}
