//! Deterministic transport double for exercising `ContentGenerator` without
//! network access.

use crate::gemini::{GeminiError, GenerationRequest, GenerativeTransport};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Empty,
    Fail(String),
    Timeout,
}

/// Answers every call with the same reply and records each request.
pub struct ScriptedTransport {
    reply: ScriptedReply,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedTransport {
    pub fn new(reply: ScriptedReply) -> Self {
        Self { reply, calls: Mutex::new(Vec::new()) }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(ScriptedReply::Text(text.into()))
    }

    pub fn empty() -> Self {
        Self::new(ScriptedReply::Empty)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(ScriptedReply::Fail(message.into()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<GenerationRequest> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl GenerativeTransport for ScriptedTransport {
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, GeminiError> {
        self.calls.lock().push(request.clone());
        match &self.reply {
            ScriptedReply::Text(text) => Ok(Some(text.clone())),
            ScriptedReply::Empty => Ok(None),
            ScriptedReply::Fail(message) => Err(GeminiError::Http(message.clone())),
            ScriptedReply::Timeout => Err(GeminiError::Timeout),
        }
    }
}
