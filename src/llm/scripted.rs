//! Scripted in-process provider
//!
//! Replays queued replies or errors in order and records every request, so
//! tests can assert exactly what the orchestration layer sent. No API key
//! and no network.

use super::{CompletionRequest, LlmError, LlmProvider, LlmResponse, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

enum Scripted {
    Reply(LlmResponse),
    Fail(LlmError),
}

#[derive(Default)]
struct ScriptState {
    queue: VecDeque<Scripted>,
    requests: Vec<CompletionRequest>,
}

/// Cloning shares the script, so a test can keep a handle after moving the
/// provider into the backend.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a reply that finished normally
    pub fn push_reply(&self, content: impl Into<String>) -> &Self {
        self.push_reply_with_reason(content, "end_turn")
    }

    pub fn push_reply_with_reason(
        &self,
        content: impl Into<String>,
        finish_reason: impl Into<String>,
    ) -> &Self {
        self.lock().queue.push_back(Scripted::Reply(LlmResponse {
            content: content.into(),
            finish_reason: Some(finish_reason.into()),
            usage: Some(TokenUsage::default()),
            model: "scripted".to_string(),
        }));
        self
    }

    pub fn push_error(&self, error: LlmError) -> &Self {
        self.lock().queue.push_back(Scripted::Fail(error));
        self
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.lock().requests.last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn remaining(&self) -> usize {
        self.lock().queue.len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse, LlmError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        match state.queue.pop_front() {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(LlmError::Other(anyhow::anyhow!(
                "scripted provider has no reply queued"
            ))),
        }
    }
}
