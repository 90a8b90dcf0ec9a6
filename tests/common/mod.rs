// Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use seekcode::providers::{ChatRequest, LlmProvider, ModelReply, ProviderError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order, then repeats the last one. Records
/// every request it receives.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    fallback: ModelReply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        let fallback = replies.last().cloned().unwrap_or_default();
        Self {
            replies: Mutex::new(replies.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    async fn send(&self, request: &ChatRequest) -> Result<ModelReply, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}
