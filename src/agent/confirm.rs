// Human confirmation collaborator
//
// The loop asks "may I run this?" through the `Confirmer` trait. The
// interactive CLI answers over a request/response channel; tests and headless
// runs substitute a scripted or auto-deny policy.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

/// Answer to a permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
    /// Yes, and remember a rule so this shape of action is not asked again
    Always,
}

impl Decision {
    /// Parse a terminal answer. Empty input means no.
    pub fn parse_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Decision::Yes),
            "" | "n" | "no" => Some(Decision::No),
            "a" | "always" => Some(Decision::Always),
            _ => None,
        }
    }
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Block until the human decides. May wait indefinitely.
    async fn confirm(&self, prompt: &str) -> Decision;
}

/// Non-interactive policy: refuse everything that needs a human
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDeny;

#[async_trait]
impl Confirmer for AutoDeny {
    async fn confirm(&self, prompt: &str) -> Decision {
        debug!(prompt, "Auto-denying confirmation (non-interactive)");
        Decision::No
    }
}

/// Replays a fixed list of answers, then answers `No`. Records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<Decision>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &str) -> Decision {
        self.prompts.lock().await.push(prompt.to_string());
        self.answers.lock().await.pop_front().unwrap_or(Decision::No)
    }
}

/// A pending question for whoever owns the terminal
#[derive(Debug)]
pub struct ConfirmationRequest {
    pub prompt: String,
    pub respond_to: oneshot::Sender<Decision>,
}

/// Forwards prompts over a channel and waits for the reply
#[derive(Debug, Clone)]
pub struct ChannelConfirmer {
    tx: mpsc::Sender<ConfirmationRequest>,
}

impl ChannelConfirmer {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ConfirmationRequest>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Confirmer for ChannelConfirmer {
    async fn confirm(&self, prompt: &str) -> Decision {
        let (respond_to, response) = oneshot::channel();
        let request = ConfirmationRequest {
            prompt: prompt.to_string(),
            respond_to,
        };

        if self.tx.send(request).await.is_err() {
            debug!("Confirmation channel closed, denying");
            return Decision::No;
        }

        // A dropped responder counts as a refusal
        response.await.unwrap_or(Decision::No)
    }
}
