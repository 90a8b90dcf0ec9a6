// Model provider abstraction
//
// The orchestration loop talks to the model through `LlmProvider`, so tests
// can substitute a scripted model for the HTTP client.

use async_trait::async_trait;

pub mod error;
pub mod openai;
pub mod retry;
pub mod types;

pub use error::ProviderError;
pub use openai::OpenAiCompatProvider;
pub use retry::RetryPolicy;
pub use types::{ChatRequest, Message, ModelReply, Usage};

/// A chat model that can answer with text or tool calls
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the conversation and wait for the complete reply.
    ///
    /// Transport failures come back as `ProviderError`, never as an empty reply.
    async fn send(&self, request: &ChatRequest) -> Result<ModelReply, ProviderError>;

    /// Provider name for logs and status output
    fn name(&self) -> &str;

    /// Model used when the request does not name one
    fn default_model(&self) -> &str;
}
