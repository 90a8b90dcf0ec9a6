// Model transport errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout, connection refused
    #[error("network error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the API
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("failed to decode model response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Transport failures, rate limits and server errors are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}
