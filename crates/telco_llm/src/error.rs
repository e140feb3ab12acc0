//! Error types for language-model access.

use thiserror::Error;

/// Result type alias for language-model operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to a language-model provider.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM not configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    NotConfigured,

    #[error("Unknown LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Failed to parse response: {0}")]
    MalformedResponse(String),

    #[error("No completion returned by {0}")]
    EmptyCompletion(String),
}

impl LlmError {
    /// Create an API status error.
    pub fn api(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }
}
