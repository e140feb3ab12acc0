//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type alias for handler invocations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Result type alias for classification.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Errors raised outside a workflow run (configuration, session bookkeeping).
///
/// Failures inside a run never surface as `CoreError`; they end up in the
/// state's structured error record instead.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("Unsupported config format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("LLM error: {0}")]
    Llm(#[from] telco_llm::LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn config_parse(path: impl Into<String>, message: impl ToString) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Failures a handler may signal.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{handler} handler failed: {message}")]
    Failed { handler: String, message: String },

    #[error("{handler} handler timed out after {timeout_ms}ms")]
    Timeout { handler: String, timeout_ms: u64 },

    #[error("{0} handler returned an empty response")]
    EmptyResponse(String),
}

impl HandlerError {
    pub fn failed(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

/// Failures of the classification call itself.
///
/// An unrecognised label is not an error; it classifies as `unclassified`.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Language model call failed: {0}")]
    Provider(#[from] telco_llm::LlmError),

    #[error("Classification timed out after {0}ms")]
    Timeout(u64),
}
