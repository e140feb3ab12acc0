//! # telco_llm
//!
//! Language-model access for the telco assistant.
//!
//! The orchestration core only ever talks to a [`LanguageModel`]. Production
//! code wires in an [`LlmAdapter`] (OpenAI or Anthropic chat completions);
//! tests wire in a [`ScriptedModel`] that replays canned completions.
//!
//! ```rust,ignore
//! use telco_llm::{ChatMessage, CompletionRequest, LanguageModel, LlmAdapter, LlmConfig};
//!
//! let config = LlmConfig::default().with_api_key("sk-...");
//! let adapter = LlmAdapter::from_config(&config)?;
//!
//! let request = CompletionRequest::new(vec![ChatMessage::user("Hello")])
//!     .with_system("Answer briefly.");
//! let completion = adapter.complete(&request).await?;
//! println!("{}", completion.content);
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod mock;
pub mod types;

pub use adapter::{LanguageModel, LlmAdapter};
pub use config::{LlmConfig, LlmProvider};
pub use error::{LlmError, LlmResult};
pub use mock::ScriptedModel;
pub use types::{ChatMessage, ChatRole, Completion, CompletionRequest};
