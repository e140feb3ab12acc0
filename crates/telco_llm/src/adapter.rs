//! LLM adapter for chat completions.
//!
//! Supports OpenAI and Anthropic APIs. Each call to [`LanguageModel::complete`]
//! issues exactly one HTTP request; retry policy belongs to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{LlmError, LlmResult};
use crate::types::{Completion, CompletionRequest};

/// Anything that can turn a completion request into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one completion.
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<Completion>;
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        Self {
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: provider.default_base_url().to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create an adapter from a resolved configuration.
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::NotConfigured)?;

        Ok(Self {
            provider: config.provider,
            api_key,
            model: config.resolved_model().to_string(),
            base_url: config.resolved_base_url().to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Get the current provider
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // OpenAI chat completion
    async fn complete_openai(&self, request: &CompletionRequest) -> LlmResult<Completion> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(OpenAIMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| OpenAIMessage {
            role: m.role.as_str(),
            content: m.content.clone(),
        }));

        let body = OpenAIRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error {}: {}", status, body);
            return Err(LlmError::api("OpenAI", status.as_u16(), body));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::EmptyCompletion("OpenAI".to_string()))?;

        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(Completion {
            content,
            model: self.model.clone(),
            input_tokens,
            output_tokens,
        })
    }

    // Anthropic chat completion
    async fn complete_anthropic(&self, request: &CompletionRequest) -> LlmResult<Completion> {
        let url = format!("{}/messages", self.base_url);

        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: request
                .messages
                .iter()
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Anthropic API error {}: {}", status, body);
            return Err(LlmError::api("Anthropic", status.as_u16(), body));
        }

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let content = result
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| LlmError::EmptyCompletion("Anthropic".to_string()))?;

        let (input_tokens, output_tokens) = result
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or((0, 0));

        Ok(Completion {
            content,
            model: self.model.clone(),
            input_tokens,
            output_tokens,
        })
    }
}

#[async_trait]
impl LanguageModel for LlmAdapter {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<Completion> {
        debug!(
            provider = %self.provider,
            model = %self.model,
            turns = request.messages.len(),
            "Sending completion request"
        );
        match self.provider {
            LlmProvider::OpenAI => self.complete_openai(request).await,
            LlmProvider::Anthropic => self.complete_anthropic(request).await,
        }
    }
}

impl std::fmt::Debug for LlmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAdapter")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}
