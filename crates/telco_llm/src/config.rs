//! Provider selection and sampling parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4",
            LlmProvider::Anthropic => "claude-sonnet-4-5",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            other => Err(LlmError::UnknownProvider(other.to_string())),
        }
    }
}

/// Connection and sampling settings for the classifier's model.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Model name; falls back to the provider default.
    pub model: Option<String>,
    /// Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Endpoint override, e.g. for a proxy or a compatible local server.
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            model: None,
            api_key: None,
            base_url: None,
            temperature: 0.0,
            max_tokens: 16,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmConfig {
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Model in effect after defaults.
    pub fn resolved_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Endpoint in effect after defaults, without a trailing slash.
    pub fn resolved_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), LlmError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// `TELCO_LLM_PROVIDER` is applied first so that the API key is read from
    /// the variable belonging to the selected provider. When no provider is
    /// forced and only `ANTHROPIC_API_KEY` is set, Anthropic is selected.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let forced = match non_empty("TELCO_LLM_PROVIDER") {
            Some(value) => {
                self.provider = value.parse()?;
                true
            }
            None => false,
        };

        if let Some(model) = non_empty("TELCO_LLM_MODEL") {
            self.model = Some(model);
        }
        if let Some(url) = non_empty("TELCO_LLM_BASE_URL") {
            self.base_url = Some(url);
        }

        if self.api_key.is_none() {
            if let Some(key) = non_empty(self.provider.api_key_var()) {
                self.api_key = Some(key);
            } else if !forced {
                if let Some(key) = non_empty(LlmProvider::Anthropic.api_key_var()) {
                    self.provider = LlmProvider::Anthropic;
                    self.api_key = Some(key);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_models() {
        let config = LlmConfig::default();
        assert_eq!(config.resolved_model(), "gpt-4");

        let config = LlmConfig::default().with_provider(LlmProvider::Anthropic);
        assert_eq!(config.resolved_model(), "claude-sonnet-4-5");
    }

    #[test]
    fn test_custom_model_and_base_url() {
        let config = LlmConfig::default()
            .with_model("gpt-3.5-turbo")
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.resolved_model(), "gpt-3.5-turbo");
        assert_eq!(config.resolved_base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_openai_key_from_env() {
        let mut config = LlmConfig::default();
        config
            .apply_overrides(env(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_anthropic_selected_when_only_its_key_is_set() {
        let mut config = LlmConfig::default();
        config
            .apply_overrides(env(&[("ANTHROPIC_API_KEY", "ak-test")]))
            .unwrap();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert_eq!(config.api_key.as_deref(), Some("ak-test"));
    }

    #[test]
    fn test_forced_provider_ignores_other_key() {
        let mut config = LlmConfig::default();
        config
            .apply_overrides(env(&[
                ("TELCO_LLM_PROVIDER", "openai"),
                ("ANTHROPIC_API_KEY", "ak-test"),
                ("TELCO_LLM_MODEL", "gpt-4o"),
            ]))
            .unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert!(config.api_key.is_none());
        assert_eq!(config.resolved_model(), "gpt-4o");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = LlmConfig::default();
        let err = config
            .apply_overrides(env(&[("TELCO_LLM_PROVIDER", "mistral")]))
            .unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(p) if p == "mistral"));
    }

    #[test]
    fn test_api_key_never_serialized_or_printed() {
        let config = LlmConfig::default().with_api_key("sk-secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
