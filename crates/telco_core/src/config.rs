//! Assistant configuration.
//!
//! Configuration is an explicit value handed to constructors. It can be read
//! from a TOML, YAML or JSON file and is then overlaid with environment
//! variables (API keys, provider, model, endpoint).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use telco_llm::LlmConfig;

use crate::error::{CoreError, CoreResult};

/// Upper bound on history turns fed to the classifier.
pub const MAX_HISTORY_TURNS: usize = 50;

/// Per-call time budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub classifier_ms: u64,
    pub handler_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            classifier_ms: 15_000,
            handler_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    pub fn classifier(&self) -> Duration {
        Duration::from_millis(self.classifier_ms)
    }

    pub fn handler(&self) -> Duration {
        Duration::from_millis(self.handler_ms)
    }
}

/// Classifier prompt settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Most recent exchanges included in the prompt.
    pub history_turns: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { history_turns: 3 }
    }
}

/// Everything the orchestrator needs at construction time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub llm: LlmConfig,
    pub timeouts: TimeoutConfig,
    pub classifier: ClassifierConfig,
}

impl AssistantConfig {
    /// Defaults overlaid with the environment.
    pub fn from_env() -> CoreResult<Self> {
        let mut config = Self::default();
        config.llm.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file, then overlay the environment.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let mut config = Self::from_file(path)?;
        config.llm.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file without consulting the environment.
    ///
    /// The format is picked from the extension: `.toml`, `.yaml`/`.yml` or
    /// `.json`.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let shown = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        debug!("Loading config from {} ({})", shown, extension);

        let config: Self = match extension.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| CoreError::config_parse(&shown, e))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| CoreError::config_parse(&shown, e))?
            }
            "json" => {
                serde_json::from_str(&content).map_err(|e| CoreError::config_parse(&shown, e))?
            }
            _ => return Err(CoreError::UnsupportedConfigFormat(shown)),
        };
        Ok(config)
    }

    /// Reject values the workflow cannot honour.
    pub fn validate(&self) -> CoreResult<()> {
        if self.timeouts.classifier_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "timeouts.classifier_ms must be greater than zero".to_string(),
            ));
        }
        if self.timeouts.handler_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "timeouts.handler_ms must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(CoreError::InvalidConfig(format!(
                "llm.temperature must be within [0, 2], got {}",
                self.llm.temperature
            )));
        }
        if self.classifier.history_turns > MAX_HISTORY_TURNS {
            return Err(CoreError::InvalidConfig(format!(
                "classifier.history_turns must be at most {}",
                MAX_HISTORY_TURNS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use telco_llm::LlmProvider;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AssistantConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeouts.classifier(), Duration::from_secs(15));
        assert_eq!(config.classifier.history_turns, 3);
        assert_eq!(config.llm.temperature, 0.0);
    }

    #[test]
    fn test_load_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("telco.toml");
        fs::write(
            &path,
            r#"
[llm]
provider = "anthropic"
model = "claude-haiku"
temperature = 0.1

[timeouts]
classifier_ms = 2000
"#,
        )
        .unwrap();

        let config = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.llm.resolved_model(), "claude-haiku");
        assert_eq!(config.timeouts.classifier_ms, 2000);
        // unspecified sections keep their defaults
        assert_eq!(config.timeouts.handler_ms, 30_000);
        assert_eq!(config.classifier.history_turns, 3);
    }

    #[test]
    fn test_load_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("telco.yaml");
        fs::write(&path, "classifier:\n  history_turns: 5\nllm:\n  max_tokens: 8\n").unwrap();

        let config = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(config.classifier.history_turns, 5);
        assert_eq!(config.llm.max_tokens, 8);
    }

    #[test]
    fn test_load_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("telco.json");
        fs::write(&path, r#"{"timeouts": {"handler_ms": 4000}, "classifier": {"history_turns": 5}}"#)
            .unwrap();

        let config = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(config.timeouts.handler_ms, 4000);
        assert_eq!(config.timeouts.classifier_ms, TimeoutConfig::default().classifier_ms);
        assert_eq!(config.classifier.history_turns, 5);
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("telco.ini");
        fs::write(&path, "x=1").unwrap();

        let err = AssistantConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedConfigFormat(_)));
    }

    #[test]
    fn test_parse_error_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = AssistantConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AssistantConfig::default();
        config.timeouts.handler_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AssistantConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = AssistantConfig::default();
        config.classifier.history_turns = MAX_HISTORY_TURNS + 1;
        assert!(config.validate().is_err());
    }
}
