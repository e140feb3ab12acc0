//! CLI command definitions.
//!
//! Each subcommand drives the query workflow in a different way. Helpers
//! shared between commands (config loading, role parsing) live here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use telco_core::{AssistantConfig, ErrorRecord, Orchestrator, Role};

pub mod ask;
pub mod chat;
pub mod routes;
pub mod smoke;

/// telco - customer-service query router
#[derive(Parser)]
#[command(name = "telco")]
#[command(version, about = "telco - route customer-service queries to specialist handlers")]
#[command(long_about = r#"
telco classifies customer-service queries with a language model and routes
each one to the billing, network, recommendation or technical handler.
Anything that cannot be classified is answered by a fallback handler.

COMMANDS:
  ask     → Run a single query and print the response
  chat    → Interactive session; history feeds into classification
  routes  → Print the category → handler routing table
  smoke   → Run the example queries end to end

PROVIDER:
  Set OPENAI_API_KEY or ANTHROPIC_API_KEY. TELCO_LLM_PROVIDER,
  TELCO_LLM_MODEL and TELCO_LLM_BASE_URL override the config file.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Workflow finished with an error record
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (.toml, .yaml, .yml or .json)
    #[arg(short, long, global = true, env = "TELCO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single query through the workflow
    Ask(ask::AskArgs),

    /// Start an interactive session
    Chat(chat::ChatArgs),

    /// Print the routing table
    Routes(routes::RoutesArgs),

    /// Run the example queries end to end
    Smoke(smoke::SmokeArgs),
}

/// A run that ended with an error record instead of a response.
#[derive(Debug, thiserror::Error)]
#[error("workflow failed with {0}")]
pub struct WorkflowFailed(pub ErrorRecord);

/// Load config from `path`, or from the environment alone.
pub fn load_config(path: Option<&Path>) -> Result<AssistantConfig> {
    let config = match path {
        Some(path) => AssistantConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AssistantConfig::from_env().context("Invalid configuration")?,
    };
    Ok(config)
}

/// Orchestrator backed by the configured provider.
pub fn build_orchestrator(path: Option<&Path>) -> Result<Orchestrator> {
    let config = load_config(path)?;
    Orchestrator::from_config(&config).context(
        "Language model is not configured (set OPENAI_API_KEY or ANTHROPIC_API_KEY)",
    )
}

pub fn parse_role(raw: &str) -> Result<Role> {
    raw.parse::<Role>()
        .with_context(|| format!("Invalid --role argument: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("assistant.toml");
        fs::write(&path, "[timeouts]\nclassifier_ms = 2500\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.timeouts.classifier_ms, 2500);
    }

    #[test]
    fn test_load_config_rejects_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("assistant.ini");
        fs::write(&path, "timeouts=1").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("admin").unwrap(), Role::Admin);
        assert_eq!(parse_role("Customer").unwrap(), Role::Customer);
        assert!(parse_role("root").is_err());
    }

    #[test]
    fn test_cli_parses_ask() {
        let cli = Cli::try_parse_from([
            "telco",
            "--verbose",
            "ask",
            "--customer-id",
            "CUST001",
            "Why is my bill higher this month?",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Ask(args) => {
                assert_eq!(args.customer_id, "CUST001");
                assert_eq!(args.role, "customer");
                assert!(!args.json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_cli_rejects_verbose_with_quiet() {
        assert!(Cli::try_parse_from(["telco", "-v", "-q", "routes"]).is_err());
    }
}
