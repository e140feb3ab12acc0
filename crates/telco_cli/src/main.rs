//! Telco assistant CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Workflow finished with an error record

use std::process::ExitCode;

use clap::Parser;
use telco_core::CoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, WorkflowFailed};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const WORKFLOW_ERROR: u8 = 3;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Ask(args) => commands::ask::execute(args, config).await,
        Commands::Chat(args) => commands::chat::execute(args, config).await,
        Commands::Routes(args) => commands::routes::execute(args),
        Commands::Smoke(args) => commands::smoke::execute(args, config).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Install the fmt subscriber. Logs go to stderr so `--json` output stays
/// machine-readable.
fn init_logging(verbose: bool, quiet: bool) {
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(log_filter(verbose, quiet))
        .try_init();
}

/// `RUST_LOG` wins unless `--quiet` is given.
fn log_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    let crate_level = if verbose { "telco=debug" } else { "telco=info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{}", crate_level)))
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.downcast_ref::<WorkflowFailed>().is_some() {
            return ExitCodes::WORKFLOW_ERROR;
        }
        if let Some(core) = cause.downcast_ref::<CoreError>() {
            return match core {
                CoreError::InvalidInput(_)
                | CoreError::SessionNotFound(_)
                | CoreError::UnsupportedConfigFormat(_) => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("not found") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use telco_core::{ErrorKind, ErrorRecord};

    #[test]
    fn test_workflow_failure_exit_code() {
        let record = ErrorRecord::new(ErrorKind::HandlerFailure, "billing handler failed");
        let err = anyhow::Error::new(WorkflowFailed(record));
        assert_eq!(categorize_error(&err), ExitCodes::WORKFLOW_ERROR);
    }

    #[test]
    fn test_invalid_input_exit_code_through_context() {
        let err: anyhow::Error = Err::<(), _>(CoreError::InvalidInput("unknown role 'root'".into()))
            .context("Failed to parse --role")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);
    }

    #[test]
    fn test_logging_can_be_initialized_twice() {
        init_logging(false, false);
        init_logging(true, false);
        tracing::info!("still logging");
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::Error::new(CoreError::InvalidConfig("timeouts.handler_ms must be > 0".into()));
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);

        let err = anyhow::anyhow!("2 smoke queries failed");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}
