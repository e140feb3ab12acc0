//! Chat command - Interactive session over stdin.
//!
//! Each line is one query. `history` prints the session so far and
//! `exit` or `quit` ends it; the history is dropped on exit.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use telco_core::SessionManager;

use super::{build_orchestrator, parse_role};

#[derive(Args)]
pub struct ChatArgs {
    /// Customer identifier for the session
    #[arg(long)]
    customer_id: String,

    /// Session role (customer or admin)
    #[arg(long, default_value = "customer")]
    role: String,
}

enum Input<'a> {
    Quit,
    History,
    Skip,
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => Input::Skip,
        "exit" | "quit" => Input::Quit,
        "history" => Input::History,
        _ => Input::Query(trimmed),
    }
}

pub async fn execute(args: ChatArgs, config: Option<&Path>) -> Result<()> {
    let role = parse_role(&args.role)?;
    let sessions = SessionManager::new(Arc::new(build_orchestrator(config)?));
    sessions.open(&args.customer_id, role)?;

    println!(
        "💬 Session open for {} ({}). Type 'history' to review, 'exit' to leave.",
        args.customer_id, role
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Quit => break,
            Input::Skip => continue,
            Input::History => {
                let history = sessions.history(&args.customer_id).await?;
                if history.is_empty() {
                    println!("(no exchanges yet)");
                }
                for (turn, exchange) in history.iter().enumerate() {
                    println!("[{}] you: {}", turn + 1, exchange.query);
                    println!("    assistant: {}", exchange.response);
                }
            }
            Input::Query(query) => {
                let state = sessions.ask(&args.customer_id, query).await?;
                match state.error() {
                    Some(record) => {
                        warn!("Query failed: {}", record);
                        println!("⚠️  {}", record);
                    }
                    None => println!("{}\n", state.render()),
                }
            }
        }
    }

    sessions.close(&args.customer_id);
    println!("👋 Session closed.");
    Ok(())
}
