//! Ask command - Run one query through the workflow.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use telco_core::SessionContext;

use super::{build_orchestrator, parse_role, WorkflowFailed};

#[derive(Args)]
pub struct AskArgs {
    /// Customer identifier the query is asked on behalf of
    #[arg(long)]
    pub customer_id: String,

    /// Session role (customer or admin)
    #[arg(long, default_value = "customer")]
    pub role: String,

    /// Print the full session state as JSON
    #[arg(long)]
    pub json: bool,

    /// The customer's question
    pub query: String,
}

pub async fn execute(args: AskArgs, config: Option<&Path>) -> Result<()> {
    let role = parse_role(&args.role)?;
    let orchestrator = build_orchestrator(config)?;

    info!("Asking on behalf of {} ({})", args.customer_id, role);
    let state = orchestrator
        .run(args.query, SessionContext::new(args.customer_id, role))
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else if state.succeeded() {
        println!("{}", state.render());
    }

    match state.error() {
        Some(record) => Err(WorkflowFailed(record.clone()).into()),
        None => Ok(()),
    }
}
