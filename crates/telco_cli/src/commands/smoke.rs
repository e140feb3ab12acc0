//! Smoke command - Run the example queries end to end.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use telco_core::SessionContext;

use super::{build_orchestrator, parse_role};

/// One question per specialist area.
pub const SMOKE_QUERIES: [&str; 4] = [
    "Why is my bill higher this month?",
    "I have poor signal at home, can you help?",
    "What's the best plan for heavy data usage?",
    "How do I enable VoLTE on my device?",
];

#[derive(Args)]
pub struct SmokeArgs {
    /// Customer identifier used for every query
    #[arg(long, default_value = "CUST001")]
    customer_id: String,

    /// Session role (customer or admin)
    #[arg(long, default_value = "customer")]
    role: String,
}

pub async fn execute(args: SmokeArgs, config: Option<&Path>) -> Result<()> {
    let role = parse_role(&args.role)?;
    let orchestrator = build_orchestrator(config)?;
    info!("Running {} smoke queries", SMOKE_QUERIES.len());

    println!("🧪 Running {} example queries...\n", SMOKE_QUERIES.len());

    let mut failed = 0;
    for query in SMOKE_QUERIES {
        let session = SessionContext::new(args.customer_id.clone(), role);
        let state = orchestrator.run(query, session).await;

        match (state.response(), state.error()) {
            (Some(response), _) => {
                let category = state
                    .category()
                    .map(|c| c.as_str())
                    .unwrap_or("unclassified");
                println!("✅ {}\n   {} → {}", query, category, response.source);
            }
            (None, Some(record)) => {
                failed += 1;
                println!("❌ {}\n   {}", query, record);
            }
            (None, None) => {
                failed += 1;
                println!("❌ {}\n   no outcome recorded", query);
            }
        }
    }

    println!();
    println!(
        "Results: {} passed, {} failed",
        SMOKE_QUERIES.len() - failed,
        failed
    );

    if failed > 0 {
        anyhow::bail!("{} smoke queries failed", failed);
    }
    Ok(())
}
