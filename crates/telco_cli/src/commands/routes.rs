//! Routes command - Print the routing table.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use telco_core::routing_table;

#[derive(Args)]
pub struct RoutesArgs {
    /// Print the table as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: RoutesArgs) -> Result<()> {
    let table = routing_table();

    if args.json {
        let rows: Vec<_> = table
            .iter()
            .map(|(category, handler)| json!({ "category": category, "handler": handler }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<16} {}", "CATEGORY", "HANDLER");
    for (category, handler) in table {
        println!("{:<16} {}", category.as_str(), handler.display_name());
    }
    Ok(())
}
