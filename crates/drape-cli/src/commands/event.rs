// crates/drape-cli/src/commands/event.rs
//
// `drape event {like, record, list, clear}`: interaction log commands.

use clap::Subcommand;
use serde_json::json;
use tabled::Tabled;

use drape_core::LIKE_ACTION;
use drape_rpc::handlers::events::{ClearEventsResponse, ListEventsResponse, RecordEventResponse};

use super::Context;
use crate::output::{format_json, format_table, OutputFormat};
use crate::rpc_client;

/// Event subcommands.
#[derive(Debug, Subcommand)]
pub enum EventCmd {
    /// Like a product.
    Like {
        /// Product id.
        product_id: String,
    },
    /// Record an arbitrary interaction.
    Record {
        #[arg(long)]
        product_id: String,
        /// Action tag; only "like" affects recommendations.
        #[arg(long)]
        action: String,
    },
    /// List every recorded event, oldest first.
    List,
    /// Delete every recorded event.
    Clear,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    timestamp: String,
    #[tabled(rename = "Product")]
    product_id: String,
    #[tabled(rename = "Action")]
    action: String,
}

/// Run the event subcommand.
pub async fn run(ctx: &Context, cmd: &EventCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        EventCmd::Like { product_id } => record(ctx, product_id, LIKE_ACTION).await?,
        EventCmd::Record { product_id, action } => record(ctx, product_id, action).await?,
        EventCmd::List => {
            let resp: ListEventsResponse = rpc_client::call(&ctx.rpc, "events/list", json!({})).await?;
            if ctx.format == OutputFormat::Json {
                println!("{}", format_json(&resp));
                return Ok(());
            }
            let rows: Vec<EventRow> = resp
                .events
                .into_iter()
                .map(|e| EventRow {
                    timestamp: e.timestamp.to_rfc3339(),
                    product_id: e.product_id,
                    action: e.action,
                })
                .collect();
            println!("{}", format_table(&rows));
            println!("{} events", resp.count);
        }
        EventCmd::Clear => {
            let resp: ClearEventsResponse = rpc_client::call(&ctx.rpc, "events/clear", json!({})).await?;
            if ctx.format == OutputFormat::Json {
                println!("{}", format_json(&resp));
            } else {
                println!("Event log cleared.");
            }
        }
    }

    Ok(())
}

async fn record(ctx: &Context, product_id: &str, action: &str) -> Result<(), Box<dyn std::error::Error>> {
    let params = json!({ "productId": product_id, "action": action });
    let resp: RecordEventResponse = rpc_client::call(&ctx.rpc, "events/record", params).await?;
    if ctx.format == OutputFormat::Json {
        println!("{}", format_json(&resp));
    } else {
        println!(
            "Recorded {} on {} at {}",
            resp.event.action,
            resp.event.product_id,
            resp.event.timestamp.to_rfc3339()
        );
    }
    Ok(())
}
