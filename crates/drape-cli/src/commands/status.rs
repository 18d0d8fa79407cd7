// crates/drape-cli/src/commands/status.rs
//
// `drape status`: daemon health and configuration.

use serde_json::json;

use drape_rpc::handlers::node::GetHealthResponse;

use super::Context;
use crate::output::{format_json, OutputFormat};
use crate::rpc_client;

/// Run the status command.
pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let health: GetHealthResponse = match rpc_client::call(&ctx.rpc, "node/health", json!({})).await {
        Ok(health) => health,
        Err(e) => {
            println!("Drape CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("  Connection:   unreachable ({})", e);
            println!("  RPC endpoint: {}", ctx.rpc);
            return Err(e);
        }
    };

    if ctx.format == OutputFormat::Json {
        println!("{}", format_json(&health));
        return Ok(());
    }

    println!("Drape daemon v{}", health.version);
    println!();
    println!("Node Status");
    println!("-----------");
    println!("  Status:         {}", health.status);
    println!("  RPC endpoint:   {}", ctx.rpc);
    println!("  Uptime:         {}s", health.uptime_seconds);
    println!("  Storage:        {}", if health.storage_ok { "ok" } else { "error" });
    println!("  Catalog:        {} public products", health.catalog_size);
    println!("  Events:         {}", health.event_count);
    println!("  Window size:    {}", health.window_size);
    println!("  Result limit:   {}", health.result_limit);
    println!(
        "  Mask weighting: {}",
        if health.mask_weighting { "on" } else { "off" }
    );
    if let Some(details) = health.details {
        println!("  Details:        {}", details);
    }

    Ok(())
}
