// crates/drape-cli/src/main.rs
//
// CLI entrypoint for the Drape developer tools.
//
// Catalog, recommendation, event, and status commands talk to a running
// drape-daemon over JSON-RPC. Catalog reshuffling and mask commands work
// directly on the data directory.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::catalog::CatalogCmd;
use commands::event::EventCmd;
use commands::mask::MaskCmd;
use commands::recommend::RecommendCmd;
use commands::Context;
use output::OutputFormat;

/// Drape CLI: embedding recommendations and variance-mask discovery.
#[derive(Parser, Debug)]
#[command(name = "drape", version, about = "Drape CLI: embedding recommendations and variance masks")]
struct Cli {
    /// RPC endpoint for the drape-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50051")]
    rpc: String,

    /// Data directory for local commands.
    #[arg(long, global = true, default_value = "~/.drape/data")]
    data_dir: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Catalog listing and maintenance.
    #[command(subcommand)]
    Catalog(CatalogCmd),

    /// Rank products against recent likes.
    Recommend(RecommendCmd),

    /// Record, list, or clear interaction events.
    #[command(subcommand)]
    Event(EventCmd),

    /// Discover or inspect per-category variance masks.
    #[command(subcommand)]
    Mask(MaskCmd),

    /// Display daemon health and configuration.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = Context::new(
        &cli.rpc,
        &cli.data_dir,
        if cli.json { OutputFormat::Json } else { OutputFormat::Table },
    );

    match &cli.command {
        Commands::Catalog(cmd) => commands::catalog::run(&ctx, cmd).await?,
        Commands::Recommend(cmd) => commands::recommend::run(&ctx, cmd).await?,
        Commands::Event(cmd) => commands::event::run(&ctx, cmd).await?,
        Commands::Mask(cmd) => commands::mask::run(&ctx, cmd).await?,
        Commands::Status => commands::status::run(&ctx).await?,
    }

    Ok(())
}
