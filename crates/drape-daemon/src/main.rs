// crates/drape-daemon/src/main.rs
//
// Binary entrypoint for the Drape daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, wires the
// file-backed stores into a Recommender, and serves the RPC API until
// interrupted.

mod config;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use config::{expand_tilde, DaemonConfig};

use drape_core::traits::{CatalogSource, EmbeddingSource};
use drape_rank::Recommender;
use drape_rpc::{DrapeRpcServer, RpcConfig};
use drape_store::{DataLayout, JsonEmbeddings, JsonEventLog, JsonMaskStore, YamlCatalog};

/// Drape daemon: serves recommendations over JSON-RPC.
#[derive(Parser, Debug)]
#[command(name = "drape-daemon", version, about = "Drape recommendation daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.drape/config.toml")]
    config: String,

    /// Overrides `data_dir` from the configuration file.
    #[arg(long)]
    data_dir: Option<String>,

    /// Overrides `rpc_port` from the configuration file.
    #[arg(long)]
    port: Option<u16>,

    /// Score with the per-category variance mask when one exists.
    #[arg(long)]
    mask_weighting: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config is read before tracing is up, so its outcome is logged after.
    let loaded = DaemonConfig::load(&args.config);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", args.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            args.config,
            e
        ),
    }

    // CLI flags override the config file.
    if let Some(data_dir) = args.data_dir {
        daemon_config.data_dir = data_dir;
    }
    if let Some(port) = args.port {
        daemon_config.rpc_port = port;
    }
    if args.mask_weighting {
        daemon_config.rank.mask_weighting = true;
    }

    let data_dir = expand_tilde(&daemon_config.data_dir);
    tracing::info!("Drape daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", data_dir);
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );
    tracing::info!(
        window_size = daemon_config.rank.window_size,
        result_limit = daemon_config.rank.result_limit,
        mask_weighting = daemon_config.rank.mask_weighting,
        "Ranking configuration"
    );

    let layout = DataLayout::new(&data_dir);
    let catalog = Arc::new(YamlCatalog::new(layout.clone()));
    let embeddings = Arc::new(JsonEmbeddings::new(layout.clone()));

    // Sources are reloaded on every request; this only reports what is
    // there at startup.
    match catalog.load_catalog().await {
        Ok(products) => tracing::info!(products = products.len(), "Catalog available"),
        Err(e) => tracing::warn!("Catalog not readable yet: {}", e),
    }
    match embeddings.load_embeddings().await {
        Ok(table) => {
            let dimensions = table.dimensions().unwrap_or(0);
            tracing::info!(vectors = table.len(), dimensions, "Embeddings available");
            let odd = table.inconsistent_ids(dimensions);
            if !odd.is_empty() {
                tracing::warn!(
                    expected = dimensions,
                    ids = ?odd,
                    "Embeddings with a different length will score 0"
                );
            }
        }
        Err(e) => tracing::warn!("Embeddings not readable yet: {}", e),
    }

    let recommender = Arc::new(Recommender::new(
        catalog,
        embeddings,
        Arc::new(JsonEventLog::new(layout.clone())),
        Arc::new(JsonMaskStore::new(layout)),
        daemon_config.rank,
    ));

    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let rpc_server = DrapeRpcServer::new(rpc_config, recommender).with_start_time(Instant::now());

    rpc_server
        .start_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Drape daemon shut down gracefully");
    Ok(())
}
