//! ArenaKV server binary.

use arenakv_common::config::{
    DEFAULT_CACHE_SLOTS, DEFAULT_INDEX_SIZE, DEFAULT_MEMORY_SIZE, DEFAULT_PORT,
};
use arenakv_common::{Result, ServerConfig, StoreConfig};
use arenakv_core::Store;
use arenakv_server::server::Server;
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Networked in-memory key-value store over a pre-allocated arena.
#[derive(Parser)]
#[command(name = "arenakv", version, about)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Arena size in bytes
    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: usize,

    /// Index sizing parameter in bytes
    #[arg(long, default_value_t = DEFAULT_INDEX_SIZE)]
    index_size: usize,

    /// Number of direct-mapped cache slots
    #[arg(long, default_value_t = DEFAULT_CACHE_SLOTS)]
    cache_slots: usize,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let store_config = StoreConfig {
        memory_size: cli.memory_size,
        index_size: cli.index_size,
        cache_slots: cli.cache_slots,
    };
    let server_config = ServerConfig {
        host: cli.host,
        port: cli.port,
    };

    let store = Store::new(&store_config)?;
    tracing::info!(
        arena_bytes = store_config.memory_size,
        heap_bytes = store.layout().heap().len(),
        buckets = store.layout().htable_len(),
        "store initialized"
    );

    let server = Server::bind(&server_config, Arc::new(Mutex::new(store))).await?;
    server.serve().await
}
