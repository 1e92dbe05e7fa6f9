//! contentstore CLI entrypoint

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contentstore::cli::Cli;
use contentstore::config;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG wins, then the config file's log_level
    let default_level = config::config()
        .ok()
        .and_then(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|| "info".to_string());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Parse and execute CLI
    let cli = Cli::parse();
    cli.execute().await
}
