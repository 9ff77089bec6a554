//! Crosswire server binary.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use crosswire_server::{ServerConfig, serve};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,crosswire_server=debug")),
        )
        .init();

    let config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    let config = config.with_overrides(cli.overrides())?;

    info!(
        addr = %config.bind_addr(),
        path = %config.path(),
        rules = ?config.rules(),
        "Starting crosswire server"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    serve(listener, &config).await?;

    Ok(())
}
