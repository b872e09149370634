//! Docvault Server binary
//!
//! Loads `.env`, configuration files, environment and flags, then serves
//! until SIGTERM or Ctrl+C.

use clap::Parser;
use server::{CliArgs, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = CliArgs::parse();

    // Load configuration
    let mut config = ServerConfig::load()?;
    config.apply_cli(cli);

    // Start server
    server::start_server(config).await?;

    Ok(())
}
