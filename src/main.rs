//! # rp-gateway
//!
//! Command-line front end for the roleplay LLM gateway.
//!
//! ## Usage
//!
//! ```bash
//! # One chat completion through the default provider
//! OPENROUTER_API_KEY=... rp-gateway chat "Hello there"
//!
//! # Featherless with extended sampling and a config file
//! rp-gateway --config gateway.toml chat -p featherless -M Sao10K/L3-8B-Stheno-v3.2 "Hi"
//!
//! # Image generation
//! SD_SERVER_URL=http://gpu-box:7860 rp-gateway image "1girl, solo, night city" -o out.png
//! ```

use anyhow::Result;
use clap::Parser;
use gateway_config::{apply_env_overrides, load_config, load_from_file, GatewayConfig};
use gateway_telemetry::init_logging;
use tracing::{error, info};

mod cli;

use cli::Cli;

/// Application entry point
#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load(&cli).await?;

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        default_provider = %config.default_provider,
        "Configuration loaded"
    );

    cli.execute(config).await
}

async fn load(cli: &Cli) -> Result<GatewayConfig> {
    let Some(path) = cli.config.as_deref() else {
        return Ok(load_config().await?);
    };

    let mut config = load_from_file(path).await?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
