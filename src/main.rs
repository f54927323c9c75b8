// src/main.rs

//! The main entry point for the wsrelay server.

use anyhow::Result;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::{filter::EnvFilter, prelude::*};
use wsrelay::config::{Config, ConfigSource};
use wsrelay::server;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("wsrelay version {VERSION}");
        return Ok(());
    }

    // An explicit --config path must exist; the default one may be absent.
    let explicit_config = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let loaded = match explicit_config {
        Some(path) => Config::from_file(path).map(|cfg| (cfg, ConfigSource::File)),
        None => Config::from_file_or_default(DEFAULT_CONFIG_PATH),
    };
    let (mut config, source) = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            let path = explicit_config.unwrap_or(DEFAULT_CONFIG_PATH);
            eprintln!("Failed to load configuration from \"{path}\": {e:#}");
            std::process::exit(1);
        }
    };

    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        if let Some(port_str) = args.get(port_index + 1) {
            match port_str.parse::<u16>() {
                Ok(port) if port != 0 => config.port = port,
                _ => {
                    eprintln!("Invalid port number: {port_str}");
                    std::process::exit(1);
                }
            }
        } else {
            eprintln!("--port flag requires a value");
            std::process::exit(1);
        }
    }

    // RUST_LOG wins over the configured level.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true),
        )
        .init();

    match source {
        ConfigSource::File => info!("Configuration loaded; starting server."),
        ConfigSource::Defaults => warn!(
            "Config file '{}' not found; starting with built-in defaults.",
            DEFAULT_CONFIG_PATH
        ),
    }
    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {}", e);
        return Err(e);
    }

    Ok(())
}
