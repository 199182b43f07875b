//! `codespaces-proxy` binary entrypoint.

use std::path::PathBuf;

use clap::Parser;
use codespaces_proxy::{serve, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "codespaces-proxy", version, about)]
struct Cli {
    /// YAML config file; values override environment defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Respect `RUST_LOG` if set; otherwise default to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ProxyConfig::from_yaml_file(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    serve(config).await
}
