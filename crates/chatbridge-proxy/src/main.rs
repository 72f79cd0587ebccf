//! `chatbridge` binary entrypoint.
//!
//! Loads configuration (environment, then YAML file, then flags) and starts
//! the Actix Web server.

use chatbridge_proxy::{serve, ProxyConfig};
use clap::Parser;
use std::path::PathBuf;

/// OpenAI-compatible chat completions proxy for Anthropic models
#[derive(Parser, Debug)]
#[command(name = "chatbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a chatbridge.yml configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides HOST and the config file)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT and the config file)
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
    let mut config = ProxyConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    serve(config).await
}
