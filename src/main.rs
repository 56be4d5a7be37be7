//! rewrite-body reverse proxy.
//!
//! Fronts a single upstream and rewrites eligible response bodies on the way
//! back.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ TraceLayer ──▶ TimeoutLayer ──▶ RewriteBody ──▶ proxy handler ──▶ Upstream
//!                                                     │
//!     Client ◀───────────── single write ◀── capture / decode / rewrite / encode
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_body::config::{load_config, ProxyConfig};
use rewrite_body::observability::{logging, metrics};
use rewrite_body::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "rewrite-body")]
#[command(about = "Reverse proxy that rewrites response bodies", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!("rewrite-body v{} starting", env!("CARGO_PKG_VERSION"));

    match serde_json::to_string(&config) {
        Ok(json) => tracing::debug!(config = %json, "Configuration loaded"),
        Err(err) => tracing::warn!(error = %err, "Unable to render configuration"),
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
