//! Webhook Bridge
//!
//! Mirrors chat messages between two independently hosted chat workspaces.
//! Each configured bridge pairs two sides:
//!
//! 1. **Inbound**: a side's outgoing webhook posts `token`, `user_name` and
//!    `text` to the bridge's endpoint. The token tells us which side it is.
//!
//! 2. **Outbound**: the message is posted as `{text, username}` to the other
//!    side's incoming webhook, with the author name prefixed by the origin
//!    side's label.
//!
//! Messages whose author carries the relay marker were posted by the bridge
//! itself and are never relayed again.

mod bridge;
mod config;
mod delivery;
mod error;
mod server;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use config::Config;
use delivery::DeliverySender;
use error::StartupError;

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "webhook-bridge", version, about = "Bidirectional chat webhook bridge")]
struct Args {
    /// Path to the bridge configuration file
    #[arg(default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webhook_bridge=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::error!(error = %e, "Webhook bridge stopped");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), StartupError> {
    let config = Config::load(&args.config)?;
    tracing::info!(
        path = %args.config.display(),
        bridges = config.bridges.len(),
        enabled = config.enabled_bridges().count(),
        "Configuration loaded"
    );

    let sender = DeliverySender::new(config.delivery_timeout()).map_err(StartupError::Client)?;
    let app = server::build_router(&config, sender);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    tracing::info!("Webhook bridge listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(StartupError::Serve)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
