//! Relay binary entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use hookrelay::channels::{ChannelAdapter, DeliveryCoordinator, EmailAdapter, OneBotAdapter};
use hookrelay::config::Config;
use hookrelay::ingest::{self, AppState};
use hookrelay::server::RelayServer;
use hookrelay::sink::LogSink;
use hookrelay::viewer;

#[derive(Parser, Debug)]
#[command(name = "hookrelay")]
#[command(about = "Webhook message relay: ingest, log, view, and fan out notifications")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "relay.yaml")]
    config: PathBuf,

    /// Override the configured listen address (host:port).
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Disable the live console viewer even if enabled in configuration.
    #[arg(long)]
    no_viewer: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let addr = match cli.listen {
        Some(addr) => addr,
        None => config.bind_addr()?,
    };

    let sink = Arc::new(LogSink::open(&config.relay.logs_dir)?);

    let viewer_handle = if config.gui.enabled && !cli.no_viewer {
        let replay = sink.path_for(chrono::Local::now().date_naive());
        let (handle, _task) = viewer::spawn_viewer(Some(replay));
        Some(handle)
    } else {
        None
    };

    let adapters: Vec<Arc<dyn ChannelAdapter>> = vec![
        Arc::new(OneBotAdapter::new(config.onebot.clone())),
        Arc::new(EmailAdapter::new(config.email.clone())),
    ];
    let coordinator = Arc::new(DeliveryCoordinator::new(adapters));

    let state = AppState {
        config: Arc::new(config),
        sink,
        viewer: viewer_handle,
        coordinator,
    };

    let mut server = RelayServer::new(addr, ingest::routes(state));
    server.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    tracing::info!("Shutdown signal received");
    server.shutdown().await;

    Ok(())
}
