//! prism-relay: false-color frame relay daemon.
//!
//! Accepts raw frames from a hardware producer on one TCP endpoint and
//! serves JPEG-encoded, colorized frames to a viewer on another. Runs
//! until ctrl-c.

mod config;

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prism_core::RelayServer;

use crate::config::RelayConfig;

#[derive(Parser, Debug)]
#[command(name = "prism-relay", version, about = "False-color frame relay")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "prism.toml")]
    config: PathBuf,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    gen_config: bool,

    /// Override the producer endpoint port.
    #[arg(long)]
    producer_port: Option<u16>,

    /// Override the viewer endpoint port.
    #[arg(long)]
    viewer_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        RelayConfig::write_default(&cli.config)?;
        println!("wrote default configuration to {}", cli.config.display());
        return Ok(());
    }

    let mut config = RelayConfig::load(&cli.config);
    if let Some(port) = cli.producer_port {
        config.network.producer_port = port;
    }
    if let Some(port) = cli.viewer_port {
        config.network.viewer_port = port;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("prism-relay v{}", env!("CARGO_PKG_VERSION"));

    let server_config = config.to_server_config()?;
    info!("frame geometry: {}", server_config.geometry);
    info!("jpeg quality: {}", server_config.jpeg_quality);
    info!("default colormap: {}", server_config.default_colormap);

    let server = RelayServer::bind(server_config).await?;
    let stop = server.stop_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            stop.store(false, Ordering::SeqCst);
        }
    });

    server.run().await?;
    Ok(())
}
