//! prism-feed: synthetic frame producer.
//!
//! Dials the relay's producer endpoint and streams generated frames at
//! a fixed rate. Stands in for the capture hardware during bring-up
//! and soak testing.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use prism_core::{Connection, ConnectionInfo, Envelope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Pattern {
    /// Diagonal gradient that drifts one step per frame.
    Gradient,
    /// Every pixel at the same intensity.
    Solid,
}

#[derive(Parser, Debug)]
#[command(name = "prism-feed", version, about = "Synthetic frame producer")]
struct Cli {
    /// Relay host to dial.
    #[arg(long, default_value = "127.0.0.1")]
    addr: String,

    /// Relay producer endpoint port.
    #[arg(long, default_value_t = 8002)]
    port: u16,

    #[arg(long, value_enum, default_value_t = Pattern::Gradient)]
    pattern: Pattern,

    /// Intensity for the solid pattern.
    #[arg(long, default_value_t = 128)]
    value: u8,

    /// Channels per pixel: 1 (grayscale) or 3 (duplicated RGB).
    #[arg(long, default_value_t = 1)]
    channels: u8,

    /// zstd-compress each frame before sending.
    #[arg(long)]
    compress: bool,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Number of frames to send; 0 streams until interrupted.
    #[arg(long, default_value_t = 0)]
    count: u64,

    /// Frame width in pixels.
    #[arg(long, default_value_t = 960)]
    width: u32,

    /// Frame height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn build_payload(cli: &Cli, tick: u64) -> std::io::Result<Vec<u8>> {
    let pixels = cli.width as usize * cli.height as usize;
    let gray = match cli.pattern {
        Pattern::Solid => vec![cli.value; pixels],
        Pattern::Gradient => {
            let mut data = Vec::with_capacity(pixels);
            for y in 0..cli.height as u64 {
                for x in 0..cli.width as u64 {
                    data.push(((x + y + tick) % 256) as u8);
                }
            }
            data
        }
    };

    let bytes = if cli.channels == 3 {
        let mut rgb = Vec::with_capacity(gray.len() * 3);
        for &v in &gray {
            rgb.extend_from_slice(&[v, v, v]);
        }
        rgb
    } else {
        gray
    };

    if cli.compress {
        zstd::encode_all(bytes.as_slice(), 3)
    } else {
        Ok(bytes)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.channels != 1 && cli.channels != 3 {
        return Err("channels must be 1 or 3".into());
    }

    let info = ConnectionInfo::new(cli.addr.clone(), cli.port);
    info!("prism-feed v{} dialing {info}", env!("CARGO_PKG_VERSION"));
    let connection = Connection::connect(&info).await?;

    let fps = cli.fps.max(1);
    info!(
        "streaming {}x{} {:?} frames at {fps} fps",
        cli.width, cli.height, cli.pattern
    );

    let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
    let mut sent = 0u64;

    while cli.count == 0 || sent < cli.count {
        interval.tick().await;
        let payload = build_payload(&cli, sent)?;
        connection.send(Envelope::frame(payload)?).await?;
        sent += 1;
        if sent % 100 == 0 {
            info!("{sent} frames sent");
        }
    }

    info!("done, {sent} frames sent");
    connection.close();
    Ok(())
}
