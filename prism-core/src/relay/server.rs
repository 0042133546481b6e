//! The relay server: two listening endpoints and the pipeline between
//! them.
//!
//! The producer endpoint ingests raw frames; the viewer endpoint emits
//! JPEGs and accepts JSON control messages. Each accepted connection
//! runs in its own task and claims its role slot, displacing any
//! previous occupant. Per-message failures are logged and contained;
//! only a failed bind is fatal.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::color::Colormap;
use crate::envelope::{Envelope, EnvelopeKind};
use crate::error::Error;
use crate::frame::{ColorFrame, FrameDecoder, FrameGeometry};
use crate::jpeg::JpegEncoder;
use crate::network::Connection;
use crate::relay::control::ViewerSettings;
use crate::relay::slot::{RoleSlot, SlotPush};
use crate::relay::state::RelayState;

// ── Configuration ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RelayServerConfig {
    /// Endpoint the hardware producer pushes raw frames to.
    pub producer_addr: SocketAddr,
    /// Endpoint the visualization client connects to.
    pub viewer_addr: SocketAddr,
    /// Geometry every producer frame is validated against.
    pub geometry: FrameGeometry,
    /// JPEG quality for outbound viewer frames.
    pub jpeg_quality: u8,
    /// Colormap in force before the first control message.
    pub default_colormap: Colormap,
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            producer_addr: SocketAddr::from(([0, 0, 0, 0], 8002)),
            viewer_addr: SocketAddr::from(([127, 0, 0, 1], 8001)),
            geometry: FrameGeometry::default(),
            jpeg_quality: JpegEncoder::DEFAULT_QUALITY,
            default_colormap: Colormap::Inferno,
        }
    }
}

// ── RelayServer ──────────────────────────────────────────────────

pub struct RelayServer {
    producer_listener: TcpListener,
    viewer_listener: TcpListener,
    geometry: FrameGeometry,
    encoder: JpegEncoder,
    state: Arc<RelayState>,
    producer_slot: Arc<RoleSlot>,
    viewer_slot: Arc<RoleSlot>,
    sessions: CancellationToken,
    running: Arc<AtomicBool>,
}

impl RelayServer {
    /// Bind both endpoints. A bind failure here is fatal to startup;
    /// everything after this point is contained per-connection.
    pub async fn bind(config: RelayServerConfig) -> Result<Self, Error> {
        let producer_listener = TcpListener::bind(config.producer_addr).await?;
        let viewer_listener = TcpListener::bind(config.viewer_addr).await?;
        Ok(Self {
            producer_listener,
            viewer_listener,
            geometry: config.geometry,
            encoder: JpegEncoder::new(config.jpeg_quality),
            state: Arc::new(RelayState::new(config.default_colormap)),
            producer_slot: Arc::new(RoleSlot::new("producer")),
            viewer_slot: Arc::new(RoleSlot::new("viewer")),
            sessions: CancellationToken::new(),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Actual producer endpoint address, useful with an ephemeral port.
    pub fn producer_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.producer_listener.local_addr()?)
    }

    /// Actual viewer endpoint address.
    pub fn viewer_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.viewer_listener.local_addr()?)
    }

    /// Handle that stops the server when stored to false.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Accept connections on both endpoints until stopped.
    pub async fn run(&self) -> Result<(), Error> {
        self.running.store(true, Ordering::SeqCst);
        info!("producer endpoint listening on {}", self.producer_addr()?);
        info!("viewer endpoint listening on {}", self.viewer_addr()?);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                result = self.producer_listener.accept() => match result {
                    Ok((stream, peer)) => self.spawn_producer(stream, peer),
                    Err(e) => warn!("producer accept error: {e}"),
                },
                result = self.viewer_listener.accept() => match result {
                    Ok((stream, peer)) => self.spawn_viewer(stream, peer),
                    Err(e) => warn!("viewer accept error: {e}"),
                },
                _ = Self::wait_for_stop(&self.running) => break,
            }
        }

        self.sessions.cancel();
        self.running.store(false, Ordering::SeqCst);
        info!("relay stopped");
        Ok(())
    }

    fn spawn_producer(&self, stream: TcpStream, peer: SocketAddr) {
        let connection = Connection::new(stream);
        let sender = connection.sender();
        let cancel = self.sessions.child_token();
        let producer_slot = Arc::clone(&self.producer_slot);
        let viewer_slot = Arc::clone(&self.viewer_slot);
        let state = Arc::clone(&self.state);
        let decoder = FrameDecoder::new(self.geometry);
        let encoder = self.encoder;

        tokio::spawn(async move {
            let id = producer_slot.claim(sender, cancel.clone()).await;
            info!("producer connected from {peer}");
            producer_session(connection, cancel, decoder, encoder, &state, &viewer_slot).await;
            producer_slot.release(id).await;
            info!("producer {peer} disconnected");
        });
    }

    fn spawn_viewer(&self, stream: TcpStream, peer: SocketAddr) {
        let connection = Connection::new(stream);
        let sender = connection.sender();
        let cancel = self.sessions.child_token();
        let viewer_slot = Arc::clone(&self.viewer_slot);
        let state = Arc::clone(&self.state);
        let encoder = self.encoder;

        tokio::spawn(async move {
            let id = viewer_slot.claim(sender, cancel.clone()).await;
            info!("viewer connected from {peer}");
            viewer_session(connection, cancel, encoder, &state, &viewer_slot).await;
            viewer_slot.release(id).await;
            info!("viewer {peer} disconnected");
        });
    }

    async fn wait_for_stop(running: &Arc<AtomicBool>) {
        loop {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

// ── Session loops ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SessionStats {
    received: u64,
    relayed: u64,
    dropped: u64,
    discarded: u64,
}

/// Ingest raw frames: decode, cache, colorize, encode, push.
///
/// Every per-frame failure drops that frame and keeps the session
/// alive; the producer stream must survive its own bad input.
async fn producer_session(
    mut connection: Connection,
    cancel: CancellationToken,
    decoder: FrameDecoder,
    encoder: JpegEncoder,
    state: &RelayState,
    viewer_slot: &RoleSlot,
) {
    let mut stats = SessionStats::default();

    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = connection.recv() => match maybe {
                Some(envelope) => envelope,
                None => break,
            },
        };

        match envelope.kind() {
            EnvelopeKind::Frame => {
                stats.received += 1;
                let gray = match decoder.decode(envelope.payload()) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("frame dropped: {e}");
                        stats.dropped += 1;
                        continue;
                    }
                };

                let colored = state.ingest(gray).await;
                let outbound = match encode_frame(&encoder, &colored) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("frame dropped: {e}");
                        stats.dropped += 1;
                        continue;
                    }
                };

                match viewer_slot.push(outbound).await {
                    SlotPush::Sent => stats.relayed += 1,
                    SlotPush::Empty | SlotPush::Closed => stats.discarded += 1,
                    SlotPush::Dropped => stats.dropped += 1,
                }

                if stats.received % 100 == 0 {
                    debug!(
                        "{} frames in: {} relayed, {} dropped, {} discarded",
                        stats.received, stats.relayed, stats.dropped, stats.discarded
                    );
                }
            }
            EnvelopeKind::Control => {
                warn!("control envelope on the producer endpoint, ignoring");
            }
            EnvelopeKind::Ping => {}
        }
    }

    debug!(
        "producer session ended: {} frames in, {} relayed, {} dropped, {} discarded",
        stats.received, stats.relayed, stats.dropped, stats.discarded
    );
}

/// Serve one viewer: apply its control messages and hand recolored
/// cache frames back through the slot.
async fn viewer_session(
    mut connection: Connection,
    cancel: CancellationToken,
    encoder: JpegEncoder,
    state: &RelayState,
    viewer_slot: &RoleSlot,
) {
    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = connection.recv() => match maybe {
                Some(envelope) => envelope,
                None => break,
            },
        };

        match envelope.kind() {
            EnvelopeKind::Control => {
                let settings = match ViewerSettings::parse(envelope.payload()) {
                    Ok(settings) => settings,
                    Err(e) => {
                        warn!("control message ignored: {e}");
                        continue;
                    }
                };
                let Some(name) = settings.colormap else {
                    continue;
                };

                let colormap = Colormap::resolve(&name);
                if !state.switch_colormap(colormap).await {
                    debug!("colormap {colormap} already in force");
                    continue;
                }
                info!("colormap switched to {colormap}");

                // Recolor the cached frame so the switch is visible
                // without waiting for new producer traffic.
                let Some(colored) = state.recolor().await else {
                    continue;
                };
                match encode_frame(&encoder, &colored) {
                    Ok(outbound) => {
                        viewer_slot.push(outbound).await;
                    }
                    Err(e) => warn!("recolored frame not sent: {e}"),
                }
            }
            EnvelopeKind::Frame => {
                warn!("binary frame from the viewer, ignoring");
            }
            EnvelopeKind::Ping => {}
        }
    }
}

fn encode_frame(encoder: &JpegEncoder, frame: &ColorFrame) -> Result<Envelope, Error> {
    Envelope::frame(encoder.encode(frame)?)
}
