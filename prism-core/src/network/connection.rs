//! Managed TCP connection speaking the envelope protocol.
//!
//! A [`Connection`] owns two background tasks:
//! - a writer draining an mpsc queue into the framed sink
//! - a reader pumping decoded envelopes into an mpsc queue
//!
//! Both tasks exit when the socket fails, the peer disconnects, or the
//! connection is closed. Closing is idempotent.

use std::fmt;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::EnvelopeCodec;
use crate::envelope::Envelope;
use crate::error::Error;

/// Depth of the send and receive queues. With frame traffic this is
/// a few seconds of backlog; beyond it the pipeline drops, not blocks.
const QUEUE_DEPTH: usize = 100;

/// Keepalive interval for idle connections.
const PING_INTERVAL: Duration = Duration::from_secs(5);

// ── ConnectionInfo ───────────────────────────────────────────────

/// Dialing information for a remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    ip: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

// ── ConnectionSender ─────────────────────────────────────────────

/// Cloneable handle for pushing envelopes to a connection without
/// owning it. Used by the relay to fan frames out to the viewer.
#[derive(Debug, Clone)]
pub struct ConnectionSender {
    tx: mpsc::Sender<Envelope>,
}

impl ConnectionSender {
    pub(crate) fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Queue an envelope, waiting for capacity.
    pub async fn send(&self, envelope: Envelope) -> Result<(), Error> {
        Ok(self.tx.send(envelope).await?)
    }

    /// Queue an envelope without waiting. `Full` means the peer is not
    /// keeping up; `Closed` means the connection is gone.
    pub fn try_send(&self, envelope: Envelope) -> Result<(), TrySendError<Envelope>> {
        self.tx.try_send(envelope)
    }
}

// ── Connection ───────────────────────────────────────────────────

#[derive(Debug)]
pub struct Connection {
    tx: mpsc::Sender<Envelope>,
    rx: mpsc::Receiver<Envelope>,
    shutdown: CancellationToken,
}

impl Connection {
    /// Take ownership of an established stream and spawn the pump tasks.
    pub fn new(stream: TcpStream) -> Self {
        let (mut net_writer, mut net_reader) = Framed::new(stream, EnvelopeCodec).split();

        let (user_tx, mut outbound_rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);
        let (inbound_tx, user_rx) = mpsc::channel::<Envelope>(QUEUE_DEPTH);
        let shutdown = CancellationToken::new();

        // Writer: drain the outbound queue into the socket.
        let writer_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.cancelled() => break,
                    maybe = outbound_rx.recv() => match maybe {
                        Some(envelope) => {
                            if let Err(e) = net_writer.send(envelope).await {
                                warn!("network write error: {e}");
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            let _ = net_writer.close().await;
        });

        // Reader: pump decoded envelopes to the owner.
        let reader_shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_shutdown.cancelled() => break,
                    maybe = net_reader.next() => match maybe {
                        Some(Ok(envelope)) => {
                            if inbound_tx.send(envelope).await.is_err() {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!("network read error: {e}");
                            break;
                        }
                        None => {
                            debug!("peer closed the connection");
                            break;
                        }
                    },
                }
            }
        });

        // Keepalive: periodic pings so idle links stay open. Stops as
        // soon as the writer side goes away.
        let ping_tx = user_tx.clone();
        let ping_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PING_INTERVAL);
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = ping_shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        if ping_tx.send(Envelope::ping()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            tx: user_tx,
            rx: user_rx,
            shutdown,
        }
    }

    /// Dial a remote endpoint.
    pub async fn connect(info: &ConnectionInfo) -> Result<Self, Error> {
        let stream = TcpStream::connect(info.to_string()).await?;
        Ok(Self::new(stream))
    }

    /// Queue an envelope for transmission.
    pub async fn send(&self, envelope: Envelope) -> Result<(), Error> {
        Ok(self.tx.send(envelope).await?)
    }

    /// Next envelope from the peer, or `None` once the connection is done.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Detached handle for pushing envelopes to this connection.
    pub fn sender(&self) -> ConnectionSender {
        ConnectionSender::new(self.tx.clone())
    }

    /// Tear the connection down. Safe to call more than once.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
