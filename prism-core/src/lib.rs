//! # prism-core
//!
//! Core library for the Prism frame relay. A hardware producer pushes
//! raw grayscale (or channel-duplicated RGB) frames over TCP; the
//! relay normalizes them, applies the selected false-color transform,
//! and forwards JPEG-encoded frames to a single viewer. The viewer can
//! switch colormaps at any time and immediately sees the cached last
//! frame re-rendered.
//!
//! This crate provides:
//! - **Wire protocol**: length-prefixed, checksummed envelopes
//!   ([`envelope`], [`codec`])
//! - **Connection management**: framed TCP with queued send/receive
//!   and keepalive ([`network`])
//! - **Frame handling**: payload normalization and the last-frame
//!   cache ([`frame`])
//! - **Color engine**: arithmetic ramps and preset lookup tables
//!   ([`color`])
//! - **JPEG boundary**: fixed-quality encoding for the viewer
//!   ([`jpeg`])
//! - **Relay service**: endpoints, role slots, and session state
//!   ([`relay`])

pub mod codec;
pub mod color;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod jpeg;
pub mod network;
pub mod relay;

pub use codec::EnvelopeCodec;
pub use color::{Colormap, colorize};
pub use envelope::{Envelope, EnvelopeHeader, EnvelopeKind, MAGIC, MAX_PAYLOAD_SIZE};
pub use error::Error;
pub use frame::{ColorFrame, FrameCache, FrameDecoder, FrameGeometry, GrayFrame};
pub use jpeg::JpegEncoder;
pub use network::{Connection, ConnectionInfo, ConnectionSender};
pub use relay::{RelayServer, RelayServerConfig, RelayState, RoleSlot, SlotPush, ViewerSettings};
