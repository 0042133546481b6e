//! Wire envelope for the relay protocol.
//!
//! Every message on either endpoint travels inside an envelope:
//!
//! ```text
//! ┌──────────┬───────────┬───────────────┬──────────────────┬─────────────┐
//! │ magic: 4 │ kind: u8  │ checksum: u32 │ payload_len: u32 │ payload ... │
//! └──────────┴───────────┴───────────────┴──────────────────┴─────────────┘
//! ```
//!
//! All integers are little-endian. The checksum is the first four bytes
//! of the BLAKE3 hash of the payload. Payloads are capped at 4 MiB,
//! large enough for an uncompressed 960x720 three-channel frame.

use std::fmt;

use crate::error::Error;

/// Protocol magic, first four bytes of every envelope.
pub const MAGIC: [u8; 4] = *b"PRM1";

/// Hard upper bound on payload size.
pub const MAX_PAYLOAD_SIZE: usize = 4 * 1024 * 1024;

// ── EnvelopeKind ─────────────────────────────────────────────────

/// Discriminates what an envelope carries.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// A raw pixel buffer (producer endpoint) or an encoded JPEG
    /// (viewer endpoint).
    Frame = 0x1,
    /// A JSON settings message pushed by the viewer.
    Control = 0x2,
    /// Keepalive. Empty payload, ignored by receivers on both endpoints.
    Ping = 0x3,
}

impl TryFrom<u8> for EnvelopeKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x1 => Ok(EnvelopeKind::Frame),
            0x2 => Ok(EnvelopeKind::Control),
            0x3 => Ok(EnvelopeKind::Ping),
            _ => Err(Error::UnknownVariant {
                type_name: "EnvelopeKind",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvelopeKind::Frame => "frame",
            EnvelopeKind::Control => "control",
            EnvelopeKind::Ping => "ping",
        };
        write!(f, "{name}")
    }
}

// ── EnvelopeHeader ───────────────────────────────────────────────

/// Fixed-size header preceding every payload.
///
/// `kind` stays a raw byte here so that an unknown discriminant can be
/// skipped per-message instead of poisoning the whole stream; it is
/// validated when the envelope is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub kind: u8,
    pub checksum: u32,
    pub payload_len: u32,
}

impl EnvelopeHeader {
    pub const SIZE: usize = 13;

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = self.kind;
        buf[5..9].copy_from_slice(&self.checksum.to_le_bytes());
        buf[9..13].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        if data.len() < Self::SIZE {
            return Err(Error::InvalidHeader("truncated envelope header"));
        }
        if data[0..4] != MAGIC {
            return Err(Error::InvalidMagic);
        }
        Ok(Self {
            kind: data[4],
            checksum: u32::from_le_bytes(data[5..9].try_into().unwrap()),
            payload_len: u32::from_le_bytes(data[9..13].try_into().unwrap()),
        })
    }
}

// ── Envelope ─────────────────────────────────────────────────────

/// A validated protocol message: kind plus checksummed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: EnvelopeKind,
    payload: Vec<u8>,
}

impl Envelope {
    /// Wrap a raw or JPEG frame payload.
    pub fn frame(payload: Vec<u8>) -> Result<Self, Error> {
        Self::new(EnvelopeKind::Frame, payload)
    }

    /// Wrap a JSON control payload.
    pub fn control(payload: Vec<u8>) -> Result<Self, Error> {
        Self::new(EnvelopeKind::Control, payload)
    }

    /// An empty keepalive envelope.
    pub fn ping() -> Self {
        Self {
            kind: EnvelopeKind::Ping,
            payload: Vec::new(),
        }
    }

    pub fn new(kind: EnvelopeKind, payload: Vec<u8>) -> Result<Self, Error> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self { kind, payload })
    }

    /// Reassemble an envelope received off the wire, verifying the
    /// kind discriminant and the payload checksum.
    pub(crate) fn from_parts(header: EnvelopeHeader, payload: &[u8]) -> Result<Self, Error> {
        let kind = EnvelopeKind::try_from(header.kind)?;
        let computed = payload_checksum(payload);
        if header.checksum != computed {
            return Err(Error::ChecksumMismatch);
        }
        Ok(Self {
            kind,
            payload: payload.to_vec(),
        })
    }

    pub fn kind(&self) -> EnvelopeKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Header for this envelope, checksum included.
    pub fn header(&self) -> EnvelopeHeader {
        EnvelopeHeader {
            kind: self.kind as u8,
            checksum: payload_checksum(&self.payload),
            payload_len: self.payload.len() as u32,
        }
    }
}

/// First four bytes of the BLAKE3 payload hash, little-endian.
fn payload_checksum(payload: &[u8]) -> u32 {
    let hash = blake3::hash(payload);
    u32::from_le_bytes(hash.as_bytes()[0..4].try_into().unwrap())
}
