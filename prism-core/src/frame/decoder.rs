//! Raw frame payload decoding.
//!
//! Producers push either a plain or a zstd-compressed pixel buffer.
//! Compression is detected by probing for the zstd frame magic, not by
//! attempting decompression and catching failure, and expansion is
//! capped just past the three-channel length so an over-inflating
//! payload fails before any oversized buffer exists. After optional
//! decompression the buffer must be exactly one of two lengths for the
//! configured geometry:
//!
//! | length | layout            | normalization              |
//! |--------|-------------------|----------------------------|
//! | W*H    | single channel    | used as-is                 |
//! | W*H*3  | interleaved 3-ch  | first sample of each triple |
//!
//! Anything else is a [`Error::SizeMismatch`] and the frame is dropped.

use std::borrow::Cow;

use tracing::trace;

use crate::error::Error;
use crate::frame::types::{FrameGeometry, GrayFrame};

/// zstd frame magic, little-endian 0xFD2FB528 on the wire.
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    geometry: FrameGeometry,
}

impl FrameDecoder {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Normalize a producer payload into a [`GrayFrame`].
    pub fn decode(&self, payload: &[u8]) -> Result<GrayFrame, Error> {
        let gray_len = self.geometry.gray_len();
        let rgb_len = self.geometry.rgb_len();

        let bytes: Cow<'_, [u8]> = if payload.len() >= ZSTD_MAGIC.len()
            && payload[..ZSTD_MAGIC.len()] == ZSTD_MAGIC
        {
            // One byte of headroom past the three-channel length:
            // a barely-oversized expansion still reports its actual
            // size below, anything larger fails the decompression.
            let raw = zstd::bulk::decompress(payload, rgb_len + 1)
                .map_err(|e| Error::Decompress(e.to_string()))?;
            trace!("decompressed frame: {} -> {} bytes", payload.len(), raw.len());
            Cow::Owned(raw)
        } else {
            Cow::Borrowed(payload)
        };

        let data = if bytes.len() == gray_len {
            bytes.into_owned()
        } else if bytes.len() == rgb_len {
            // The producer duplicates its single channel across all
            // three; keeping the first sample loses nothing.
            bytes.chunks_exact(3).map(|px| px[0]).collect()
        } else {
            return Err(Error::SizeMismatch {
                expected_gray: gray_len,
                expected_rgb: rgb_len,
                actual: bytes.len(),
            });
        };

        Ok(GrayFrame {
            geometry: self.geometry,
            data,
        })
    }
}
