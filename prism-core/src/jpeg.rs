//! JPEG encoding of colorized frames.

use crate::error::Error;
use crate::frame::ColorFrame;

/// Encodes [`ColorFrame`]s for the viewer at a fixed quality.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    pub const DEFAULT_QUALITY: u8 = 85;

    /// Quality is clamped into 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn encode(&self, frame: &ColorFrame) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.quality);
        encoder
            .encode(
                &frame.data,
                frame.geometry.width,
                frame.geometry.height,
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| Error::JpegEncode(e.to_string()))?;
        Ok(out)
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUALITY)
    }
}
