//! Frame data structures shared across the pipeline.

use std::fmt;

/// Width and height of the frames a producer is expected to push.
///
/// The relay is configured with one geometry up front; frame payloads
/// are validated against it, never trusted to describe themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Byte length of a single-channel frame.
    pub const fn gray_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of an interleaved three-channel frame.
    pub const fn rgb_len(&self) -> usize {
        self.gray_len() * 3
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(960, 720)
    }
}

impl fmt::Display for FrameGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A normalized single-channel frame, one intensity byte per pixel in
/// row-major order. Always exactly `geometry.gray_len()` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    pub geometry: FrameGeometry,
    pub data: Vec<u8>,
}

impl GrayFrame {
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Intensity at (x, y). Caller guarantees bounds.
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.geometry.width + x) as usize]
    }
}

/// A colorized frame, three interleaved RGB bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFrame {
    pub geometry: FrameGeometry,
    pub data: Vec<u8>,
}

impl ColorFrame {
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// RGB triple at (x, y) as a three-byte slice.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let offset = ((y * self.geometry.width + x) * 3) as usize;
        &self.data[offset..offset + 3]
    }
}
