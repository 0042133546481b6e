//! Last-frame cache.
//!
//! Holds the most recent decoded frame so a colormap switch can be
//! applied retroactively without waiting for new producer traffic.
//! Single slot, last write wins. Survives producer and viewer
//! reconnects; only relay restart empties it.

use crate::frame::types::GrayFrame;

#[derive(Debug, Default)]
pub struct FrameCache {
    last: Option<GrayFrame>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, frame: GrayFrame) {
        self.last = Some(frame);
    }

    pub fn last(&self) -> Option<&GrayFrame> {
        self.last.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }
}
