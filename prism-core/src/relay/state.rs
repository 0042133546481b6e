//! Shared pipeline state.
//!
//! The colormap in force and the cached last frame live behind one
//! mutex so every operation sees a consistent pair: a frame is always
//! colorized with the colormap current at the moment it is read, and a
//! recolor after a switch always sees the value just written.

use tokio::sync::Mutex;

use crate::color::{self, Colormap};
use crate::frame::{ColorFrame, FrameCache, GrayFrame};

#[derive(Debug)]
pub struct RelayState {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    colormap: Colormap,
    cache: FrameCache,
}

impl RelayState {
    pub fn new(default_colormap: Colormap) -> Self {
        Self {
            inner: Mutex::new(Inner {
                colormap: default_colormap,
                cache: FrameCache::new(),
            }),
        }
    }

    /// Cache a fresh frame and colorize it with the current colormap.
    ///
    /// The caching happens whether or not anyone is around to watch
    /// the result; a viewer connecting later can still be served.
    pub async fn ingest(&self, frame: GrayFrame) -> ColorFrame {
        let mut inner = self.inner.lock().await;
        let colored = color::colorize(&frame, inner.colormap);
        inner.cache.store(frame);
        colored
    }

    /// Install a new colormap. Returns false when the value is already
    /// in force, in which case nothing needs re-rendering.
    pub async fn switch_colormap(&self, colormap: Colormap) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.colormap == colormap {
            return false;
        }
        inner.colormap = colormap;
        true
    }

    /// Re-render the cached frame with the colormap in force, or
    /// `None` when no frame has arrived yet.
    pub async fn recolor(&self) -> Option<ColorFrame> {
        let inner = self.inner.lock().await;
        inner
            .cache
            .last()
            .map(|frame| color::colorize(frame, inner.colormap))
    }

    pub async fn colormap(&self) -> Colormap {
        self.inner.lock().await.colormap
    }
}
