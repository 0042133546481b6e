//! Frame decoding, normalization, and caching.

mod cache;
mod decoder;
mod types;

pub use cache::FrameCache;
pub use decoder::{FrameDecoder, ZSTD_MAGIC};
pub use types::{ColorFrame, FrameGeometry, GrayFrame};
