//! Lookup tables for the named scientific presets.
//!
//! Each preset is stored as a short run of anchor colors sampled from
//! the standard colormap definitions and expanded to 256 entries by
//! linear interpolation. The anchors are approximations; presets here
//! trade exactness for a small, auditable table.

/// Sparse anchor colors, evenly spaced across the 0..=255 range.
pub(crate) struct AnchorTable(&'static [[u8; 3]]);

impl AnchorTable {
    /// Expand the anchors into a dense 256-entry table.
    pub(crate) fn expand(&self) -> [[u8; 3]; 256] {
        let anchors = self.0;
        let span = (anchors.len() - 1) as f32;
        let mut table = [[0u8; 3]; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let t = i as f32 / 255.0 * span;
            let lo = t.floor() as usize;
            let hi = (lo + 1).min(anchors.len() - 1);
            let frac = t - lo as f32;
            for channel in 0..3 {
                let a = anchors[lo][channel] as f32;
                let b = anchors[hi][channel] as f32;
                entry[channel] = (a + (b - a) * frac).round() as u8;
            }
        }
        table
    }
}

pub(crate) const MAGMA: AnchorTable = AnchorTable(&[
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
]);

pub(crate) const PLASMA: AnchorTable = AnchorTable(&[
    [13, 8, 135],
    [84, 2, 163],
    [139, 10, 165],
    [185, 50, 137],
    [219, 92, 104],
    [244, 136, 73],
    [254, 188, 43],
    [240, 249, 33],
]);

pub(crate) const VIRIDIS: AnchorTable = AnchorTable(&[
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [109, 205, 89],
    [180, 222, 44],
    [253, 231, 37],
]);

pub(crate) const HOT: AnchorTable = AnchorTable(&[
    [0, 0, 0],
    [255, 0, 0],
    [255, 255, 0],
    [255, 255, 255],
]);

pub(crate) const COOL: AnchorTable = AnchorTable(&[
    [0, 255, 255],
    [255, 0, 255],
]);

pub(crate) const JET: AnchorTable = AnchorTable(&[
    [0, 0, 128],
    [0, 0, 255],
    [0, 255, 255],
    [255, 255, 0],
    [255, 0, 0],
    [128, 0, 0],
]);

pub(crate) const TURBO: AnchorTable = AnchorTable(&[
    [48, 18, 59],
    [70, 107, 227],
    [40, 187, 235],
    [34, 245, 151],
    [164, 252, 59],
    [253, 198, 39],
    [239, 98, 21],
    [122, 4, 3],
]);
