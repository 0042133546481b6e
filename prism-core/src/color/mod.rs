//! False-color transforms.
//!
//! A [`Colormap`] is a pure function from one intensity byte to an RGB
//! triple. The closed enum keeps dispatch exhaustive: adding a variant
//! without wiring it into [`Colormap::table`] is a compile error.
//!
//! Viewers select colormaps by name. UI-facing aliases and the raw
//! preset names both resolve; anything unrecognized falls back to
//! `inferno` rather than erroring, so a stale UI can never wedge the
//! stream.

mod lut;
mod ramp;

use std::fmt;

use crate::frame::{ColorFrame, GrayFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Colormap {
    Grayscale,
    NeonGreen,
    #[default]
    Inferno,
    Blues,
    Magma,
    Plasma,
    Viridis,
    Hot,
    Cool,
    Jet,
    Turbo,
}

impl Colormap {
    /// Resolve a viewer-supplied name. Unknown names map to `Inferno`.
    pub fn resolve(name: &str) -> Self {
        match name {
            "grayscale" | "gray" => Colormap::Grayscale,
            "neon_green" => Colormap::NeonGreen,
            "sunset" | "inferno" => Colormap::Inferno,
            "classic" | "blues" => Colormap::Blues,
            "magma" => Colormap::Magma,
            "plasma" => Colormap::Plasma,
            "viridis" => Colormap::Viridis,
            "hot" => Colormap::Hot,
            "cool" => Colormap::Cool,
            "jet" => Colormap::Jet,
            "turbo" => Colormap::Turbo,
            _ => Colormap::Inferno,
        }
    }

    /// Canonical name, the reverse of [`Colormap::resolve`].
    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Grayscale => "grayscale",
            Colormap::NeonGreen => "neon_green",
            Colormap::Inferno => "inferno",
            Colormap::Blues => "blues",
            Colormap::Magma => "magma",
            Colormap::Plasma => "plasma",
            Colormap::Viridis => "viridis",
            Colormap::Hot => "hot",
            Colormap::Cool => "cool",
            Colormap::Jet => "jet",
            Colormap::Turbo => "turbo",
        }
    }

    /// Dense intensity-to-RGB table for this colormap.
    pub fn table(self) -> [[u8; 3]; 256] {
        match self {
            Colormap::Grayscale => ramp_table(ramp::grayscale),
            Colormap::NeonGreen => ramp_table(ramp::neon_green),
            Colormap::Inferno => ramp_table(ramp::inferno),
            Colormap::Blues => ramp_table(ramp::blues),
            Colormap::Magma => lut::MAGMA.expand(),
            Colormap::Plasma => lut::PLASMA.expand(),
            Colormap::Viridis => lut::VIRIDIS.expand(),
            Colormap::Hot => lut::HOT.expand(),
            Colormap::Cool => lut::COOL.expand(),
            Colormap::Jet => lut::JET.expand(),
            Colormap::Turbo => lut::TURBO.expand(),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn ramp_table(ramp: fn(u8) -> [u8; 3]) -> [[u8; 3]; 256] {
    let mut table = [[0u8; 3]; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = ramp(i as u8);
    }
    table
}

/// Apply a colormap to a grayscale frame.
///
/// Pure and deterministic: the same frame and colormap always produce
/// the same bytes.
pub fn colorize(frame: &GrayFrame, colormap: Colormap) -> ColorFrame {
    let table = colormap.table();
    let mut data = Vec::with_capacity(frame.data.len() * 3);
    for &v in &frame.data {
        data.extend_from_slice(&table[v as usize]);
    }
    ColorFrame {
        geometry: frame.geometry,
        data,
    }
}
