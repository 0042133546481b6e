//! Arithmetic colormap ramps.
//!
//! Each ramp maps one intensity byte to an RGB triple. Arithmetic runs
//! in i32 or f32 and is clamped into range before narrowing back to
//! u8; out-of-range intermediates clamp, they never wrap.

pub(crate) fn grayscale(v: u8) -> [u8; 3] {
    [v, v, v]
}

/// Green bell curve: zero at both ends, peak near mid-intensity.
pub(crate) fn neon_green(v: u8) -> [u8; 3] {
    let normalized = v as f32 / 255.0;
    let g = (normalized * std::f32::consts::PI).sin().powi(2) * 255.0;
    [0, g as u8, 0]
}

/// Dark-to-bright heat ramp. Red leads from intensity 50, green
/// follows from 100, blue stays a dim tail capped at 128.
pub(crate) fn inferno(v: u8) -> [u8; 3] {
    let v = v as i32;
    let r = ((v - 50) * 2).clamp(0, 255);
    let g = ((v - 100) * 2).clamp(0, 255);
    let b = (v - 128).clamp(0, 128);
    [r as u8, g as u8, b as u8]
}

/// Blue-dominant ramp; red and green only join near the top end.
pub(crate) fn blues(v: u8) -> [u8; 3] {
    let v = v as i32;
    let r = ((v - 200) * 5).clamp(0, 255);
    let g = ((v - 150) * 2).clamp(0, 255);
    let b = (v * 3 / 2).min(255);
    [r as u8, g as u8, b as u8]
}
