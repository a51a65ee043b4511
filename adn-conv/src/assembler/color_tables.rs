//! 3D LUT (`.cube`) generation
//!
//! The table applies the descriptor's saturation and contrast around a
//! Rec.709 luma pivot. The log variant expects log-encoded footage and
//! linearizes each channel before grading.

use std::fmt::Write as _;

use crate::models::Aesthetics;

pub const DEFAULT_LUT_SIZE: usize = 17;
pub const MIN_LUT_SIZE: usize = 2;
pub const MAX_LUT_SIZE: usize = 65;

const LUMA_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeProfile {
    /// Display-referred input
    Standard,
    /// Log-encoded camera input
    Log,
}

impl CubeProfile {
    fn decode(self, value: f64) -> f64 {
        match self {
            CubeProfile::Standard => value,
            // Inverse of y = log2(1 + 15x) / 4
            CubeProfile::Log => ((value * 4.0).exp2() - 1.0) / 15.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            CubeProfile::Standard => "Rec.709",
            CubeProfile::Log => "Log",
        }
    }
}

/// Render a `size`³ LUT as `.cube` text
pub fn render_cube(title: &str, aesthetics: &Aesthetics, size: usize, profile: CubeProfile) -> String {
    let size = size.clamp(MIN_LUT_SIZE, MAX_LUT_SIZE);
    let saturation = 0.5 + f64::from(aesthetics.saturation) / 100.0;
    let contrast = 0.5 + f64::from(aesthetics.contrast) / 100.0;
    let step = 1.0 / (size - 1) as f64;

    let mut out = String::with_capacity(size * size * size * 28 + 256);
    let _ = writeln!(out, "TITLE \"{}\"", title);
    let _ = writeln!(
        out,
        "# {} input, saturation {}, contrast {}",
        profile.label(),
        aesthetics.saturation,
        aesthetics.contrast
    );
    let _ = writeln!(out, "LUT_3D_SIZE {}", size);
    let _ = writeln!(out, "DOMAIN_MIN 0.0 0.0 0.0");
    let _ = writeln!(out, "DOMAIN_MAX 1.0 1.0 1.0");

    // Red varies fastest
    for b in 0..size {
        for g in 0..size {
            for r in 0..size {
                let rgb = [r, g, b].map(|i| profile.decode(i as f64 * step).clamp(0.0, 1.0));
                let [r_out, g_out, b_out] = grade(rgb, saturation, contrast);
                let _ = writeln!(out, "{:.6} {:.6} {:.6}", r_out, g_out, b_out);
            }
        }
    }

    out
}

fn grade(rgb: [f64; 3], saturation: f64, contrast: f64) -> [f64; 3] {
    let luma: f64 = rgb.iter().zip(LUMA_WEIGHTS).map(|(c, w)| c * w).sum();
    rgb.map(|c| {
        let saturated = luma + (c - luma) * saturation;
        ((saturated - 0.5) * contrast + 0.5).clamp(0.0, 1.0)
    })
}
