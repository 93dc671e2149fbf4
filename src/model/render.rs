//! Conversion of float pixel data into 8-bit display buffers.

use super::error::{ModelError, Result};
use super::geometry::PixelRect;
use super::image::{FitsImage, ImageLayout, Plane};
use super::stats;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stretch applied when mapping raw pixel values to 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stretch {
    /// Min/max normalisation.
    #[default]
    Linear,
    /// Midtone-transfer stretch anchored on the sky background.
    Auto,
}

impl Stretch {
    pub fn label(self) -> &'static str {
        match self {
            Stretch::Linear => "Linear",
            Stretch::Auto => "Auto",
        }
    }
}

/// Interleaved 8-bit pixels ready for a texture: 1 channel (gray) or 3 (RGB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub pixels: Vec<u8>,
}

impl DisplayImage {
    pub fn gray(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        DisplayImage { width, height, channels: 1, pixels }
    }

    /// `width * height * 4` bytes, opaque alpha.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * 4);
        match self.channels {
            1 => {
                for &g in &self.pixels {
                    out.extend_from_slice(&[g, g, g, 255]);
                }
            }
            _ => {
                for px in self.pixels.chunks_exact(self.channels) {
                    out.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
        }
        out
    }

    /// Every channel value, for histogramming.
    pub fn samples(&self) -> Vec<f32> {
        self.pixels.iter().map(|&p| p as f32).collect()
    }

    pub fn crop(&self, rect: PixelRect) -> DisplayImage {
        let x1 = (rect.x + rect.width).min(self.width);
        let y1 = (rect.y + rect.height).min(self.height);
        let x0 = rect.x.min(x1);
        let y0 = rect.y.min(y1);
        let c = self.channels;
        let mut pixels = Vec::with_capacity((x1 - x0) * (y1 - y0) * c);
        for y in y0..y1 {
            let row = y * self.width * c;
            pixels.extend_from_slice(&self.pixels[row + x0 * c..row + x1 * c]);
        }
        DisplayImage { width: x1 - x0, height: y1 - y0, channels: c, pixels }
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let rgba = self.to_rgba();
        let buffer = image::RgbaImage::from_raw(self.width as u32, self.height as u32, rgba)
            .ok_or_else(|| ModelError::SizeMismatch("display buffer too small".to_string()))?;
        buffer.save(path)?;
        Ok(())
    }
}

/// Contrast factor for a slider position in 0..=100; 50 is neutral.
pub fn contrast_factor(slider: u8) -> f32 {
    slider.min(100) as f32 / 50.0
}

/// Scale every value away from the buffer minimum by `factor`, clipping to 0..=255.
pub fn apply_contrast(img: &DisplayImage, factor: f32) -> DisplayImage {
    let Some(&min) = img.pixels.iter().min() else {
        return img.clone();
    };
    let min = min as f32;
    let pixels = img
        .pixels
        .iter()
        .map(|&p| (min + (p as f32 - min) * factor).clamp(0.0, 255.0) as u8)
        .collect();
    DisplayImage { pixels, ..img.clone() }
}

pub fn render_image(img: &FitsImage, stretch: Stretch) -> DisplayImage {
    match img.layout() {
        ImageLayout::Rgb => {
            let (r, g, b) = (img.plane_slice(0), img.plane_slice(1), img.plane_slice(2));
            let (r, g, b) = match stretch {
                Stretch::Linear => (linear(r), linear(g), linear(b)),
                // Channels stretch independently; run them side by side.
                Stretch::Auto => std::thread::scope(|s| {
                    let rh = s.spawn(|| auto(r));
                    let gh = s.spawn(|| auto(g));
                    let bv = auto(b);
                    (
                        rh.join().unwrap_or_default(),
                        gh.join().unwrap_or_default(),
                        bv,
                    )
                }),
            };
            let mut pixels = Vec::with_capacity(r.len() * 3);
            for i in 0..r.len() {
                pixels.extend_from_slice(&[r[i], g[i], b[i]]);
            }
            DisplayImage { width: img.width, height: img.height, channels: 3, pixels }
        }
        ImageLayout::Gray | ImageLayout::Multispectral(_) => {
            DisplayImage::gray(img.width, img.height, stretch_values(img.plane_slice(0), stretch))
        }
    }
}

pub fn render_plane(plane: &Plane, stretch: Stretch) -> DisplayImage {
    DisplayImage::gray(plane.width, plane.height, stretch_values(&plane.data, stretch))
}

fn stretch_values(values: &[f32], stretch: Stretch) -> Vec<u8> {
    match stretch {
        Stretch::Linear => linear(values),
        Stretch::Auto => auto(values),
    }
}

fn linear(values: &[f32]) -> Vec<u8> {
    let (min, max) = stats::min_max(values);
    let span = if max > min { max - min } else { 1.0 };
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                (255.0 * (v - min) / span).clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

const LUT_SIZE: usize = 4096;
const TARGET_BACKGROUND: f32 = 0.10;
const SHADOW_CLIP: f64 = 0.0002;
const HIGHLIGHT_CLIP: f64 = 0.9998;

fn auto(values: &[f32]) -> Vec<u8> {
    let (min, max) = stats::min_max(values);
    let lut = mtf_lut(values, min, max);
    let scale = if max > min { (LUT_SIZE - 1) as f32 / (max - min) } else { 0.0 };
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                lut[(((v - min) * scale + 0.5) as usize).min(LUT_SIZE - 1)]
            } else {
                0
            }
        })
        .collect()
}

/// Lookup table over `[min, max]` for the midtone-transfer stretch.
///
/// Values below the shadow percentile go black, above the highlight
/// percentile white; the midtone is chosen so the background median lands at
/// `TARGET_BACKGROUND` of full scale.
fn mtf_lut(values: &[f32], min: f32, max: f32) -> Vec<u8> {
    if max <= min {
        return vec![128; LUT_SIZE];
    }
    let lo = stats::percentile(values, min, max, SHADOW_CLIP);
    let hi = stats::percentile(values, min, max, HIGHLIGHT_CLIP);
    if hi <= lo {
        return vec![128; LUT_SIZE];
    }
    let clip_lo = min + lo * (max - min);
    let clip_hi = min + hi * (max - min);
    let background = (lo + stats::median(values, clip_lo, clip_hi) * (hi - lo)).clamp(1e-6, 1.0 - 1e-6);
    let midtone = midtone_for(background, TARGET_BACKGROUND);

    (0..LUT_SIZE)
        .map(|i| {
            let x = i as f32 / (LUT_SIZE - 1) as f32;
            if x <= lo {
                0
            } else if x >= hi {
                255
            } else {
                (mtf(x, midtone) * 255.0).round().clamp(0.0, 255.0) as u8
            }
        })
        .collect()
}

/// Midtone `m` such that `mtf(x, m) == y`.
fn midtone_for(x: f32, y: f32) -> f32 {
    let denom = 2.0 * x * y - y - x;
    if denom.abs() > 1e-9 {
        (x * (y - 1.0) / denom).clamp(0.0, 1.0)
    } else {
        y
    }
}

/// Midtone transfer function: 0 → 0, m → 0.5, 1 → 1.
fn mtf(x: f32, m: f32) -> f32 {
    if x <= 0.0 || m <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 || m >= 1.0 {
        return 1.0;
    }
    let den = (2.0 * m - 1.0) * x - m;
    if den.abs() < 1e-9 {
        return 0.5;
    }
    ((m - 1.0) * x / den).clamp(0.0, 1.0)
}
