//! Anti-aliasing-tolerant pixel comparison
//!
//! Two PNG payloads are compared per pixel against a color-distance
//! threshold on a 0-1 scale. A differing pixel whose counterpart matches
//! a neighboring pixel in the other image is treated as a shifted
//! anti-aliased edge and not counted: font rasterization jitter between
//! captures would otherwise drown real changes.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// Outcome of comparing one baseline/current screenshot pair.
#[derive(Debug)]
pub enum PixelDiffOutcome {
    /// Image dimensions differ; no pixel analysis was performed
    DimensionChange {
        baseline: (u32, u32),
        current: (u32, u32),
    },
    /// Same dimensions, compared pixel by pixel
    Compared {
        diff_pixels: u64,
        total_pixels: u64,
        /// Highlight image, only rendered when differences were found
        diff_image_png: Option<Vec<u8>>,
    },
}

impl PixelDiffOutcome {
    /// Diff percentage (0-100); dimension changes are forced to 100.
    #[must_use]
    pub fn diff_percentage(&self) -> f64 {
        match self {
            Self::DimensionChange { .. } => 100.0,
            Self::Compared {
                diff_pixels,
                total_pixels,
                ..
            } => {
                if *total_pixels == 0 {
                    0.0
                } else {
                    *diff_pixels as f64 / *total_pixels as f64 * 100.0
                }
            }
        }
    }
}

/// Compare two PNG payloads.
///
/// # Errors
///
/// Returns an error if either payload fails to decode; callers treat
/// that as a forced maximal diff rather than propagating.
pub fn compare_images(
    baseline_png: &[u8],
    current_png: &[u8],
    color_threshold: f64,
) -> Result<PixelDiffOutcome> {
    let baseline = image::load_from_memory(baseline_png)
        .context("failed to decode baseline image")?
        .into_rgba8();
    let current = image::load_from_memory(current_png)
        .context("failed to decode current image")?
        .into_rgba8();

    if baseline.dimensions() != current.dimensions() {
        return Ok(PixelDiffOutcome::DimensionChange {
            baseline: baseline.dimensions(),
            current: current.dimensions(),
        });
    }

    let (width, height) = baseline.dimensions();
    let total_pixels = u64::from(width) * u64::from(height);
    let mut diff_pixels = 0u64;
    let mut diff_image = RgbaImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let b = baseline.get_pixel(x, y);
            let c = current.get_pixel(x, y);

            if color_distance(b, c) <= color_threshold
                || is_antialiased(&baseline, &current, x, y, color_threshold)
            {
                diff_image.put_pixel(x, y, dimmed(b));
            } else {
                diff_pixels += 1;
                diff_image.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
    }

    let diff_image_png = if diff_pixels > 0 {
        let mut buffer = Cursor::new(Vec::new());
        diff_image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .context("failed to encode diff image")?;
        Some(buffer.into_inner())
    } else {
        None
    };

    Ok(PixelDiffOutcome::Compared {
        diff_pixels,
        total_pixels,
        diff_image_png,
    })
}

/// Normalized Euclidean RGB distance on a 0-1 scale, alpha-aware.
fn color_distance(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    let dr = (f64::from(a[0]) - f64::from(b[0])) / 255.0;
    let dg = (f64::from(a[1]) - f64::from(b[1])) / 255.0;
    let db = (f64::from(a[2]) - f64::from(b[2])) / 255.0;
    let da = (f64::from(a[3]) - f64::from(b[3])) / 255.0;
    ((dr * dr + dg * dg + db * db + da * da) / 4.0).sqrt()
}

/// Whether a differing pixel looks like a shifted anti-aliased edge.
///
/// True when the current pixel matches any 8-neighbor of the baseline
/// pixel, or the baseline pixel matches any 8-neighbor of the current
/// pixel.
fn is_antialiased(
    baseline: &RgbaImage,
    current: &RgbaImage,
    x: u32,
    y: u32,
    threshold: f64,
) -> bool {
    let (width, height) = baseline.dimensions();
    let b = baseline.get_pixel(x, y);
    let c = current.get_pixel(x, y);

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = i64::from(x) + dx;
            let ny = i64::from(y) + dy;
            if nx < 0 || ny < 0 || nx >= i64::from(width) || ny >= i64::from(height) {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if color_distance(c, baseline.get_pixel(nx, ny)) <= threshold
                || color_distance(b, current.get_pixel(nx, ny)) <= threshold
            {
                return true;
            }
        }
    }
    false
}

/// Faded rendering of an unchanged pixel for the diff image background.
fn dimmed(pixel: &Rgba<u8>) -> Rgba<u8> {
    let gray = (u16::from(pixel[0]) + u16::from(pixel[1]) + u16::from(pixel[2])) / 3;
    let faded = 128 + (gray / 2) as u8;
    Rgba([faded, faded, faded, 255])
}
