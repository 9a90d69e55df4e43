//! Raster buffers derived from the base map image.
//!
//! The canvas owns four buffers: the original map raster, a zoom-scaled copy
//! of it, and the two overlay buffers the render loop presents. The overlays
//! are always re-derived from the scaled copy on a rescale, so annotations
//! never survive a zoom change.

use crate::error::{Error, Result};
use crate::geometry::PixelPoint;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::path::Path;

/// Marker highlight color
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Radius of the position disc in pixels
const MARKER_RADIUS: i64 = 2;

/// Overlay buffer a marker is drawn onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Latest pose only; reset from the scaled map before each draw
    Current,
    /// Accumulates every marker since the last reset or rescale
    History,
}

/// The four raster buffers of the monitor
pub struct MapCanvas {
    original: RgbImage,
    scaled: RgbImage,
    current: RgbImage,
    history: RgbImage,
}

impl MapCanvas {
    /// Decode the base map image from disk.
    ///
    /// Fails when the image cannot be decoded or has zero width/height; both
    /// are fatal at startup.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let original = image::open(path)
            .map_err(|e| Error::Map(format!("failed to load {}: {}", path.display(), e)))?
            .into_rgb8();

        if original.width() == 0 || original.height() == 0 {
            return Err(Error::Map(format!(
                "map image {} has zero dimensions",
                path.display()
            )));
        }

        Ok(Self::from_image(original))
    }

    /// Build a canvas around an already-decoded map raster.
    pub fn from_image(original: RgbImage) -> Self {
        let scaled = original.clone();
        let current = scaled.clone();
        let history = scaled.clone();
        Self {
            original,
            scaled,
            current,
            history,
        }
    }

    /// Recompute the scaled map at the given zoom ratio and reset both
    /// overlays to fresh copies of it. All prior annotations, including the
    /// pose history, are discarded.
    pub fn rescale(&mut self, zoom: f64) {
        let width = scaled_dim(self.original.width(), zoom);
        let height = scaled_dim(self.original.height(), zoom);
        self.scaled = imageops::resize(&self.original, width, height, FilterType::Triangle);
        self.current = self.scaled.clone();
        self.history = self.scaled.clone();
    }

    /// Reset the current-pose overlay to a fresh copy of the scaled map.
    pub fn reset_current(&mut self) {
        self.current = self.scaled.clone();
    }

    /// Reset the history overlay to a fresh copy of the scaled map.
    pub fn reset_history(&mut self) {
        self.history = self.scaled.clone();
    }

    /// Draw a pose marker onto the named overlay: a filled disc at `center`
    /// and a line from `center` to the heading `tip`. Pixels outside the
    /// buffer are clipped.
    pub fn draw_marker(&mut self, view: View, center: PixelPoint, tip: PixelPoint) {
        let target = match view {
            View::Current => &mut self.current,
            View::History => &mut self.history,
        };
        fill_disc(target, center, MARKER_RADIUS);
        draw_line(target, center, tip);
    }

    pub fn scaled(&self) -> &RgbImage {
        &self.scaled
    }

    pub fn current(&self) -> &RgbImage {
        &self.current
    }

    pub fn history(&self) -> &RgbImage {
        &self.history
    }
}

/// Pack a buffer into the 0x00RRGGBB format the display surface expects.
pub fn argb_frame(img: &RgbImage) -> Vec<u32> {
    img.pixels()
        .map(|p| (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2]))
        .collect()
}

fn scaled_dim(dim: u32, zoom: f64) -> u32 {
    // Floor at one pixel; a degenerate ratio must not yield an empty buffer
    ((f64::from(dim) * zoom).round() as u32).max(1)
}

fn fill_disc(img: &mut RgbImage, center: PixelPoint, radius: i64) {
    if !(center.x.is_finite() && center.y.is_finite()) {
        return;
    }
    let cx = center.x as i64;
    let cy = center.y as i64;
    // Skip when the disc cannot touch the buffer
    if cx < -radius
        || cy < -radius
        || cx > i64::from(img.width()) + radius
        || cy > i64::from(img.height()) + radius
    {
        return;
    }
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel_clipped(img, cx + dx, cy + dy);
            }
        }
    }
}

/// Clip a segment to the image rectangle (Liang-Barsky). Returns `None` when
/// the segment lies entirely outside or has non-finite coordinates.
fn clip_segment(
    width: u32,
    height: u32,
    from: PixelPoint,
    to: PixelPoint,
) -> Option<(PixelPoint, PixelPoint)> {
    if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
        return None;
    }
    let (x_max, y_max) = (f64::from(width - 1), f64::from(height - 1));
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, from.x),
        (dx, x_max - from.x),
        (-dy, from.y),
        (dy, y_max - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((
        PixelPoint {
            x: from.x + t0 * dx,
            y: from.y + t0 * dy,
        },
        PixelPoint {
            x: from.x + t1 * dx,
            y: from.y + t1 * dy,
        },
    ))
}

/// Bresenham line between the truncated endpoints, clipped to the buffer.
fn draw_line(img: &mut RgbImage, from: PixelPoint, to: PixelPoint) {
    let Some((from, to)) = clip_segment(img.width(), img.height(), from, to) else {
        return;
    };
    let mut x0 = from.x as i64;
    let mut y0 = from.y as i64;
    let x1 = to.x as i64;
    let y1 = to.y as i64;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel_clipped(img, x0, y0);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn put_pixel_clipped(img: &mut RgbImage, x: i64, y: i64) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, MARKER_COLOR);
    }
}
