//! Cover surface abstraction.
//!
//! `CoverLayer` is everything the reveal logic needs from the scratchable layer:
//! erase a brush segment, read back RGBA pixels, and the two fade operations.
//! The browser implementation lives in `web::canvas`; `RasterCover` is an
//! in-memory RGBA raster with the same compositing rules, used natively.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// --- Geometry ----------------------------------------------------------------

/// Surface-local coordinate in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate viewport coordinates into surface space given the surface's
    /// on-screen top-left corner.
    pub fn from_client(client_x: f64, client_y: f64, left: f64, top: f64) -> Self {
        Self { x: client_x - left, y: client_y - top }
    }
}

/// Integer pixel rectangle, already clamped to a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Straight (non-premultiplied) colour with fractional alpha.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    /// Parse `#rgb` / `#rrggbb`; anything else yields `None`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok();
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => Some(Self::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            _ => None,
        }
    }

    /// CSS `rgba(...)` form used for canvas fill styles.
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

// --- Cover layer -------------------------------------------------------------

/// Scratchable cover owned by exactly one card.
pub trait CoverLayer {
    /// Surface size in CSS pixels.
    fn size(&self) -> (u32, u32);

    /// Erase a round-capped segment of `width` pixels from `from` to `to`.
    fn erase_segment(&mut self, from: Point, to: Point, width: f64);

    /// RGBA bytes (row-major, 4 per pixel) of `rect`, given in CSS pixels.
    fn sample(&self, rect: PixelRect) -> Result<Vec<u8>>;

    /// Clear and repaint the cover paint at `opacity` (fade style `repaint`).
    fn repaint(&mut self, opacity: f64);

    /// Destination-out fill of the whole surface with `strength` alpha
    /// (fade style `erase`).
    fn erase_all(&mut self, strength: f64);

    /// Make every pixel fully transparent.
    fn clear(&mut self);
}

// --- In-memory raster ----------------------------------------------------------

/// Plain RGBA8 raster implementing canvas-like compositing.
#[derive(Clone, Debug)]
pub struct RasterCover {
    width: u32,
    height: u32,
    paint: Rgba,
    pixels: Vec<u8>, // width * height * 4, straight alpha
}

impl RasterCover {
    /// Fully opaque cover filled with `paint`.
    pub fn new(width: u32, height: u32, paint: Rgba) -> Self {
        let mut cover = Self { width, height, paint, pixels: Vec::new() };
        cover.pixels = vec![0; width as usize * height as usize * 4];
        cover.repaint(1.0);
        cover
    }

    /// Wrap an existing RGBA buffer. Extra bytes are dropped, missing ones
    /// are treated as transparent.
    pub fn from_rgba(width: u32, height: u32, mut pixels: Vec<u8>) -> Self {
        pixels.resize(width as usize * height as usize * 4, 0);
        Self { width, height, paint: Rgba::rgb(0, 0, 0), pixels }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y) + 3])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// Distance from `p` to segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

impl CoverLayer for RasterCover {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn erase_segment(&mut self, from: Point, to: Point, width: f64) {
        let radius = (width / 2.0).max(0.0);
        // Bounding box of the capsule, clamped to the raster.
        let min_x = (from.x.min(to.x) - radius).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius).ceil().min(self.width as f64);
        let max_y = (from.y.max(to.y) + radius).ceil().min(self.height as f64);
        if min_x >= max_x || min_y >= max_y {
            return;
        }
        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if segment_distance(centre, from, to) <= radius {
                    let idx = self.index(x, y);
                    self.pixels[idx..idx + 4].fill(0);
                }
            }
        }
    }

    fn sample(&self, rect: PixelRect) -> Result<Vec<u8>> {
        let x0 = rect.x.min(self.width);
        let y0 = rect.y.min(self.height);
        let x1 = (rect.x + rect.width).min(self.width);
        let y1 = (rect.y + rect.height).min(self.height);
        let mut out = Vec::with_capacity((x1 - x0) as usize * (y1 - y0) as usize * 4);
        for y in y0..y1 {
            let start = self.index(x0, y);
            let end = self.index(x1, y);
            out.extend_from_slice(&self.pixels[start..end]);
        }
        Ok(out)
    }

    fn repaint(&mut self, opacity: f64) {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let Rgba { r, g, b, .. } = self.paint;
        for px in self.pixels.chunks_exact_mut(4) {
            if alpha == 0 {
                px.fill(0);
            } else {
                px.copy_from_slice(&[r, g, b, alpha]);
            }
        }
    }

    fn erase_all(&mut self, strength: f64) {
        let keep = 1.0 - strength.clamp(0.0, 1.0);
        for px in self.pixels.chunks_exact_mut(4) {
            let a = (px[3] as f64 * keep).round() as u8;
            if a == 0 {
                px.fill(0);
            } else {
                px[3] = a;
            }
        }
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREY: Rgba = Rgba::rgb(0x9c, 0xa3, 0xaf);

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgba::from_hex("#9CA3AF"), Some(GREY));
        assert_eq!(Rgba::from_hex("#fff"), Some(Rgba::rgb(255, 255, 255)));
        assert_eq!(Rgba::from_hex("9ca3af"), None);
        assert_eq!(Rgba::from_hex("#12345"), None);
    }

    #[test]
    fn test_new_cover_is_opaque() {
        let cover = RasterCover::new(4, 3, GREY);
        assert!(cover.pixels().chunks_exact(4).all(|px| px == [0x9c, 0xa3, 0xaf, 255]));
    }

    #[test]
    fn test_erase_segment_clears_along_line_only() {
        let mut cover = RasterCover::new(50, 50, GREY);
        cover.erase_segment(Point::new(10.0, 25.0), Point::new(40.0, 25.0), 10.0);
        assert_eq!(cover.alpha_at(25, 25), Some(0));
        assert_eq!(cover.alpha_at(10, 25), Some(0));
        // Round cap extends past the endpoint by the radius.
        assert_eq!(cover.alpha_at(6, 25), Some(0));
        assert_eq!(cover.alpha_at(25, 5), Some(255));
        assert_eq!(cover.alpha_at(48, 25), Some(255));
    }

    #[test]
    fn test_erase_segment_outside_surface_is_ignored() {
        let mut cover = RasterCover::new(10, 10, GREY);
        cover.erase_segment(Point::new(-50.0, -50.0), Point::new(-40.0, -40.0), 4.0);
        assert!(cover.pixels().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_sample_extracts_rows() {
        let mut cover = RasterCover::new(4, 4, GREY);
        cover.erase_segment(Point::new(1.5, 1.5), Point::new(1.5, 1.5), 1.0);
        let px = cover.sample(PixelRect { x: 1, y: 1, width: 2, height: 2 }).unwrap();
        assert_eq!(px.len(), 16);
        assert_eq!(px[3], 0);
        assert_eq!(px[7], 255);
    }

    #[test]
    fn test_erase_all_and_repaint() {
        let mut cover = RasterCover::new(2, 2, GREY);
        cover.erase_all(0.5);
        assert_eq!(cover.alpha_at(0, 0), Some(128));
        cover.repaint(0.2);
        assert_eq!(cover.alpha_at(1, 1), Some(51));
        cover.clear();
        assert!(cover.pixels().iter().all(|b| *b == 0));
    }
}
