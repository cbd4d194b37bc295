//! Coverage estimator: how much of the cover has been scratched away.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::surface::{CoverLayer, PixelRect};

/// Part of the cover that is sampled when checking for a reveal.
///
/// Shaped cards sample only part of the surface: the circle its centre, the
/// heart designs a fixed window anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    #[default]
    Full,
    Centered { width: u32, height: u32 },
    Rect { x: u32, y: u32, width: u32, height: u32 },
}

impl Region {
    /// Resolve against a `surface_w` x `surface_h` surface, clamping to its bounds.
    /// The result may have zero area.
    pub fn resolve(&self, surface_w: u32, surface_h: u32) -> PixelRect {
        match *self {
            Region::Full => PixelRect { x: 0, y: 0, width: surface_w, height: surface_h },
            Region::Centered { width, height } => {
                let width = width.min(surface_w);
                let height = height.min(surface_h);
                PixelRect {
                    x: (surface_w - width) / 2,
                    y: (surface_h - height) / 2,
                    width,
                    height,
                }
            }
            Region::Rect { x, y, width, height } => {
                let x = x.min(surface_w);
                let y = y.min(surface_h);
                PixelRect {
                    x,
                    y,
                    width: width.min(surface_w - x),
                    height: height.min(surface_h - y),
                }
            }
        }
    }
}

/// Fraction of pixels in an RGBA buffer whose alpha is exactly zero.
/// Partially erased pixels do not count. An empty buffer yields 0.
pub fn estimate(rgba: &[u8]) -> f64 {
    let total = rgba.len() / 4;
    if total == 0 {
        return 0.0;
    }
    let cleared = rgba.chunks_exact(4).filter(|px| px[3] == 0).count();
    cleared as f64 / total as f64
}

/// Sample `region` of `cover` and estimate its cleared fraction.
pub fn estimate_region<C: CoverLayer + ?Sized>(cover: &C, region: Region) -> Result<f64> {
    let (w, h) = cover.size();
    let rect = region.resolve(w, h);
    if rect.area() == 0 {
        return Ok(0.0);
    }
    Ok(estimate(&cover.sample(rect)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Point, RasterCover, Rgba};

    fn opaque(n: usize) -> Vec<u8> {
        [10u8, 20, 30, 255].repeat(n)
    }

    #[test]
    fn test_all_opaque_is_zero() {
        assert_eq!(estimate(&opaque(64)), 0.0);
    }

    #[test]
    fn test_all_transparent_is_one() {
        assert_eq!(estimate(&vec![0u8; 64 * 4]), 1.0);
    }

    #[test]
    fn test_partial_alpha_not_counted() {
        let buf = [0, 0, 0, 1, 0, 0, 0, 0, 9, 9, 9, 254, 0, 0, 0, 0];
        assert_eq!(estimate(&buf), 0.5);
    }

    #[test]
    fn test_empty_buffer_is_zero() {
        assert_eq!(estimate(&[]), 0.0);
    }

    #[test]
    fn test_region_resolve() {
        assert_eq!(
            Region::Centered { width: 120, height: 120 }.resolve(350, 350),
            PixelRect { x: 115, y: 115, width: 120, height: 120 }
        );
        assert_eq!(
            Region::Centered { width: 500, height: 10 }.resolve(200, 300),
            PixelRect { x: 0, y: 145, width: 200, height: 10 }
        );
        assert_eq!(
            Region::Rect { x: 190, y: 0, width: 50, height: 400 }.resolve(200, 300),
            PixelRect { x: 190, y: 0, width: 10, height: 300 }
        );
        assert_eq!(Region::Rect { x: 300, y: 0, width: 5, height: 5 }.resolve(200, 300).area(), 0);
    }

    #[test]
    fn test_zero_area_region_estimates_zero() {
        let cover = RasterCover::new(0, 0, Rgba::rgb(0, 0, 0));
        assert_eq!(estimate_region(&cover, Region::Full).unwrap(), 0.0);
    }

    #[test]
    fn test_centered_region_ignores_edges() {
        let mut cover = RasterCover::new(30, 30, Rgba::rgb(1, 2, 3));
        // Erase a wide band across the top edge only.
        cover.erase_segment(Point::new(0.0, 2.0), Point::new(30.0, 2.0), 4.0);
        let centre = Region::Centered { width: 10, height: 10 };
        assert_eq!(estimate_region(&cover, centre).unwrap(), 0.0);
        assert!(estimate_region(&cover, Region::Full).unwrap() > 0.0);
    }

    #[test]
    fn test_region_json_shape() {
        let r: Region = serde_json::from_str(r#"{"centered":{"width":120,"height":120}}"#).unwrap();
        assert_eq!(r, Region::Centered { width: 120, height: 120 });
        let full: Region = serde_json::from_str(r#""full""#).unwrap();
        assert_eq!(full, Region::Full);
    }
}
