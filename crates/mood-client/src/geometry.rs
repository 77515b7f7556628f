//! Coordinate mapping from detector frame space to the overlay surface.

use serde::{Deserialize, Serialize};

/// Face box in source-frame pixels, as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Face box in overlay-surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl From<PixelBox> for BoundingBox {
    fn from(b: PixelBox) -> Self {
        BoundingBox {
            x: b.x as f64,
            y: b.y as f64,
            width: b.width as f64,
            height: b.height as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Round to the nearest integer, halves toward positive infinity.
fn round_half_up(v: f64) -> i64 {
    // `v + 0.5` can itself round up just below a half
    let floor = v.floor();
    if v - floor >= 0.5 {
        floor as i64 + 1
    } else {
        floor as i64
    }
}

/// Scale each coordinate by its axis factor and round.
pub fn scale_box(b: BoundingBox, scale_x: f64, scale_y: f64) -> PixelBox {
    PixelBox {
        x: round_half_up(b.x * scale_x),
        y: round_half_up(b.y * scale_y),
        width: round_half_up(b.width * scale_x),
        height: round_half_up(b.height * scale_y),
    }
}

/// Map a detector box onto a display surface.
///
/// Returns `None` when the source has a zero dimension; the caller clears the
/// overlay instead of drawing.
pub fn map_to_display(b: BoundingBox, source: Dimensions, display: Dimensions) -> Option<PixelBox> {
    if source.is_empty() {
        return None;
    }
    let scale_x = display.width as f64 / source.width as f64;
    let scale_y = display.height as f64 / source.height as f64;
    Some(scale_box(b, scale_x, scale_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f64, y: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox { x, y, width, height }
    }

    #[test]
    fn test_axes_scale_independently() {
        let out = scale_box(bbox(10.0, 20.0, 30.0, 40.0), 2.0, 0.5);
        assert_eq!(
            out,
            PixelBox { x: 20, y: 10, width: 60, height: 20 }
        );
    }

    #[test]
    fn test_unit_scale_is_idempotent() {
        let once = scale_box(bbox(12.4, 7.6, 99.5, 41.49), 1.0, 1.0);
        assert_eq!(once, PixelBox { x: 12, y: 8, width: 100, height: 41 });
        let twice = scale_box(once.into(), 1.0, 1.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_halves_round_up() {
        let out = scale_box(bbox(2.5, -2.5, 0.5, 1.5), 1.0, 1.0);
        assert_eq!(out, PixelBox { x: 3, y: -2, width: 1, height: 2 });
    }

    #[test]
    fn test_just_below_half_rounds_down() {
        assert_eq!(round_half_up(0.49999999999999994), 0);
        assert_eq!(round_half_up(-0.5000000000000001), -1);
        assert_eq!(round_half_up(-0.5), 0);
    }

    #[test]
    fn test_map_capture_to_smaller_display() {
        // 1280x720 capture rendered at 640x360
        let out = map_to_display(
            bbox(400.0, 200.0, 300.0, 300.0),
            Dimensions::new(1280, 720),
            Dimensions::new(640, 360),
        );
        assert_eq!(out, Some(PixelBox { x: 200, y: 100, width: 150, height: 150 }));
    }

    #[test]
    fn test_map_non_uniform_display() {
        let out = map_to_display(
            bbox(100.0, 100.0, 64.0, 48.0),
            Dimensions::new(640, 480),
            Dimensions::new(80, 24),
        );
        assert_eq!(out, Some(PixelBox { x: 13, y: 5, width: 8, height: 2 }));
    }

    #[test]
    fn test_zero_source_skips_mapping() {
        let b = bbox(1.0, 1.0, 1.0, 1.0);
        assert_eq!(map_to_display(b, Dimensions::new(0, 480), Dimensions::new(80, 24)), None);
        assert_eq!(map_to_display(b, Dimensions::new(640, 0), Dimensions::new(80, 24)), None);
    }
}
