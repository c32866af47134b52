//! Pixel extents of a view or pane.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Size of a rendering surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height (1.0 for an empty viewport).
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Whether both extents are positive.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Convert a pixel position to normalized `0..1` coordinates.
    pub fn normalize(&self, x: f64, y: f64) -> DVec2 {
        if !self.is_valid() {
            return DVec2::splat(-1.0);
        }
        DVec2::new(x / self.width, y / self.height)
    }

    /// True if a normalized position lies strictly inside the unit square.
    pub fn strictly_inside(normalized: DVec2) -> bool {
        normalized.x > 0.0 && normalized.x < 1.0 && normalized.y > 0.0 && normalized.y < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let vp = Viewport::new(200.0, 100.0);
        assert_eq!(vp.normalize(100.0, 25.0), DVec2::new(0.5, 0.25));
    }

    #[test]
    fn test_edges_are_outside() {
        assert!(!Viewport::strictly_inside(DVec2::new(0.0, 0.5)));
        assert!(!Viewport::strictly_inside(DVec2::new(0.5, 1.0)));
        assert!(Viewport::strictly_inside(DVec2::new(0.01, 0.99)));
    }

    #[test]
    fn test_empty_viewport_normalizes_outside() {
        let vp = Viewport::new(0.0, 0.0);
        assert!(!Viewport::strictly_inside(vp.normalize(1.0, 1.0)));
    }
}
