//! Lightbox grid arithmetic.
//!
//! A slice view can be split into `rows x columns` panes. Panes are numbered
//! row-major starting at the top-left pane; pixel coordinates have their
//! origin at the bottom-left corner of the whole view. Pane `k` shows the
//! slice at offset `k * slice_spacing` along the view normal.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::GeomError;
use crate::viewport::Viewport;

/// Grid layout of a slice view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightboxLayout {
    pub rows: u32,
    pub columns: u32,
}

/// Result of locating a pixel inside a lightbox grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneHit {
    /// Row-major pane index
    pub index: usize,
    /// Position relative to the pane's bottom-left corner
    pub local: DVec2,
}

impl Default for LightboxLayout {
    fn default() -> Self {
        Self::single()
    }
}

impl LightboxLayout {
    /// Create a layout; zero rows or columns are clamped to one.
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows: rows.max(1),
            columns: columns.max(1),
        }
    }

    /// The ordinary single-pane layout.
    pub fn single() -> Self {
        Self { rows: 1, columns: 1 }
    }

    pub fn pane_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Whether more than one pane is shown.
    pub fn is_lightbox(&self) -> bool {
        self.pane_count() > 1
    }

    /// Pixel size of a single pane.
    pub fn pane_size(&self, view: Viewport) -> Viewport {
        Viewport::new(
            view.width / self.columns as f64,
            view.height / self.rows as f64,
        )
    }

    /// Locate the pane under a view pixel.
    ///
    /// Returns `None` for pixels outside the view.
    pub fn pane_at(&self, x: f64, y: f64, view: Viewport) -> Option<PaneHit> {
        if !view.is_valid() || x < 0.0 || y < 0.0 || x >= view.width || y >= view.height {
            return None;
        }
        let pane = self.pane_size(view);
        let column = ((x / pane.width).floor() as u32).min(self.columns - 1);
        let row_from_bottom = ((y / pane.height).floor() as u32).min(self.rows - 1);
        let row_from_top = self.rows - 1 - row_from_bottom;

        Some(PaneHit {
            index: (row_from_top * self.columns + column) as usize,
            local: DVec2::new(
                x - column as f64 * pane.width,
                y - row_from_bottom as f64 * pane.height,
            ),
        })
    }

    /// Bottom-left pixel of a pane in view coordinates.
    pub fn pane_origin(&self, index: usize, view: Viewport) -> Result<DVec2, GeomError> {
        if index >= self.pane_count() {
            return Err(GeomError::PaneOutOfRange {
                index,
                rows: self.rows,
                columns: self.columns,
            });
        }
        let pane = self.pane_size(view);
        let columns = self.columns as usize;
        let row_from_top = index / columns;
        let column = index % columns;
        let row_from_bottom = self.rows as usize - 1 - row_from_top;
        Ok(DVec2::new(
            column as f64 * pane.width,
            row_from_bottom as f64 * pane.height,
        ))
    }

    /// Pane showing the slice at signed distance `offset` from pane 0.
    ///
    /// Offsets are rounded to the nearest pane. Returns `None` when the nearest
    /// pane is not part of the grid.
    pub fn pane_for_offset(&self, offset: f64, spacing: f64) -> Option<usize> {
        if spacing <= 0.0 || !offset.is_finite() {
            return (self.pane_count() == 1).then_some(0);
        }
        let index = (offset / spacing + 0.5).floor();
        if index < 0.0 || index >= self.pane_count() as f64 {
            None
        } else {
            Some(index as usize)
        }
    }

    /// Open interval of plane distances that are shown by some pane.
    ///
    /// The window starts `margin` below pane 0 and ends `margin` beyond the
    /// last pane, so it widens by one slice spacing per additional pane.
    pub fn distance_window(&self, margin: f64, spacing: f64) -> (f64, f64) {
        let extra = (self.pane_count() - 1) as f64 * spacing.max(0.0);
        (-margin, margin + extra)
    }
}
