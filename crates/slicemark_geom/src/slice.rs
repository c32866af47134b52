//! Slice (2D) view geometry.

use glam::{DMat4, DVec2, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::error::GeomError;
use crate::lightbox::LightboxLayout;
use crate::plane::Plane;
use crate::viewport::Viewport;

/// Geometry of a 2D cross-section view.
///
/// `origin` is the world position shown at the centre of pane 0. Display
/// coordinates are pane-local pixels in x/y and signed world distance from the
/// pane 0 plane in z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceView {
    origin: DVec3,
    x_axis: DVec3,
    y_axis: DVec3,
    normal: DVec3,
    mm_per_pixel: f64,
    viewport: Viewport,
    layout: LightboxLayout,
    slice_spacing: f64,
}

impl SliceView {
    /// Build a slice view from its in-plane axes.
    ///
    /// The axes are orthonormalized; `y_axis` only needs to be non-parallel
    /// to `x_axis`.
    pub fn new(
        origin: DVec3,
        x_axis: DVec3,
        y_axis: DVec3,
        mm_per_pixel: f64,
        viewport: Viewport,
    ) -> Result<Self, GeomError> {
        if mm_per_pixel <= 0.0 || !mm_per_pixel.is_finite() {
            return Err(GeomError::degenerate(format!(
                "invalid pixel spacing {mm_per_pixel}"
            )));
        }
        if !viewport.is_valid() {
            return Err(GeomError::degenerate("viewport has no area"));
        }
        let x_axis = x_axis
            .try_normalize()
            .ok_or_else(|| GeomError::degenerate("slice x axis has zero length"))?;
        let normal = x_axis
            .cross(y_axis)
            .try_normalize()
            .ok_or_else(|| GeomError::degenerate("slice axes are parallel"))?;
        let y_axis = normal.cross(x_axis);

        Ok(Self {
            origin,
            x_axis,
            y_axis,
            normal,
            mm_per_pixel,
            viewport,
            layout: LightboxLayout::single(),
            slice_spacing: 1.0,
        })
    }

    /// Axial view (normal +Z) centred on `center`.
    pub fn axial(center: DVec3, mm_per_pixel: f64, viewport: Viewport) -> Result<Self, GeomError> {
        Self::new(center, DVec3::X, DVec3::Y, mm_per_pixel, viewport)
    }

    /// Sagittal view (normal +X) centred on `center`.
    pub fn sagittal(center: DVec3, mm_per_pixel: f64, viewport: Viewport) -> Result<Self, GeomError> {
        Self::new(center, DVec3::Y, DVec3::Z, mm_per_pixel, viewport)
    }

    /// Coronal view (normal -Y) centred on `center`.
    pub fn coronal(center: DVec3, mm_per_pixel: f64, viewport: Viewport) -> Result<Self, GeomError> {
        Self::new(center, DVec3::X, DVec3::Z, mm_per_pixel, viewport)
    }

    pub fn with_layout(mut self, layout: LightboxLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_slice_spacing(mut self, spacing: f64) -> Self {
        self.set_slice_spacing(spacing);
        self
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    pub fn layout(&self) -> LightboxLayout {
        self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn slice_spacing(&self) -> f64 {
        self.slice_spacing
    }

    pub fn mm_per_pixel(&self) -> f64 {
        self.mm_per_pixel
    }

    pub fn set_layout(&mut self, layout: LightboxLayout) {
        self.layout = layout;
    }

    /// Set the distance between lightbox panes; non-positive values are ignored.
    pub fn set_slice_spacing(&mut self, spacing: f64) {
        if spacing > 0.0 && spacing.is_finite() {
            self.slice_spacing = spacing;
        } else {
            log::warn!("Ignoring invalid slice spacing {}", spacing);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_valid() {
            self.viewport = viewport;
        }
    }

    /// Move the cutting plane along its normal.
    pub fn translate_along_normal(&mut self, distance: f64) {
        self.origin += self.normal * distance;
    }

    pub fn set_origin(&mut self, origin: DVec3) {
        self.origin = origin;
    }

    /// Pixel size of one pane.
    pub fn pane_viewport(&self) -> Viewport {
        self.layout.pane_size(self.viewport)
    }

    /// Display-to-world matrix for pane-local pixels.
    pub fn xy_to_world(&self) -> DMat4 {
        let pane = self.pane_viewport();
        let x = self.x_axis * self.mm_per_pixel;
        let y = self.y_axis * self.mm_per_pixel;
        let corner = self.origin - x * (pane.width / 2.0) - y * (pane.height / 2.0);
        DMat4::from_cols(
            x.extend(0.0),
            y.extend(0.0),
            self.normal.extend(0.0),
            DVec4::new(corner.x, corner.y, corner.z, 1.0),
        )
    }

    /// Cutting plane of pane 0.
    pub fn plane(&self) -> Plane {
        Plane::from_unit(self.origin, self.normal)
    }

    /// Cutting plane shown by a lightbox pane.
    pub fn pane_plane(&self, pane: usize) -> Plane {
        self.plane().offset(pane as f64 * self.slice_spacing)
    }

    pub fn world_to_display(&self, world: DVec3) -> DVec3 {
        self.xy_to_world().inverse().transform_point3(world)
    }

    pub fn display_to_world(&self, display: DVec3) -> DVec3 {
        self.xy_to_world().transform_point3(display)
    }

    /// Normalized position of a display point inside its pane.
    pub fn display_to_viewport(&self, display: DVec3) -> DVec2 {
        self.pane_viewport().normalize(display.x, display.y)
    }

    /// Open interval of display z values that some pane shows.
    pub fn distance_window(&self, margin: f64) -> (f64, f64) {
        self.layout.distance_window(margin, self.slice_spacing)
    }

    /// Pane whose slice is nearest to a display point.
    pub fn pane_for_display(&self, display: DVec3) -> Option<usize> {
        self.layout.pane_for_offset(display.z, self.slice_spacing)
    }

    /// Whether a display point is close enough to a shown slice and inside the pane.
    pub fn is_display_point_shown(&self, display: DVec3, margin: f64) -> bool {
        let (low, high) = self.distance_window(margin);
        display.z > low
            && display.z < high
            && Viewport::strictly_inside(self.display_to_viewport(display))
    }

    /// Convert a click in whole-view pixels to pane-local display coordinates.
    ///
    /// The z component is set to the plane of the pane that was clicked.
    pub fn click_to_display(&self, x: f64, y: f64) -> Option<(DVec3, usize)> {
        let hit = self.layout.pane_at(x, y, self.viewport)?;
        let z = hit.index as f64 * self.slice_spacing;
        Some((DVec3::new(hit.local.x, hit.local.y, z), hit.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn view() -> SliceView {
        SliceView::axial(DVec3::new(10.0, 20.0, 30.0), 0.5, Viewport::new(200.0, 100.0)).unwrap()
    }

    #[test]
    fn test_center_maps_to_pane_center() {
        let v = view();
        let d = v.world_to_display(DVec3::new(10.0, 20.0, 30.0));
        assert!((d - DVec3::new(100.0, 50.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_display_z_is_signed_distance() {
        let v = view();
        assert!((v.world_to_display(DVec3::new(10.0, 20.0, 32.5)).z - 2.5).abs() < EPSILON);
        assert!((v.world_to_display(DVec3::new(10.0, 20.0, 29.0)).z + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_round_trip_near_plane() {
        let v = SliceView::new(
            DVec3::new(-4.0, 3.0, 1.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 0.3, 1.0),
            0.7,
            Viewport::new(300.0, 300.0),
        )
        .unwrap();
        for offset in [-0.4, 0.0, 0.25] {
            let p = v.plane().project(v.origin() + DVec3::new(5.0, -2.0, 7.0)) + v.normal() * offset;
            let back = v.display_to_world(v.world_to_display(p));
            assert!((back - p).length() < 1e-6);
        }
    }

    #[test]
    fn test_parallel_axes_rejected() {
        let err = SliceView::new(DVec3::ZERO, DVec3::X, DVec3::X * 2.0, 1.0, Viewport::new(10.0, 10.0));
        assert!(err.is_err());
        assert!(SliceView::axial(DVec3::ZERO, 0.0, Viewport::new(10.0, 10.0)).is_err());
    }

    #[test]
    fn test_lightbox_display_uses_pane_size() {
        let v = view().with_layout(LightboxLayout::new(2, 2));
        // Pane is 100x50 pixels, so the origin maps to its centre.
        let d = v.world_to_display(v.origin());
        assert!((d - DVec3::new(50.0, 25.0, 0.0)).length() < EPSILON);
        let vp = v.display_to_viewport(d);
        assert!((vp - DVec2::new(0.5, 0.5)).length() < EPSILON);
    }

    #[test]
    fn test_pane_plane_offsets() {
        let v = view().with_layout(LightboxLayout::new(1, 3)).with_slice_spacing(2.0);
        let p = v.origin() + DVec3::Z * 4.0;
        assert!(v.pane_plane(2).signed_distance(p).abs() < EPSILON);
        assert_eq!(v.pane_for_display(v.world_to_display(p)), Some(2));
    }

    #[test]
    fn test_click_to_display_encodes_pane() {
        let v = view().with_layout(LightboxLayout::new(1, 2)).with_slice_spacing(3.0);
        let (display, pane) = v.click_to_display(150.0, 40.0).unwrap();
        assert_eq!(pane, 1);
        assert_eq!(display, DVec3::new(50.0, 40.0, 3.0));
        let world = v.display_to_world(display);
        assert!(v.pane_plane(1).signed_distance(world).abs() < EPSILON);
    }

    #[test]
    fn test_distance_window_boundary() {
        let v = view().with_layout(LightboxLayout::new(2, 2)).with_slice_spacing(2.0);
        let boundary = 0.5 + 3.0 * 2.0;
        let inside = DVec3::new(50.0, 25.0, boundary - 1.0);
        let on_edge = DVec3::new(50.0, 25.0, boundary);
        assert!(v.is_display_point_shown(inside, 0.5));
        assert!(!v.is_display_point_shown(on_edge, 0.5));
    }

    #[test]
    fn test_invalid_spacing_ignored() {
        let mut v = view();
        v.set_slice_spacing(-1.0);
        assert_eq!(v.slice_spacing(), 1.0);
    }
}
