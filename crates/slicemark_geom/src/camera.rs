//! Perspective camera for 3D views.

use glam::{DMat4, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::GeomError;
use crate::viewport::Viewport;

/// Default vertical field of view in degrees.
const DEFAULT_VIEW_ANGLE: f64 = 30.0;
const DEFAULT_NEAR: f64 = 0.1;
const DEFAULT_FAR: f64 = 10_000.0;

/// A perspective camera looking at a focal point.
///
/// Display z is the projected depth in `0..1` (0 at the near plane).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera3D {
    position: DVec3,
    focal_point: DVec3,
    view_up: DVec3,
    view_angle: f64,
    near: f64,
    far: f64,
    viewport: Viewport,
}

impl Camera3D {
    pub fn new(
        position: DVec3,
        focal_point: DVec3,
        view_up: DVec3,
        viewport: Viewport,
    ) -> Result<Self, GeomError> {
        let direction = focal_point - position;
        if direction.length_squared() < f64::EPSILON {
            return Err(GeomError::degenerate("camera position equals focal point"));
        }
        if direction.cross(view_up).length_squared() < f64::EPSILON {
            return Err(GeomError::degenerate("view up is parallel to view direction"));
        }
        if !viewport.is_valid() {
            return Err(GeomError::degenerate("viewport has no area"));
        }
        Ok(Self {
            position,
            focal_point,
            view_up,
            view_angle: DEFAULT_VIEW_ANGLE,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            viewport,
        })
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn focal_point(&self) -> DVec3 {
        self.focal_point
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Unit vector from the camera towards the focal point.
    pub fn direction_of_projection(&self) -> DVec3 {
        (self.focal_point - self.position).normalize_or_zero()
    }

    /// Move the camera, keeping the focal point. Degenerate placements are ignored.
    pub fn set_position(&mut self, position: DVec3) {
        let direction = self.focal_point - position;
        if direction.length_squared() < f64::EPSILON
            || direction.cross(self.view_up).length_squared() < f64::EPSILON
        {
            log::warn!("Ignoring degenerate camera position {:?}", position);
            return;
        }
        self.position = position;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.is_valid() {
            self.viewport = viewport;
        }
    }

    pub fn view_projection(&self) -> DMat4 {
        let projection = DMat4::perspective_rh(
            self.view_angle.to_radians(),
            self.viewport.aspect(),
            self.near,
            self.far,
        );
        projection * DMat4::look_at_rh(self.position, self.focal_point, self.view_up)
    }

    pub fn world_to_display(&self, world: DVec3) -> DVec3 {
        let ndc = self.view_projection().project_point3(world);
        DVec3::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (ndc.y + 1.0) * 0.5 * self.viewport.height,
            ndc.z,
        )
    }

    pub fn display_to_world(&self, display: DVec3) -> DVec3 {
        let ndc = DVec3::new(
            display.x / self.viewport.width * 2.0 - 1.0,
            display.y / self.viewport.height * 2.0 - 1.0,
            display.z,
        );
        self.view_projection().inverse().project_point3(ndc)
    }

    pub fn display_to_viewport(&self, display: DVec3) -> DVec2 {
        self.viewport.normalize(display.x, display.y)
    }

    /// Display depth of the focal point, used when unprojecting clicks without a pick.
    pub fn focal_depth(&self) -> f64 {
        self.world_to_display(self.focal_point).z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera3D {
        Camera3D::new(
            DVec3::new(0.0, -500.0, 0.0),
            DVec3::ZERO,
            DVec3::Z,
            Viewport::new(400.0, 300.0),
        )
        .unwrap()
    }

    #[test]
    fn test_focal_point_projects_to_center() {
        let cam = camera();
        let d = cam.world_to_display(DVec3::ZERO);
        assert!((d.x - 200.0).abs() < 1e-6);
        assert!((d.y - 150.0).abs() < 1e-6);
        assert!(d.z > 0.0 && d.z < 1.0);
    }

    #[test]
    fn test_round_trip() {
        let cam = camera();
        for p in [DVec3::new(10.0, 5.0, -20.0), DVec3::new(-30.0, 40.0, 12.0)] {
            let back = cam.display_to_world(cam.world_to_display(p));
            assert!((back - p).length() < 1e-4, "{:?} != {:?}", back, p);
        }
    }

    #[test]
    fn test_up_is_up() {
        let cam = camera();
        let above = cam.world_to_display(DVec3::new(0.0, 0.0, 10.0));
        assert!(above.y > 150.0);
    }

    #[test]
    fn test_degenerate_camera_rejected() {
        let vp = Viewport::new(10.0, 10.0);
        assert!(Camera3D::new(DVec3::ZERO, DVec3::ZERO, DVec3::Z, vp).is_err());
        assert!(Camera3D::new(DVec3::ZERO, DVec3::Z, DVec3::Z, vp).is_err());
    }
}
