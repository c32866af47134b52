//! Cutting planes.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::GeomError;

/// An oriented plane given by a point on it and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    origin: DVec3,
    normal: DVec3,
}

impl Plane {
    /// Create a plane, normalizing the normal.
    pub fn new(origin: DVec3, normal: DVec3) -> Result<Self, GeomError> {
        let normal = normal
            .try_normalize()
            .ok_or_else(|| GeomError::degenerate("plane normal has zero length"))?;
        Ok(Self { origin, normal })
    }

    /// Create a plane from a normal that is already unit length.
    pub(crate) fn from_unit(origin: DVec3, normal: DVec3) -> Self {
        Self { origin, normal }
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    /// Signed distance of a point; positive on the side the normal points to.
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point - self.origin)
    }

    /// Orthogonal projection of a point onto the plane.
    pub fn project(&self, point: DVec3) -> DVec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Coefficients `[a, b, c, d]` of `a*x + b*y + c*z + d = 0`.
    pub fn equation(&self) -> [f64; 4] {
        [
            self.normal.x,
            self.normal.y,
            self.normal.z,
            -self.normal.dot(self.origin),
        ]
    }

    /// The parallel plane moved `distance` along the normal.
    pub fn offset(&self, distance: f64) -> Self {
        Self {
            origin: self.origin + self.normal * distance,
            normal: self.normal,
        }
    }

    /// Map the plane through an affine transform.
    ///
    /// Normals transform with the inverse transpose so the result stays
    /// perpendicular under non-uniform scaling.
    pub fn transformed(&self, matrix: &DMat4) -> Result<Self, GeomError> {
        let determinant = matrix.determinant();
        if determinant.abs() < f64::EPSILON {
            return Err(GeomError::SingularMatrix { determinant });
        }
        let normal_matrix = matrix.inverse().transpose();
        Self::new(
            matrix.transform_point3(self.origin),
            normal_matrix.transform_vector3(self.normal),
        )
    }

    /// Absolute cosine between the plane normal and a direction.
    ///
    /// Zero means the direction lies in the plane.
    pub fn normal_alignment(&self, direction: DVec3) -> f64 {
        direction
            .try_normalize()
            .map_or(0.0, |d| d.dot(self.normal).abs())
    }
}

/// Parameter `t` where the segment `a -> b` crosses `z == 0`.
///
/// Both points are display coordinates of a slice view, so z is the signed
/// distance to the cutting plane. Returns `None` unless the endpoints lie on
/// strictly opposite sides.
pub fn segment_plane_crossing(a: DVec3, b: DVec3) -> Option<f64> {
    if a.z * b.z >= 0.0 {
        return None;
    }
    Some(a.z / (a.z - b.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_signed_distance_and_projection() {
        let plane = Plane::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, 2.0)).unwrap();
        let p = DVec3::new(1.0, 2.0, 8.0);
        assert!(approx_eq(plane.signed_distance(p), 3.0));
        assert_eq!(plane.project(p), DVec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn test_zero_normal_rejected() {
        assert!(Plane::new(DVec3::ZERO, DVec3::ZERO).is_err());
    }

    #[test]
    fn test_equation() {
        let plane = Plane::new(DVec3::new(0.0, 0.0, 5.0), DVec3::Z).unwrap();
        assert_eq!(plane.equation(), [0.0, 0.0, 1.0, -5.0]);
    }

    #[test]
    fn test_transformed_keeps_points_on_plane() {
        let plane = Plane::new(DVec3::new(1.0, 1.0, 1.0), DVec3::new(1.0, 1.0, 0.0)).unwrap();
        let m = DMat4::from_scale(DVec3::new(2.0, 1.0, 1.0))
            * DMat4::from_translation(DVec3::new(0.0, 3.0, 0.0));
        let moved = plane.transformed(&m).unwrap();
        // A point on the original plane stays on the transformed plane.
        let on_plane = DVec3::new(2.0, 0.0, 7.0);
        assert!(approx_eq(plane.signed_distance(on_plane), 0.0));
        assert!(approx_eq(moved.signed_distance(m.transform_point3(on_plane)), 0.0));
    }

    #[test]
    fn test_crossing_midpoint() {
        let t = segment_plane_crossing(DVec3::new(0.0, 0.0, 2.0), DVec3::new(10.0, 0.0, -2.0));
        assert_eq!(t, Some(0.5));
    }

    #[test]
    fn test_no_crossing_on_same_side_or_touching() {
        assert!(segment_plane_crossing(DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 0.0, 3.0)).is_none());
        assert!(segment_plane_crossing(DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 0.0, -3.0)).is_none());
    }

    #[test]
    fn test_normal_alignment() {
        let plane = Plane::new(DVec3::ZERO, DVec3::Z).unwrap();
        assert!(approx_eq(plane.normal_alignment(DVec3::X), 0.0));
        assert!(approx_eq(plane.normal_alignment(DVec3::new(0.0, 0.0, -4.0)), 1.0));
    }
}
