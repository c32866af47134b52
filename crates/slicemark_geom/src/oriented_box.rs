//! Boxes aligned to a local frame, and their plane cross-sections.

use glam::{DMat4, DVec3};

use crate::plane::Plane;

/// Pairs of corner indices forming the 12 box edges.
///
/// Corner `i` takes `+radius` on axis `a` when bit `a` of `i` is set.
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Distance under which two outline vertices are merged.
const MERGE_DISTANCE: f64 = 1e-9;

/// A box given by centre and half-extents in a local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Centre in local coordinates
    pub center: DVec3,
    /// Half-extents along the local axes
    pub radius: DVec3,
    /// Local-to-world transform
    pub local_to_world: DMat4,
}

impl OrientedBox {
    pub fn new(center: DVec3, radius: DVec3, local_to_world: DMat4) -> Self {
        Self {
            center,
            radius: radius.abs(),
            local_to_world,
        }
    }

    /// Corners in world coordinates.
    pub fn corners_world(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| {
            let sign = DVec3::new(
                if i & 1 != 0 { 1.0 } else { -1.0 },
                if i & 2 != 0 { 1.0 } else { -1.0 },
                if i & 4 != 0 { 1.0 } else { -1.0 },
            );
            self.local_to_world
                .transform_point3(self.center + self.radius * sign)
        })
    }

    pub fn center_world(&self) -> DVec3 {
        self.local_to_world.transform_point3(self.center)
    }

    /// Whether the plane passes through the box (touching counts).
    pub fn intersects_plane(&self, plane: &Plane) -> bool {
        let normal = plane.normal();
        let extent: f64 = [DVec3::X, DVec3::Y, DVec3::Z]
            .iter()
            .zip(self.radius.to_array())
            .map(|(axis, r)| normal.dot(self.local_to_world.transform_vector3(*axis * r)).abs())
            .sum();
        plane.signed_distance(self.center_world()).abs() <= extent
    }

    /// Cross-section polygon of the box with a plane, in world coordinates.
    ///
    /// Vertices are ordered by angle around their centroid. Empty when the
    /// plane misses the box.
    pub fn plane_outline(&self, plane: &Plane) -> Vec<DVec3> {
        let corners = self.corners_world();
        let distances = corners.map(|c| plane.signed_distance(c));

        let mut points: Vec<DVec3> = Vec::new();
        let mut push = |p: DVec3| {
            if !points.iter().any(|q| q.distance(p) < MERGE_DISTANCE) {
                points.push(p);
            }
        };
        for (a, b) in EDGES {
            let (da, db) = (distances[a], distances[b]);
            if da == 0.0 {
                push(corners[a]);
            }
            if db == 0.0 {
                push(corners[b]);
            }
            if da * db < 0.0 {
                push(corners[a].lerp(corners[b], da / (da - db)));
            }
        }
        if points.len() < 3 {
            return points;
        }

        let centroid = points.iter().copied().sum::<DVec3>() / points.len() as f64;
        let u = plane.normal().any_orthonormal_vector();
        let v = plane.normal().cross(u);
        points.sort_by(|p, q| {
            let angle = |x: &DVec3| {
                let rel = *x - centroid;
                rel.dot(v).atan2(rel.dot(u))
            };
            angle(p).total_cmp(&angle(q))
        });
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> OrientedBox {
        OrientedBox::new(DVec3::ZERO, DVec3::ONE, DMat4::IDENTITY)
    }

    #[test]
    fn test_intersects_plane() {
        let b = unit_box();
        assert!(b.intersects_plane(&Plane::new(DVec3::new(0.0, 0.0, 0.5), DVec3::Z).unwrap()));
        assert!(b.intersects_plane(&Plane::new(DVec3::new(0.0, 0.0, 1.0), DVec3::Z).unwrap()));
        assert!(!b.intersects_plane(&Plane::new(DVec3::new(0.0, 0.0, 1.5), DVec3::Z).unwrap()));
    }

    #[test]
    fn test_axial_outline_is_square() {
        let outline = unit_box().plane_outline(&Plane::new(DVec3::ZERO, DVec3::Z).unwrap());
        assert_eq!(outline.len(), 4);
        for p in &outline {
            assert!(p.z.abs() < 1e-12);
            assert!((p.x.abs() - 1.0).abs() < 1e-12);
            assert!((p.y.abs() - 1.0).abs() < 1e-12);
        }
        // Consecutive vertices share an edge of length 2.
        for i in 0..4 {
            let d = outline[i].distance(outline[(i + 1) % 4]);
            assert!((d - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_diagonal_outline_is_hexagon() {
        let plane = Plane::new(DVec3::ZERO, DVec3::ONE).unwrap();
        assert_eq!(unit_box().plane_outline(&plane).len(), 6);
    }

    #[test]
    fn test_outline_follows_local_frame() {
        let shifted = OrientedBox::new(
            DVec3::ZERO,
            DVec3::new(2.0, 1.0, 1.0),
            DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0)),
        );
        let outline = shifted.plane_outline(&Plane::new(DVec3::ZERO, DVec3::Z).unwrap());
        assert!(outline.iter().all(|p| p.x >= 8.0 - 1e-9 && p.x <= 12.0 + 1e-9));
    }

    #[test]
    fn test_missed_plane_gives_empty_outline() {
        let plane = Plane::new(DVec3::new(0.0, 0.0, 3.0), DVec3::Z).unwrap();
        assert!(unit_box().plane_outline(&plane).is_empty());
    }
}
