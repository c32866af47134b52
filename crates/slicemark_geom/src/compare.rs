//! Change detection for coordinates.
//!
//! Widgets are only rewritten when a coordinate moved far enough to be
//! visible. Floating-point noise from repeated world/display round trips would
//! otherwise trigger a refresh on every notification.

use glam::DVec3;

/// Minimum display-space movement (pixels) that counts as a change.
pub const DISPLAY_CHANGE_THRESHOLD: f64 = 1.0;

/// Minimum world-space movement (millimetres) that counts as a change.
pub const WORLD_EPSILON: f64 = 1e-6;

/// True if two display positions differ by more than `threshold` pixels.
pub fn display_changed(old: DVec3, new: DVec3, threshold: f64) -> bool {
    old.distance(new) > threshold
}

/// True if two world positions differ by more than `epsilon` in any component.
pub fn world_changed(old: DVec3, new: DVec3, epsilon: f64) -> bool {
    (old - new).abs().max_element() > epsilon
}

/// Compare two point lists with a per-point predicate.
///
/// A length mismatch always counts as a change.
pub fn points_changed(
    old: &[DVec3],
    new: &[DVec3],
    changed: impl Fn(DVec3, DVec3) -> bool,
) -> bool {
    old.len() != new.len() || old.iter().zip(new).any(|(a, b)| changed(*a, *b))
}
