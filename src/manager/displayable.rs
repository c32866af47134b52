//! Shared displayability test for control-point based annotations.

use glam::DVec3;

use crate::view::ViewContext;

/// Whether every control point is shown by some pane of the view.
///
/// Slice views require each point's signed distance to lie inside the open
/// window `(-margin, margin + (panes - 1) * spacing)` and its pane-local
/// viewport position to be strictly inside `(0, 1)²`. 3D views show every
/// point. Nodes without points are never displayable.
pub fn control_points_displayable(view: &ViewContext, points: &[DVec3], margin: f64) -> bool {
    if points.is_empty() {
        return false;
    }
    match view.slice_view() {
        Some(slice) => points.iter().all(|p| {
            slice.is_display_point_shown(slice.world_to_display(*p), margin)
        }),
        None => true,
    }
}
