//! Two-point rulers.
//!
//! In slice views a ruler also owns up to three derived widgets: a marker where
//! it crosses the cutting plane, and projection lines on either side of the
//! plane. They are recomputed from scratch on every change since whether the
//! ruler crosses the plane at all can flip.

use glam::DVec3;
use slicemark_geom::segment_plane_crossing;

use super::kind::{two_click_placement, write_points, ClickOutcome, KindContext, KindHandler};
use crate::click_counter::ClickCounter;
use crate::error::{Result, SyncError};
use crate::model::{AnnotationKind, AnnotationNode, DisplayNode, NodeId};
use crate::view::ViewContext;
use crate::widget::{Representation, Widget, WidgetLifecycleHelper, WidgetRole, WidgetStyle};

#[derive(Debug, Default)]
pub struct RulerHandler;

/// A projected segment in pane display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    role: WidgetRole,
    from: DVec3,
    to: DVec3,
}

impl RulerHandler {
    fn refresh_derived(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        let id = node.id();
        let (Some(slice), [a, b]) = (ctx.view.slice_view(), node.control_points.as_slice()) else {
            return Ok(remove_derived(helper, id, &DERIVED_ROLES));
        };

        let pane = self.renderer_pane(ctx, node).unwrap_or(0);
        let offset = pane as f64 * slice.slice_spacing();
        // Distances relative to the pane's own plane.
        let da = slice.world_to_display(*a) - DVec3::new(0.0, 0.0, offset);
        let db = slice.world_to_display(*b) - DVec3::new(0.0, 0.0, offset);
        let to_world = |p: DVec3| slice.display_to_world(p + DVec3::new(0.0, 0.0, offset));
        let shown = node.visible && display.shown_in_view(ctx.view.id());
        let crossing = segment_plane_crossing(da, db);
        let mut changed = false;

        match crossing {
            Some(t) => {
                let marker = da.lerp(db, t);
                let widget = derived_widget(
                    helper,
                    id,
                    WidgetRole::IntersectionMarker,
                    Representation::Marker,
                    &mut changed,
                )?;
                changed |= write_points(ctx, widget, vec![to_world(marker)]);
                changed |= widget.set_style(WidgetStyle::from_display(display));
                changed |= widget.set_enabled(shown);
                log::trace!("📏 {} crosses {} at t={:.3}", id, ctx.view.id(), t);
            }
            None => changed |= helper.remove_role(id, WidgetRole::IntersectionMarker),
        }

        let epsilon = ctx.settings.world_epsilon;
        let in_plane = da.z.abs() <= epsilon && db.z.abs() <= epsilon;
        if !display.projection.enabled || in_plane {
            changed |= remove_derived(helper, id, &PROJECTION_ROLES);
            return Ok(changed);
        }

        let parallel =
            slice.plane().normal_alignment(*b - *a) < ctx.settings.parallel_threshold;
        let color = match (parallel, display.projection.parallel_color) {
            (true, Some(color)) => color,
            _ => display.projection.color,
        };

        let segments = projection_segments(da, db, crossing);
        for role in PROJECTION_ROLES {
            let Some(segment) = segments.iter().find(|s| s.role == role) else {
                changed |= helper.remove_role(id, role);
                continue;
            };
            let thickness = match role {
                WidgetRole::OverProjection => display.projection.over_thickness,
                _ => display.projection.under_thickness,
            };
            let widget = derived_widget(helper, id, role, Representation::Line, &mut changed)?;
            changed |= write_points(ctx, widget, vec![to_world(segment.from), to_world(segment.to)]);
            changed |= widget.set_style(WidgetStyle::projection(display, color, thickness));
            changed |= widget.set_enabled(shown);
        }
        Ok(changed)
    }
}

const PROJECTION_ROLES: [WidgetRole; 2] = [WidgetRole::OverProjection, WidgetRole::UnderProjection];

const DERIVED_ROLES: [WidgetRole; 3] = [
    WidgetRole::IntersectionMarker,
    WidgetRole::OverProjection,
    WidgetRole::UnderProjection,
];

fn remove_derived(helper: &mut WidgetLifecycleHelper, id: NodeId, roles: &[WidgetRole]) -> bool {
    roles
        .iter()
        .fold(false, |changed, role| helper.remove_role(id, *role) || changed)
}

fn derived_widget<'h>(
    helper: &'h mut WidgetLifecycleHelper,
    id: NodeId,
    role: WidgetRole,
    representation: Representation,
    changed: &mut bool,
) -> Result<&'h mut Widget> {
    let (widget, created) = helper
        .create_or_get(id, role, representation)
        .ok_or(SyncError::MissingWidget { id, role })?;
    *changed |= created;
    Ok(widget)
}

/// Endpoints flattened onto the pane plane, split at the crossing.
///
/// The segment on the positive side of the plane faces the viewer and becomes
/// the over-projection. Without a crossing the whole ruler is one segment on
/// whichever side it lies.
fn projection_segments(da: DVec3, db: DVec3, crossing: Option<f64>) -> Vec<Segment> {
    let flat = |p: DVec3| DVec3::new(p.x, p.y, 0.0);
    match crossing {
        Some(t) => {
            let cross = flat(da.lerp(db, t));
            let (over, under) = if da.z > 0.0 { (da, db) } else { (db, da) };
            vec![
                Segment {
                    role: WidgetRole::OverProjection,
                    from: flat(over),
                    to: cross,
                },
                Segment {
                    role: WidgetRole::UnderProjection,
                    from: flat(under),
                    to: cross,
                },
            ]
        }
        None => {
            let role = if da.z + db.z > 0.0 {
                WidgetRole::OverProjection
            } else {
                WidgetRole::UnderProjection
            };
            vec![Segment {
                role,
                from: flat(da),
                to: flat(db),
            }]
        }
    }
}

impl KindHandler for RulerHandler {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Ruler
    }

    fn primary_representation(&self, _view: &ViewContext) -> Representation {
        Representation::Line
    }

    fn propagate_model_to_widget(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        let widget = helper
            .get_mut(node.id(), WidgetRole::Primary)
            .ok_or(SyncError::MissingWidget {
                id: node.id(),
                role: WidgetRole::Primary,
            })?;
        let mut changed = write_points(ctx, widget, node.control_points.clone());
        changed |= widget.set_style(WidgetStyle::from_display(display));
        changed |= self.refresh_derived(ctx, node, display, helper)?;
        Ok(changed)
    }

    fn on_click_in_view(
        &self,
        _ctx: &KindContext<'_>,
        world: DVec3,
        clicks: &mut ClickCounter,
        seed: &mut Vec<DVec3>,
    ) -> ClickOutcome {
        match two_click_placement(world, clicks, seed) {
            Ok([start, end]) => ClickOutcome::Create(vec![start, end]),
            Err(outcome) => outcome,
        }
    }

    fn update_position(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        let widget = helper
            .get_mut(node.id(), WidgetRole::Primary)
            .ok_or(SyncError::MissingWidget {
                id: node.id(),
                role: WidgetRole::Primary,
            })?;
        let moved = write_points(ctx, widget, node.control_points.clone());
        let derived = self.refresh_derived(ctx, node, display, helper)?;
        Ok(moved || derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_splits_into_over_and_under() {
        let a = DVec3::new(0.0, 0.0, 2.0);
        let b = DVec3::new(10.0, 0.0, -2.0);
        let segments = projection_segments(a, b, segment_plane_crossing(a, b));
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].role, WidgetRole::OverProjection);
        assert_eq!(segments[0].from, DVec3::new(0.0, 0.0, 0.0));
        assert_eq!(segments[0].to, DVec3::new(5.0, 0.0, 0.0));
        assert_eq!(segments[1].from, DVec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_one_sided_ruler_is_a_single_segment() {
        let below = projection_segments(DVec3::new(0.0, 0.0, -1.0), DVec3::new(4.0, 0.0, -3.0), None);
        assert_eq!(below.len(), 1);
        assert_eq!(below[0].role, WidgetRole::UnderProjection);

        let above = projection_segments(DVec3::new(0.0, 0.0, 1.0), DVec3::new(4.0, 0.0, 0.0), None);
        assert_eq!(above[0].role, WidgetRole::OverProjection);
    }
}
