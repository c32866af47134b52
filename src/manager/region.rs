//! Box-shaped regions of interest.
//!
//! A region stores its centre (world) and half-extents along the axes of its
//! parent frame. The frame comes from the node's transform chain; non-linear
//! parents fall back to the world axes.

use glam::{DMat4, DVec3};
use slicemark_geom::OrientedBox;

use super::kind::{
    changed_points, two_click_placement, write_points, ClickOutcome, KindContext, KindHandler,
};
use crate::click_counter::ClickCounter;
use crate::error::{Result, SyncError};
use crate::model::{AnnotationKind, AnnotationNode, DisplayNode};
use crate::view::ViewContext;
use crate::widget::{
    Representation, Widget, WidgetLifecycleHelper, WidgetRole, WidgetStyle, WidgetSubstate,
};

#[derive(Debug, Default)]
pub struct RegionHandler;

/// Region geometry resolved against its parent frame.
struct RegionFrame {
    world_to_local: DMat4,
    bounds: OrientedBox,
}

impl RegionFrame {
    fn resolve(ctx: &KindContext<'_>, node: &AnnotationNode) -> Option<Self> {
        let center = node.region_center()?;
        let radius = node.region_radius()?;
        let world_to_local = ctx.scene.world_to_local(node.id());
        let local_to_world = world_to_local.inverse();
        Some(Self {
            world_to_local,
            bounds: OrientedBox::new(
                world_to_local.transform_point3(center),
                radius,
                local_to_world,
            ),
        })
    }

    /// Widget handles: centre and the `+radius` corner, in world space.
    fn handles(&self) -> Vec<DVec3> {
        let corner = self
            .bounds
            .local_to_world
            .transform_point3(self.bounds.center + self.bounds.radius);
        vec![self.bounds.center_world(), corner]
    }
}

impl RegionHandler {
    /// First pane whose plane cuts the region.
    fn intersecting_pane(&self, ctx: &KindContext<'_>, frame: &RegionFrame) -> Option<usize> {
        let slice = ctx.view.slice_view()?;
        (0..slice.layout().pane_count())
            .find(|pane| frame.bounds.intersects_plane(&slice.pane_plane(*pane)))
    }

    fn sync(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        let Some(frame) = RegionFrame::resolve(ctx, node) else {
            log::debug!("Region {} is incomplete; nothing to draw", node.id());
            return Ok(false);
        };
        let pane = self.intersecting_pane(ctx, &frame);
        let widget = helper
            .get_mut(node.id(), WidgetRole::Primary)
            .ok_or(SyncError::MissingWidget {
                id: node.id(),
                role: WidgetRole::Primary,
            })?;

        let mut changed = write_points(ctx, widget, frame.handles());
        changed |= widget.set_style(WidgetStyle::from_display(display));
        changed |= widget.set_handles_visible(!node.locked);

        let epsilon = ctx.settings.world_epsilon;
        match ctx.view.slice_view() {
            Some(slice) => {
                let plane = slice.pane_plane(pane.unwrap_or(0));
                changed |= widget.set_outline(frame.bounds.plane_outline(&plane), epsilon);
                // Cutting plane expressed in the region's own frame.
                let equation = plane
                    .transformed(&frame.world_to_local)
                    .map(|local| local.equation())
                    .map_err(SyncError::from)?;
                changed |= widget.set_plane_equation(Some(equation));
            }
            None => {
                changed |= widget.set_outline(frame.bounds.corners_world().to_vec(), epsilon);
                changed |= widget.set_plane_equation(None);
            }
        }
        Ok(changed)
    }
}

impl KindHandler for RegionHandler {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Roi
    }

    fn primary_representation(&self, view: &ViewContext) -> Representation {
        if view.is_2d() {
            Representation::Outline
        } else {
            Representation::Box
        }
    }

    fn propagate_model_to_widget(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        self.sync(ctx, node, display, helper)
    }

    /// Handles are `[centre, corner]`; the model stores `[centre, radius]`.
    fn propagate_widget_to_model(
        &self,
        ctx: &KindContext<'_>,
        widget: &Widget,
        node: &AnnotationNode,
    ) -> Option<Vec<DVec3>> {
        if widget.substate() == WidgetSubstate::Idle {
            return None;
        }
        let [center, corner] = widget.world_points() else {
            return None;
        };
        let world_to_local = ctx.scene.world_to_local(node.id());
        let radius = (world_to_local.transform_point3(*corner)
            - world_to_local.transform_point3(*center))
        .abs()
        .max(DVec3::splat(ctx.settings.min_region_half_extent));
        changed_points(ctx, &node.control_points, vec![*center, radius])
    }

    /// Dragging the centre handle moves the whole box.
    fn drag_handle(&self, points: &[DVec3], handle: usize, world: DVec3) -> Option<Vec<DVec3>> {
        let [center, corner] = points else {
            return None;
        };
        match handle {
            0 => {
                let delta = world - *center;
                Some(vec![world, *corner + delta])
            }
            1 => Some(vec![*center, world]),
            _ => None,
        }
    }

    fn on_click_in_view(
        &self,
        ctx: &KindContext<'_>,
        world: DVec3,
        clicks: &mut ClickCounter,
        seed: &mut Vec<DVec3>,
    ) -> ClickOutcome {
        match two_click_placement(world, clicks, seed) {
            Ok([anchor, opposite]) => {
                let center = (anchor + opposite) * 0.5;
                let radius = ((opposite - anchor) * 0.5)
                    .abs()
                    .max(DVec3::splat(ctx.settings.min_region_half_extent));
                ClickOutcome::Create(vec![center, radius])
            }
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
        self.sync(ctx, node, display, helper)
    }

    /// Slice views show a region only where a pane plane cuts it.
    fn is_widget_displayable(&self, ctx: &KindContext<'_>, node: &AnnotationNode) -> bool {
        let Some(frame) = RegionFrame::resolve(ctx, node) else {
            return false;
        };
        !ctx.view.is_2d() || self.intersecting_pane(ctx, &frame).is_some()
    }

    fn renderer_pane(&self, ctx: &KindContext<'_>, node: &AnnotationNode) -> Option<usize> {
        let frame = RegionFrame::resolve(ctx, node)?;
        if !ctx.view.is_2d() {
            return Some(0);
        }
        self.intersecting_pane(ctx, &frame).or_else(|| {
            ctx.view
                .renderer_for_display(ctx.view.world_to_display(frame.bounds.center_world()))
        })
    }
}
