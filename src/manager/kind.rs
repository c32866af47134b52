//! Per-kind strategy interface used by the display manager.

use glam::DVec3;
use slicemark_geom::{points_changed, world_changed};

use super::displayable::control_points_displayable;
use crate::click_counter::ClickCounter;
use crate::config::SyncSettings;
use crate::error::{Result, SyncError};
use crate::model::{AnnotationKind, AnnotationNode, DisplayNode, Scene};
use crate::view::ViewContext;
use crate::widget::{Representation, Widget, WidgetLifecycleHelper, WidgetRole, WidgetSubstate};

/// Everything a handler may read while synchronizing one node.
pub struct KindContext<'a> {
    pub view: &'a ViewContext,
    pub scene: &'a Scene,
    pub settings: &'a SyncSettings,
}

/// What a click in place mode produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    /// More clicks are needed; show a seed at these points
    Seeded(Vec<DVec3>),
    /// Create a node with these control points
    Create(Vec<DVec3>),
}

/// Kind-specific behavior of a display manager.
///
/// The manager owns the event handling, the reentrancy guard and the widget
/// helper; a handler only knows how one kind of node maps onto widgets.
pub trait KindHandler {
    fn kind(&self) -> AnnotationKind;

    /// Representation of the primary widget in `view`.
    fn primary_representation(&self, view: &ViewContext) -> Representation;

    /// Create the primary widget. Returns true if a widget was created.
    fn create_widget(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        let representation = self.primary_representation(ctx.view);
        let (_, created) = helper
            .create_or_get(node.id(), WidgetRole::Primary, representation)
            .ok_or(SyncError::MissingWidget {
                id: node.id(),
                role: WidgetRole::Primary,
            })?;
        Ok(created)
    }

    /// Copy node geometry and style into the widgets. Returns true on change.
    ///
    /// Must be idempotent: a second call with an unchanged node returns false.
    fn propagate_model_to_widget(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool>;

    /// New control points from a dragged widget, or `None` if nothing moved.
    ///
    /// Widgets that are not being moved are ignored.
    fn propagate_widget_to_model(
        &self,
        ctx: &KindContext<'_>,
        widget: &Widget,
        node: &AnnotationNode,
    ) -> Option<Vec<DVec3>> {
        if widget.substate() == WidgetSubstate::Idle {
            return None;
        }
        changed_points(ctx, &node.control_points, widget.world_points().to_vec())
    }

    /// Widget points after handle `handle` was dragged to `world`.
    fn drag_handle(&self, points: &[DVec3], handle: usize, world: DVec3) -> Option<Vec<DVec3>> {
        let mut points = points.to_vec();
        *points.get_mut(handle)? = world;
        Some(points)
    }

    fn on_click_in_view(
        &self,
        ctx: &KindContext<'_>,
        world: DVec3,
        clicks: &mut ClickCounter,
        seed: &mut Vec<DVec3>,
    ) -> ClickOutcome;

    /// Lightweight path for control-point-only changes.
    fn update_position(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool>;

    /// Whether the node can be drawn in the view at all.
    fn is_widget_displayable(&self, ctx: &KindContext<'_>, node: &AnnotationNode) -> bool {
        node.is_complete()
            && control_points_displayable(
                ctx.view,
                &node.control_points,
                ctx.settings.slice_distance_margin,
            )
    }

    /// Lightbox pane (renderer) the node's widgets belong to.
    fn renderer_pane(&self, ctx: &KindContext<'_>, node: &AnnotationNode) -> Option<usize> {
        let anchor = node.control_points.first()?;
        ctx.view.renderer_for_display(ctx.view.world_to_display(*anchor))
    }
}

/// `Some(new)` when `new` differs from `old` beyond the world epsilon.
pub(crate) fn changed_points(
    ctx: &KindContext<'_>,
    old: &[DVec3],
    new: Vec<DVec3>,
) -> Option<Vec<DVec3>> {
    let epsilon = ctx.settings.world_epsilon;
    points_changed(old, &new, |a, b| world_changed(a, b, epsilon)).then_some(new)
}

/// Write world points and their display projections into a widget.
pub(crate) fn write_points(ctx: &KindContext<'_>, widget: &mut Widget, world: Vec<DVec3>) -> bool {
    let display = world
        .iter()
        .map(|p| ctx.view.world_to_display(*p))
        .collect();
    let moved = widget.set_world_points(world, ctx.settings.world_epsilon);
    let shown = widget.set_display_points(display, ctx.settings.display_change_threshold);
    moved || shown
}

/// Handle representation matching the view's layout.
pub(crate) fn handle_representation(view: &ViewContext) -> Representation {
    if view.is_lightbox() {
        Representation::Handle2D
    } else {
        Representation::Handle3D
    }
}

/// Two-click placement shared by rulers and regions.
///
/// Returns the two clicked points once the second click arrives.
pub(crate) fn two_click_placement(
    world: DVec3,
    clicks: &mut ClickCounter,
    seed: &mut Vec<DVec3>,
) -> std::result::Result<[DVec3; 2], ClickOutcome> {
    if clicks.has_enough_clicks(2) {
        let Some(first) = seed.first().copied() else {
            // Counter and seed disagree; restart with this click as the anchor.
            clicks.click();
            *seed = vec![world];
            return Err(ClickOutcome::Seeded(seed.clone()));
        };
        seed.clear();
        Ok([first, world])
    } else {
        *seed = vec![world];
        Err(ClickOutcome::Seeded(seed.clone()))
    }
}
