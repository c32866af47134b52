//! Point (fiducial) annotations.

use glam::DVec3;

use super::kind::{handle_representation, write_points, ClickOutcome, KindContext, KindHandler};
use crate::click_counter::ClickCounter;
use crate::error::{Result, SyncError};
use crate::model::{AnnotationKind, AnnotationNode, DisplayNode};
use crate::view::ViewContext;
use crate::widget::{Representation, WidgetLifecycleHelper, WidgetRole, WidgetStyle};

/// One handle per node, placed with a single click.
#[derive(Debug, Default)]
pub struct FiducialHandler;

impl KindHandler for FiducialHandler {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Fiducial
    }

    fn primary_representation(&self, view: &ViewContext) -> Representation {
        handle_representation(view)
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
        let moved = write_points(ctx, widget, node.control_points.clone());
        let styled = widget.set_style(WidgetStyle::from_display(display));
        Ok(moved || styled)
    }

    fn on_click_in_view(
        &self,
        _ctx: &KindContext<'_>,
        world: DVec3,
        clicks: &mut ClickCounter,
        seed: &mut Vec<DVec3>,
    ) -> ClickOutcome {
        seed.clear();
        if clicks.has_enough_clicks(self.kind().clicks_to_place()) {
            ClickOutcome::Create(vec![world])
        } else {
            ClickOutcome::Ignored
        }
    }

    fn update_position(
        &self,
        ctx: &KindContext<'_>,
        node: &AnnotationNode,
        _display: &DisplayNode,
        helper: &mut WidgetLifecycleHelper,
    ) -> Result<bool> {
        let widget = helper
            .get_mut(node.id(), WidgetRole::Primary)
            .ok_or(SyncError::MissingWidget {
                id: node.id(),
                role: WidgetRole::Primary,
            })?;
        Ok(write_points(ctx, widget, node.control_points.clone()))
    }
}
