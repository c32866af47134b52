//! User input routed through a display manager: placement clicks, keys and
//! widget drags.

use glam::DVec3;

use super::kind::{handle_representation, write_points, ClickOutcome};
use super::{DisplayManager, UpdateGuard};
use crate::error::SyncError;
use crate::keybindings::{Key, KeyAction, KeyBindings};
use crate::model::{
    AnnotationNode, DisplayNode, NodeId, Scene, ATTR_ASSOCIATED_NODE, ATTR_DRAGGING_IN_VIEW,
};
use crate::widget::{WidgetRole, WidgetSubstate};

/// Interaction reported by the render layer for a node's primary widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetInteraction {
    /// Button pressed on a handle
    Start,
    /// Handle `handle` dragged to a display position of this view
    Move { handle: usize, display: DVec3 },
    /// Button released
    End,
}

impl DisplayManager {
    /// Handle a placement click at whole-view pixel `(x, y)`.
    ///
    /// Only the placement owner reacts. `associated` names the image or
    /// surface under the click and is stored on the created node. Returns the
    /// id of a newly created node.
    pub fn on_click_in_view(&self, x: f64, y: f64, associated: Option<&str>) -> Option<NodeId> {
        let context = format!("{} click in {}", self.kind(), self.view.id());
        let Some(scene) = self.scene() else {
            SyncError::missing("scene").report(&context);
            return None;
        };
        let (Some(interaction), Some(selection)) = (self.interaction_state(), self.selection_state())
        else {
            SyncError::missing("interaction or selection state").report(&context);
            return None;
        };
        if !self.is_placement_owner() {
            return None;
        }
        let Some((world, pane)) = self.view.click_to_world(x, y) else {
            log::debug!("Click ({}, {}) outside {}", x, y, self.view.id());
            return None;
        };

        let outcome = {
            let ctx = self.context(&scene);
            let mut clicks = self.clicks.get();
            let outcome =
                self.handler
                    .on_click_in_view(&ctx, world, &mut clicks, &mut self.seed.borrow_mut());
            self.clicks.set(clicks);
            outcome
        };
        log::debug!("🖱️ {} click in pane {} -> {:?}", self.kind(), pane, outcome);

        match outcome {
            ClickOutcome::Ignored => None,
            ClickOutcome::Seeded(points) => {
                let representation = handle_representation(&self.view);
                self.helper.borrow_mut().set_seed(
                    points,
                    representation,
                    self.settings.world_epsilon,
                );
                self.request_render(&scene);
                None
            }
            ClickOutcome::Create(points) => {
                let mut node = AnnotationNode::new(self.kind()).with_points(points);
                if let Some(associated) = associated {
                    node = node.with_attribute(ATTR_ASSOCIATED_NODE, associated);
                }
                scene.save_state_for_undo(&[]);
                let id = scene.add_node_with_display(node, DisplayNode::for_kind(self.kind()));
                log::info!("📍 Placed {} {} in {}", self.kind(), id, self.view.id());

                selection.set_active_id(Some(id));
                if !interaction.is_persistent() {
                    interaction.switch_to_view_transform_mode();
                }
                Some(id)
            }
        }
    }

    /// Handle a key press. Only the placement owner reacts.
    ///
    /// Returns true when the key was consumed.
    pub fn on_key_press(&self, key: Key, bindings: &KeyBindings) -> bool {
        if !self.is_placement_owner() {
            return false;
        }
        match bindings.action_for_key(key) {
            Some(KeyAction::CancelPlacement) => {
                self.reset_placement();
                if let Some(interaction) = self.interaction_state() {
                    interaction.switch_to_view_transform_mode();
                }
                log::debug!("⎋ {} placement cancelled in {}", self.kind(), self.view.id());
                true
            }
            _ => false,
        }
    }

    /// Apply an interaction on a node's primary widget.
    ///
    /// Returns true when the interaction was applied.
    pub fn process_widget_interaction(&self, id: NodeId, interaction: WidgetInteraction) -> bool {
        let context = format!("{} widget interaction in {}", self.kind(), self.view.id());
        let Some(scene) = self.scene() else {
            SyncError::missing("scene").report(&context);
            return false;
        };
        if self.updating.get() {
            log::trace!("Ignoring widget interaction on {} during update", id);
            return false;
        }
        let node = match self.node_of_kind(&scene, id) {
            Ok(node) => node,
            Err(e) => {
                e.report(&context);
                return false;
            }
        };
        let interactive = {
            let helper = self.helper.borrow();
            match helper.get(id, WidgetRole::Primary) {
                Some(widget) => widget.process_events() && widget.is_enabled(),
                None => {
                    SyncError::MissingWidget {
                        id,
                        role: WidgetRole::Primary,
                    }
                    .report(&context);
                    return false;
                }
            }
        };
        if !interactive {
            log::debug!("{} is locked or hidden in {}", id, self.view.id());
            return false;
        }

        let applied = match interaction {
            WidgetInteraction::Start => self.start_interaction(&scene, id),
            WidgetInteraction::Move { handle, display } => {
                self.move_handle(&scene, &node, handle, display)
            }
            WidgetInteraction::End => self.end_interaction(&scene, id),
        };
        self.flush_deferred();
        applied
    }

    fn start_interaction(&self, scene: &Scene, id: NodeId) -> bool {
        if let Some(widget) = self.helper.borrow_mut().get_mut(id, WidgetRole::Primary) {
            widget.set_substate(WidgetSubstate::Start);
        }
        scene.save_state_for_undo(&[id]);
        if let Some(hook) = self.hook() {
            hook.widget_about_to_edit(self.view.id(), id);
        }
        // Other views watch this attribute to skip their own echo handling.
        scene.set_attribute(id, ATTR_DRAGGING_IN_VIEW, Some(self.view.id()));
        true
    }

    fn move_handle(
        &self,
        scene: &Scene,
        node: &AnnotationNode,
        handle: usize,
        display: DVec3,
    ) -> bool {
        let id = node.id();
        let world = self.view.display_to_world(display);
        let Some(_guard) = UpdateGuard::enter(&self.updating) else {
            return false;
        };

        let points = {
            let ctx = self.context(scene);
            let mut helper = self.helper.borrow_mut();
            let Some(widget) = helper.get_mut(id, WidgetRole::Primary) else {
                return false;
            };
            if widget.substate() == WidgetSubstate::Idle {
                // Hover fly-by without a press.
                return false;
            }
            widget.set_substate(WidgetSubstate::Moving);
            let Some(dragged) = self.handler.drag_handle(widget.world_points(), handle, world)
            else {
                log::debug!("No handle {} on {}", handle, id);
                return false;
            };
            write_points(&ctx, widget, dragged);
            self.handler.propagate_widget_to_model(&ctx, widget, node)
        };
        let Some(points) = points else {
            // The model is unchanged; put the widget back where the node says.
            if let Err(e) = self.sync_node(scene, node, false) {
                e.report("widget drag");
            }
            return false;
        };

        // Our own echo is suppressed by the guard; refresh derived widgets here.
        scene.set_control_points(id, points);
        let Some(updated) = scene.node(id) else {
            return false;
        };
        match self.sync_node(scene, &updated, false) {
            Ok(_) => self.request_render(scene),
            Err(e) => e.report("widget drag"),
        }
        true
    }

    fn end_interaction(&self, scene: &Scene, id: NodeId) -> bool {
        if let Some(widget) = self.helper.borrow_mut().get_mut(id, WidgetRole::Primary) {
            widget.set_substate(WidgetSubstate::Idle);
        }
        scene.set_attribute(id, ATTR_DRAGGING_IN_VIEW, None);
        true
    }
}
