//! Per-view annotation display managers.
//!
//! One [`DisplayManager`] exists per (view, annotation kind). It observes the
//! scene, the interaction/selection singletons and its view, and keeps the
//! widgets of its kind in that view consistent with the scene nodes. Widget
//! edits flow back into the scene through the same manager.
//!
//! All notifications are synchronous and single-threaded, so a manager can be
//! re-entered by the very notification it raises. The `updating` flag is
//! checked before any interior borrow; node additions/removals that arrive
//! while it is set are queued and replayed once the update finishes.

mod displayable;
mod fiducial;
mod input;
mod kind;
mod region;
mod ruler;

#[cfg(test)]
mod tests;

pub use displayable::control_points_displayable;
pub use fiducial::FiducialHandler;
pub use input::WidgetInteraction;
pub use kind::{ClickOutcome, KindContext, KindHandler};
pub use region::RegionHandler;
pub use ruler::RulerHandler;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::DVec3;

use crate::click_counter::ClickCounter;
use crate::config::SyncSettings;
use crate::error::{Result, SyncError};
use crate::model::{
    AnnotationKind, AnnotationNode, DisplayNode, NodeChange, NodeId, Scene, SceneEvent,
    SceneObserver,
};
use crate::notify::SubscriptionId;
use crate::state::{
    is_placement_owner, InteractionEvent, InteractionObserver, InteractionState, SelectionEvent,
    SelectionObserver, SelectionState,
};
use crate::view::{ViewContext, ViewEvent, ViewObserver};
use crate::widget::{HelperStats, WidgetHook, WidgetLifecycleHelper, WidgetRole, WidgetSet};

/// Lifecycle phase of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerPhase {
    /// No scene attached
    Uninitialized,
    /// Observing a scene
    Bound,
    /// Propagating between model and widgets
    Updating,
}

/// Sets the manager's `updating` flag for its lifetime.
struct UpdateGuard<'a>(&'a Cell<bool>);

impl<'a> UpdateGuard<'a> {
    /// `None` if an update is already in progress.
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A subscription to a singleton, kept so it can be dropped on rebind.
struct Watch<T: ?Sized> {
    target: Weak<T>,
    subscription: SubscriptionId,
}

/// Keeps one annotation kind's widgets in one view in sync with the scene.
pub struct DisplayManager {
    weak_self: Weak<DisplayManager>,
    handler: Box<dyn KindHandler>,
    view: Rc<ViewContext>,
    settings: SyncSettings,
    scene: RefCell<Option<Rc<Scene>>>,
    scene_subscription: Cell<Option<SubscriptionId>>,
    view_subscription: Cell<Option<SubscriptionId>>,
    interaction: RefCell<Option<Watch<InteractionState>>>,
    selection: RefCell<Option<Watch<SelectionState>>>,
    helper: RefCell<WidgetLifecycleHelper>,
    clicks: Cell<ClickCounter>,
    seed: RefCell<Vec<DVec3>>,
    updating: Cell<bool>,
    deferred: RefCell<Vec<SceneEvent>>,
    resync_pending: Cell<bool>,
    seed_clear_pending: Cell<bool>,
    hook: RefCell<Option<Rc<dyn WidgetHook>>>,
    reassignments: Cell<usize>,
}

impl DisplayManager {
    /// Create a manager for `kind` in `view`.
    pub fn new(kind: AnnotationKind, view: Rc<ViewContext>, settings: SyncSettings) -> Rc<Self> {
        let handler: Box<dyn KindHandler> = match kind {
            AnnotationKind::Fiducial => Box::new(FiducialHandler),
            AnnotationKind::Ruler => Box::new(RulerHandler),
            AnnotationKind::Roi => Box::new(RegionHandler),
        };
        Self::with_handler(handler, view, settings)
    }

    pub fn fiducial(view: Rc<ViewContext>, settings: SyncSettings) -> Rc<Self> {
        Self::new(AnnotationKind::Fiducial, view, settings)
    }

    pub fn ruler(view: Rc<ViewContext>, settings: SyncSettings) -> Rc<Self> {
        Self::new(AnnotationKind::Ruler, view, settings)
    }

    pub fn region(view: Rc<ViewContext>, settings: SyncSettings) -> Rc<Self> {
        Self::new(AnnotationKind::Roi, view, settings)
    }

    /// Create a manager with a custom handler.
    pub fn with_handler(
        handler: Box<dyn KindHandler>,
        view: Rc<ViewContext>,
        settings: SyncSettings,
    ) -> Rc<Self> {
        let helper = WidgetLifecycleHelper::new(view.id());
        let manager = Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            handler,
            view,
            settings,
            scene: RefCell::new(None),
            scene_subscription: Cell::new(None),
            view_subscription: Cell::new(None),
            interaction: RefCell::new(None),
            selection: RefCell::new(None),
            helper: RefCell::new(helper),
            clicks: Cell::new(ClickCounter::new()),
            seed: RefCell::new(Vec::new()),
            updating: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
            resync_pending: Cell::new(false),
            seed_clear_pending: Cell::new(false),
            hook: RefCell::new(None),
            reassignments: Cell::new(0),
        });
        let observer: Rc<dyn ViewObserver> = manager.clone();
        manager
            .view_subscription
            .set(Some(manager.view.subscribe(&observer)));
        manager
    }

    pub fn kind(&self) -> AnnotationKind {
        self.handler.kind()
    }

    pub fn view(&self) -> &Rc<ViewContext> {
        &self.view
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn scene(&self) -> Option<Rc<Scene>> {
        self.scene.borrow().clone()
    }

    pub fn phase(&self) -> ManagerPhase {
        if self.updating.get() {
            ManagerPhase::Updating
        } else if self.scene.borrow().is_some() {
            ManagerPhase::Bound
        } else {
            ManagerPhase::Uninitialized
        }
    }

    /// Set the hook notified about widget lifecycle. Applies to new widgets.
    pub fn set_widget_hook(&self, hook: Option<Rc<dyn WidgetHook>>) {
        self.helper.borrow_mut().set_hook(hook.clone());
        *self.hook.borrow_mut() = hook;
    }

    pub(crate) fn hook(&self) -> Option<Rc<dyn WidgetHook>> {
        self.hook.borrow().clone()
    }

    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------

    /// Attach to `scene`, or detach with `None`.
    ///
    /// Re-binding the scene already attached is a no-op. Detaching releases
    /// every widget.
    pub fn bind(&self, scene: Option<&Rc<Scene>>) {
        if let (Some(current), Some(next)) = (self.scene.borrow().as_ref(), scene) {
            if Rc::ptr_eq(current, next) {
                return;
            }
        }
        self.unbind();

        let Some(scene) = scene else {
            return;
        };
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        let observer: Rc<dyn SceneObserver> = this;
        self.scene_subscription.set(Some(scene.subscribe(&observer)));
        *self.scene.borrow_mut() = Some(scene.clone());
        log::debug!("🔗 {} manager bound in {}", self.kind(), self.view.id());

        self.observe_singletons(scene);
        if self.is_enabled() {
            self.update_from_scene();
        }
    }

    fn unbind(&self) {
        let Some(scene) = self.scene.borrow_mut().take() else {
            return;
        };
        if let Some(id) = self.scene_subscription.take() {
            scene.unsubscribe(id);
        }
        self.drop_singletons();
        self.reset_placement();
        let released = self.helper.borrow_mut().remove_all();
        self.deferred.borrow_mut().clear();
        log::debug!(
            "🔌 {} manager unbound from {} ({} widgets released)",
            self.kind(),
            self.view.id(),
            released
        );
    }

    /// Follow the scene's current interaction/selection singletons.
    fn observe_singletons(&self, scene: &Scene) {
        let Some(this) = self.weak_self.upgrade() else {
            return;
        };
        let interaction = scene.interaction();
        let selection = scene.selection();

        let same_interaction = match (self.interaction.borrow().as_ref(), interaction.as_ref()) {
            (Some(watch), Some(state)) => watch.target.as_ptr() == Rc::as_ptr(state),
            (None, None) => true,
            _ => false,
        };
        if !same_interaction {
            if let Some(old) = self.interaction.borrow_mut().take() {
                if let Some(state) = old.target.upgrade() {
                    state.unsubscribe(old.subscription);
                }
            }
            if let Some(state) = interaction {
                let observer: Rc<dyn InteractionObserver> = this.clone();
                *self.interaction.borrow_mut() = Some(Watch {
                    target: Rc::downgrade(&state),
                    subscription: state.subscribe(&observer),
                });
            }
        }

        let same_selection = match (self.selection.borrow().as_ref(), selection.as_ref()) {
            (Some(watch), Some(state)) => watch.target.as_ptr() == Rc::as_ptr(state),
            (None, None) => true,
            _ => false,
        };
        if !same_selection {
            if let Some(old) = self.selection.borrow_mut().take() {
                if let Some(state) = old.target.upgrade() {
                    state.unsubscribe(old.subscription);
                }
            }
            if let Some(state) = selection {
                let observer: Rc<dyn SelectionObserver> = this;
                *self.selection.borrow_mut() = Some(Watch {
                    target: Rc::downgrade(&state),
                    subscription: state.subscribe(&observer),
                });
            }
        }

        if !self.is_enabled() {
            SyncError::missing("interaction or selection state")
                .report(&format!("{} manager in {}", self.kind(), self.view.id()));
        }
    }

    fn drop_singletons(&self) {
        if let Some(old) = self.interaction.borrow_mut().take() {
            if let Some(state) = old.target.upgrade() {
                state.unsubscribe(old.subscription);
            }
        }
        if let Some(old) = self.selection.borrow_mut().take() {
            if let Some(state) = old.target.upgrade() {
                state.unsubscribe(old.subscription);
            }
        }
    }

    pub(crate) fn interaction_state(&self) -> Option<Rc<InteractionState>> {
        self.interaction.borrow().as_ref()?.target.upgrade()
    }

    pub(crate) fn selection_state(&self) -> Option<Rc<SelectionState>> {
        self.selection.borrow().as_ref()?.target.upgrade()
    }

    /// Bound, with both singletons available.
    pub fn is_enabled(&self) -> bool {
        self.scene.borrow().is_some()
            && self.interaction_state().is_some()
            && self.selection_state().is_some()
    }

    /// True iff this manager owns the next placement click.
    pub fn is_placement_owner(&self) -> bool {
        match (self.interaction_state(), self.selection_state()) {
            (Some(interaction), Some(selection)) => {
                is_placement_owner(&interaction, &selection, self.kind())
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Scene -> widgets
    // ------------------------------------------------------------------

    fn context<'a>(&'a self, scene: &'a Scene) -> KindContext<'a> {
        KindContext {
            view: &self.view,
            scene,
            settings: &self.settings,
        }
    }

    /// Node snapshot, checked against this manager's kind.
    fn node_of_kind(&self, scene: &Scene, id: NodeId) -> Result<AnnotationNode> {
        let node = scene.node(id).ok_or(SyncError::UnknownNode(id))?;
        if node.kind != self.kind() {
            return Err(SyncError::TypeMismatch {
                id,
                expected: self.kind(),
                found: node.kind,
            });
        }
        Ok(node)
    }

    fn display_for(&self, scene: &Scene, node: &AnnotationNode) -> DisplayNode {
        scene
            .primary_display(node.id())
            .unwrap_or_else(|| DisplayNode::for_kind(node.kind))
    }

    /// Full model-to-widget sync of one node. Returns true on any change.
    fn sync_node(&self, scene: &Scene, node: &AnnotationNode, full: bool) -> Result<bool> {
        let ctx = self.context(scene);
        let display = self.display_for(scene, node);
        let displayable = node.visible
            && display.shown_in_view(self.view.id())
            && self.handler.is_widget_displayable(&ctx, node);

        let mut helper = self.helper.borrow_mut();
        let mut changed = self.handler.create_widget(&ctx, node, &mut helper)?;
        changed |= helper.update_visible(node.id(), displayable);
        changed |= helper.update_locked(node.id(), node.locked);
        changed |= if full {
            self.handler
                .propagate_model_to_widget(&ctx, node, &display, &mut helper)?
        } else {
            self.handler
                .update_position(&ctx, node, &display, &mut helper)?
        };
        let pane = self.handler.renderer_pane(&ctx, node);
        changed |= self.assign_renderer(&mut helper, node.id(), pane);
        Ok(changed)
    }

    /// Move every widget of the node to `pane`, toggling it off and on.
    fn assign_renderer(
        &self,
        helper: &mut WidgetLifecycleHelper,
        id: NodeId,
        pane: Option<usize>,
    ) -> bool {
        let roles = [
            WidgetRole::Primary,
            WidgetRole::IntersectionMarker,
            WidgetRole::OverProjection,
            WidgetRole::UnderProjection,
        ];
        let mut changed = false;
        for role in roles {
            let Some(widget) = helper.get_mut(id, role) else {
                continue;
            };
            if widget.renderer() == pane {
                continue;
            }
            if widget.renderer().is_some() && pane.is_some() {
                let enabled = widget.is_enabled();
                widget.set_enabled(false);
                widget.set_renderer(pane);
                widget.set_enabled(enabled);
                self.reassignments.set(self.reassignments.get() + 1);
                log::debug!(
                    "🔀 {} {:?} moved to pane {:?} in {}",
                    id,
                    role,
                    pane,
                    self.view.id()
                );
            } else {
                widget.set_renderer(pane);
            }
            changed = true;
        }
        changed
    }

    fn request_render(&self, scene: &Scene) {
        self.view.request_render(scene.is_batch_processing());
    }

    pub fn on_scene_node_added(&self, id: NodeId) {
        if self.updating.get() {
            self.deferred.borrow_mut().push(SceneEvent::NodeAdded(id));
            return;
        }
        let Some(scene) = self.scene() else {
            return;
        };
        if scene.is_batch_processing() {
            log::trace!("Skipping {} during batch; resync at batch end", id);
            return;
        }
        if !self.is_enabled() {
            return;
        }
        let node = match self.node_of_kind(&scene, id) {
            Ok(node) => node,
            Err(SyncError::TypeMismatch { .. }) => return,
            Err(e) => {
                e.report("node added");
                return;
            }
        };
        let result = {
            let Some(_guard) = UpdateGuard::enter(&self.updating) else {
                return;
            };
            self.sync_node(&scene, &node, true)
        };
        match result {
            Ok(_) => {
                // A new node makes any in-progress placement stale.
                self.reset_placement();
                self.request_render(&scene);
                log::debug!("✨ {} widget for {} in {}", self.kind(), id, self.view.id());
            }
            Err(e) => e.report("node added"),
        }
        self.flush_deferred();
    }

    /// Release the node's widgets. Nodes without widgets are tolerated.
    pub fn on_scene_node_removed(&self, id: NodeId) {
        if self.updating.get() {
            self.deferred.borrow_mut().push(SceneEvent::NodeRemoved(id));
            return;
        }
        let released = self.helper.borrow_mut().remove_one(id);
        if released > 0 {
            if let Some(scene) = self.scene() {
                self.request_render(&scene);
            }
        }
    }

    /// React to a change of one node.
    pub fn on_model_changed(&self, id: NodeId, change: NodeChange) {
        if self.updating.get() {
            log::trace!("Ignoring echo of {:?} on {} in {}", change, id, self.view.id());
            return;
        }
        if !self.is_enabled() {
            return;
        }
        let Some(scene) = self.scene() else {
            return;
        };
        let node = match self.node_of_kind(&scene, id) {
            Ok(node) => node,
            Err(SyncError::TypeMismatch { .. }) => return,
            Err(e) => {
                e.report("model changed");
                return;
            }
        };
        let result = {
            let Some(_guard) = UpdateGuard::enter(&self.updating) else {
                return;
            };
            self.sync_node(&scene, &node, change != NodeChange::PointModified)
        };
        match result {
            Ok(true) => self.request_render(&scene),
            Ok(false) => {}
            Err(e) => e.report("model changed"),
        }
        self.flush_deferred();
    }

    /// Resync every node of this kind and drop widgets of vanished nodes.
    pub fn update_from_scene(&self) {
        if !self.is_enabled() {
            return;
        }
        let Some(scene) = self.scene() else {
            return;
        };
        let changed = {
            let Some(_guard) = UpdateGuard::enter(&self.updating) else {
                self.resync_pending.set(true);
                return;
            };
            let ids = scene.node_ids_of_kind(self.kind());
            let stale: Vec<NodeId> = self
                .helper
                .borrow()
                .node_ids()
                .into_iter()
                .filter(|id| !ids.contains(id))
                .collect();
            let mut changed = false;
            for id in stale {
                changed |= self.helper.borrow_mut().remove_one(id) > 0;
            }
            for id in ids {
                let Some(node) = scene.node(id) else {
                    continue;
                };
                match self.sync_node(&scene, &node, true) {
                    Ok(c) => changed |= c,
                    // One bad node must not stop the others.
                    Err(e) => e.report("scene resync"),
                }
            }
            changed
        };
        if changed {
            self.request_render(&scene);
        }
        self.flush_deferred();
    }

    /// Replay work that arrived while an update was in progress.
    fn flush_deferred(&self) {
        if self.updating.get() {
            return;
        }
        if self.seed_clear_pending.take() {
            self.helper.borrow_mut().clear_seed();
        }
        let Some(scene) = self.scene() else {
            self.deferred.borrow_mut().clear();
            return;
        };
        loop {
            let events = std::mem::take(&mut *self.deferred.borrow_mut());
            if events.is_empty() {
                break;
            }
            for event in &events {
                self.handle_scene_event(&scene, event);
            }
        }
        if self.resync_pending.take() {
            self.update_from_scene();
        }
    }

    /// Forget in-progress placement clicks and the seed marker.
    pub(crate) fn reset_placement(&self) {
        let mut clicks = self.clicks.get();
        clicks.reset();
        self.clicks.set(clicks);
        self.seed.borrow_mut().clear();
        match self.helper.try_borrow_mut() {
            Ok(mut helper) => {
                helper.clear_seed();
            }
            Err(_) => self.seed_clear_pending.set(true),
        }
    }

    fn on_scene_closed(&self) {
        self.reset_placement();
        let released = self.helper.borrow_mut().remove_all();
        if released > 0 {
            self.view.request_render(false);
        }
        log::debug!("🗑️ {} in {}: released {} widgets", self.kind(), self.view.id(), released);
    }

    /// A disabled manager stops tracking the model, so it keeps no widgets.
    fn release_while_disabled(&self, scene: &Scene) {
        self.reset_placement();
        let released = self.helper.borrow_mut().remove_all();
        if released > 0 {
            log::info!(
                "{} manager in {} disabled; released {} widgets",
                self.kind(),
                self.view.id(),
                released
            );
            self.request_render(scene);
        }
    }

    fn handle_scene_event(&self, scene: &Scene, event: &SceneEvent) {
        match event {
            SceneEvent::NodeAdded(id) => self.on_scene_node_added(*id),
            SceneEvent::NodeRemoved(id) => self.on_scene_node_removed(*id),
            SceneEvent::NodeModified { id, change } => self.on_model_changed(*id, *change),
            SceneEvent::StartBatch | SceneEvent::StartClose => {}
            SceneEvent::EndBatch => {
                self.update_from_scene();
                self.view.flush_deferred_render();
            }
            SceneEvent::EndClose => self.on_scene_closed(),
            SceneEvent::SingletonsChanged => {
                let was_enabled = self.is_enabled();
                self.observe_singletons(scene);
                if self.is_enabled() {
                    if !was_enabled {
                        log::info!("{} manager in {} enabled", self.kind(), self.view.id());
                        self.update_from_scene();
                    }
                } else {
                    self.release_while_disabled(scene);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Run `f` with the widgets of one node, if it has any.
    pub fn with_widgets<R>(&self, id: NodeId, f: impl FnOnce(&WidgetSet) -> R) -> Option<R> {
        self.helper.borrow().widget_set(id).map(f)
    }

    /// Run `f` with the lifecycle helper.
    pub fn with_helper<R>(&self, f: impl FnOnce(&WidgetLifecycleHelper) -> R) -> R {
        f(&self.helper.borrow())
    }

    pub fn widget_count(&self) -> usize {
        self.helper.borrow().len()
    }

    pub fn helper_stats(&self) -> HelperStats {
        self.helper.borrow().stats()
    }

    /// Number of pane reassignments performed so far.
    pub fn renderer_reassignments(&self) -> usize {
        self.reassignments.get()
    }

    pub fn click_count(&self) -> u32 {
        self.clicks.get().count()
    }

    pub fn has_seed(&self) -> bool {
        self.helper.borrow().seed().is_some()
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        if let Some(id) = self.view_subscription.take() {
            self.view.unsubscribe(id);
        }
        self.unbind();
    }
}

impl std::fmt::Debug for DisplayManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayManager")
            .field("kind", &self.kind())
            .field("view", &self.view.id())
            .field("phase", &self.phase())
            .field("widgets", &self.widget_count())
            .finish()
    }
}

impl SceneObserver for DisplayManager {
    fn on_scene_event(&self, scene: &Scene, event: &SceneEvent) {
        if self.updating.get() {
            // Modifications raised by our own update are echoes.
            if !matches!(event, SceneEvent::NodeModified { .. }) {
                self.deferred.borrow_mut().push(event.clone());
            }
            return;
        }
        self.handle_scene_event(scene, event);
    }
}

impl InteractionObserver for DisplayManager {
    fn on_interaction_event(&self, _state: &InteractionState, event: &InteractionEvent) {
        if let InteractionEvent::EndPlacement = event {
            // Every manager drops its seeds, owner or not.
            self.reset_placement();
        }
    }
}

impl SelectionObserver for DisplayManager {
    fn on_selection_event(&self, _state: &SelectionState, event: &SelectionEvent) {
        if let SelectionEvent::ActiveClassChanged(kind) = event {
            if *kind != Some(self.kind()) {
                self.reset_placement();
            }
        }
    }
}

impl ViewObserver for DisplayManager {
    fn on_view_event(&self, _view: &ViewContext, event: &ViewEvent) {
        match event {
            ViewEvent::GeometryChanged => self.update_from_scene(),
            ViewEvent::LayoutChanged {
                was_lightbox,
                is_lightbox,
            } => {
                if was_lightbox != is_lightbox {
                    log::debug!(
                        "🔲 {} in {}: lightbox {} -> {}",
                        self.kind(),
                        self.view.id(),
                        was_lightbox,
                        is_lightbox
                    );
                }
                self.update_from_scene();
            }
        }
    }
}
