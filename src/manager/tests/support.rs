//! Shared fixtures for manager tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec3;
use slicemark_geom::{Camera3D, LightboxLayout, SliceView, Viewport};

use crate::config::SyncSettings;
use crate::manager::DisplayManager;
use crate::model::{AnnotationKind, NodeId, Scene, UndoHook};
use crate::state::{InteractionEvent, InteractionMode, InteractionObserver, InteractionState};
use crate::view::ViewContext;
use crate::widget::{Widget, WidgetHook, WidgetRole};

pub const EPSILON: f64 = 1e-6;

/// 200x200 axial view at 1 mm/pixel centred on the origin.
///
/// World `(x, y, z)` shows at display `(x + 100, y + 100, z)`.
pub fn axial_view(id: &str) -> Rc<ViewContext> {
    let slice = SliceView::axial(DVec3::ZERO, 1.0, Viewport::new(200.0, 200.0))
        .unwrap()
        .with_slice_spacing(2.0);
    ViewContext::slice(id, slice)
}

/// 400x100 axial lightbox with four 100x100 panes, 2 mm apart.
pub fn lightbox_view(id: &str) -> Rc<ViewContext> {
    let slice = SliceView::axial(DVec3::ZERO, 1.0, Viewport::new(400.0, 100.0))
        .unwrap()
        .with_layout(LightboxLayout::new(1, 4))
        .with_slice_spacing(2.0);
    ViewContext::slice(id, slice)
}

pub fn camera_view(id: &str) -> Rc<ViewContext> {
    let camera = Camera3D::new(
        DVec3::new(0.0, -500.0, 0.0),
        DVec3::ZERO,
        DVec3::Z,
        Viewport::new(400.0, 300.0),
    )
    .unwrap();
    ViewContext::three_d(id, camera)
}

/// A manager for `kind` bound to `scene` with default settings.
pub fn bound(kind: AnnotationKind, view: &Rc<ViewContext>, scene: &Rc<Scene>) -> Rc<DisplayManager> {
    let manager = DisplayManager::new(kind, view.clone(), SyncSettings::default());
    manager.bind(Some(scene));
    manager
}

/// Put the scene's interaction state into placement of `kind`.
pub fn start_placing(scene: &Scene, kind: AnnotationKind) {
    let selection = scene.selection().unwrap();
    let interaction = scene.interaction().unwrap();
    selection.set_active_class(Some(kind));
    interaction.set_mode(InteractionMode::Place);
}

pub fn primary_points(manager: &DisplayManager, id: NodeId) -> Vec<DVec3> {
    manager
        .with_widgets(id, |set| {
            set.get(WidgetRole::Primary)
                .map(|w| w.world_points().to_vec())
                .unwrap_or_default()
        })
        .unwrap_or_default()
}

pub fn primary_enabled(manager: &DisplayManager, id: NodeId) -> bool {
    manager
        .with_widgets(id, |set| {
            set.get(WidgetRole::Primary)
                .is_some_and(|w| w.is_enabled())
        })
        .unwrap_or(false)
}

pub fn has_role(manager: &DisplayManager, id: NodeId, role: WidgetRole) -> bool {
    manager
        .with_widgets(id, |set| set.get(role).is_some())
        .unwrap_or(false)
}

pub fn assert_close(actual: DVec3, expected: DVec3) {
    assert!(
        (actual - expected).length() < EPSILON,
        "expected {expected:?}, got {actual:?}"
    );
}

/// Records widget lifecycle notifications.
#[derive(Default)]
pub struct RecordingHook {
    pub created: RefCell<Vec<(String, WidgetRole)>>,
    pub about_to_edit: RefCell<Vec<(String, NodeId)>>,
    pub modified: RefCell<usize>,
    pub removed: RefCell<Vec<(String, WidgetRole)>>,
}

impl WidgetHook for RecordingHook {
    fn widget_created(&self, view_id: &str, widget: &Widget) {
        self.created
            .borrow_mut()
            .push((view_id.to_string(), widget.role()));
    }

    fn widget_about_to_edit(&self, view_id: &str, node: NodeId) {
        self.about_to_edit
            .borrow_mut()
            .push((view_id.to_string(), node));
    }

    fn widget_modified(&self, _widget: &Widget) {
        *self.modified.borrow_mut() += 1;
    }

    fn widget_removed(&self, view_id: &str, widget: &Widget) {
        self.removed
            .borrow_mut()
            .push((view_id.to_string(), widget.role()));
    }
}

/// Records the node lists handed to the undo hook.
#[derive(Default)]
pub struct RecordingUndo {
    pub saves: RefCell<Vec<Vec<NodeId>>>,
}

impl UndoHook for RecordingUndo {
    fn save_state_for_undo(&self, _scene: &Scene, nodes: &[NodeId]) {
        self.saves.borrow_mut().push(nodes.to_vec());
    }
}

/// Records interaction state notifications.
#[derive(Default)]
pub struct ModeRecorder {
    pub events: RefCell<Vec<InteractionEvent>>,
}

impl ModeRecorder {
    pub fn watch(state: &InteractionState) -> Rc<Self> {
        let recorder = Rc::new(Self::default());
        let observer: Rc<dyn InteractionObserver> = recorder.clone();
        state.subscribe(&observer);
        recorder
    }

    /// Mode changes that ended in `mode`.
    pub fn changes_to(&self, mode: InteractionMode) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, InteractionEvent::ModeChanged { to, .. } if *to == mode))
            .count()
    }
}

impl InteractionObserver for ModeRecorder {
    fn on_interaction_event(&self, _state: &InteractionState, event: &InteractionEvent) {
        self.events.borrow_mut().push(*event);
    }
}
