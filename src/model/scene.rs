//! The observable scene graph.
//!
//! The scene owns every annotation, display and transform node and is shared
//! (via `Rc`) by all display managers. Changes are broadcast synchronously to
//! [`SceneObserver`]s in emission order. No interior borrow is held while
//! observers run, so an observer may read or write the scene from inside its
//! callback.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use glam::{DMat4, DVec3};
use slicemark_geom::TransformKind;

use super::display::DisplayNode;
use super::kind::AnnotationKind;
use super::node::{AnnotationNode, DisplayId, NodeId, TransformId};
use super::transform::TransformNode;
use crate::notify::{ObserverList, SubscriptionId};
use crate::state::{InteractionState, SelectionState};

/// What part of a node changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeChange {
    /// Only control point positions moved
    PointModified,
    /// Anything else about the node (name, point count, ...)
    Modified,
    /// One of the node's display nodes changed
    DisplayModified,
    /// The parent transform (or one of its ancestors) changed
    TransformModified,
    LockModified,
    VisibilityModified,
    AttributeModified,
}

/// Notifications broadcast by the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    NodeModified { id: NodeId, change: NodeChange },
    /// A bulk import started; per-node work can be skipped until `EndBatch`
    StartBatch,
    EndBatch,
    StartClose,
    /// The scene was cleared
    EndClose,
    /// The interaction or selection state was installed or replaced
    SingletonsChanged,
}

/// Receives scene notifications.
pub trait SceneObserver {
    fn on_scene_event(&self, scene: &Scene, event: &SceneEvent);
}

/// Hook point for an external undo stack.
///
/// Called before user-driven edits (drag start, click placement) so the
/// current state of the listed nodes can be captured.
pub trait UndoHook {
    fn save_state_for_undo(&self, scene: &Scene, nodes: &[NodeId]);
}

#[derive(Debug, Default)]
struct SceneData {
    next_id: u64,
    nodes: BTreeMap<NodeId, AnnotationNode>,
    displays: BTreeMap<DisplayId, DisplayNode>,
    transforms: BTreeMap<TransformId, TransformNode>,
}

impl SceneData {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Transforms from the node's parent up to the root.
    fn chain(&self, mut current: Option<TransformId>) -> Vec<TransformKind> {
        let mut chain = Vec::new();
        while let Some(id) = current {
            // Guard against cycles introduced by re-parenting.
            if chain.len() > self.transforms.len() {
                log::error!("Transform cycle detected at {}", id);
                break;
            }
            let Some(transform) = self.transforms.get(&id) else {
                log::warn!("Missing parent transform {}", id);
                break;
            };
            chain.push(transform.kind.clone());
            current = transform.parent;
        }
        chain
    }

    fn chain_contains(&self, mut current: Option<TransformId>, target: TransformId) -> bool {
        let mut steps = 0;
        while let Some(id) = current {
            if id == target {
                return true;
            }
            steps += 1;
            if steps > self.transforms.len() {
                return false;
            }
            current = self.transforms.get(&id).and_then(|t| t.parent);
        }
        false
    }
}

/// Shared scene graph.
pub struct Scene {
    data: RefCell<SceneData>,
    observers: ObserverList<dyn SceneObserver>,
    batch_depth: Cell<u32>,
    interaction: RefCell<Option<Rc<InteractionState>>>,
    selection: RefCell<Option<Rc<SelectionState>>>,
    undo_hook: RefCell<Option<Rc<dyn UndoHook>>>,
}

impl Scene {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            data: RefCell::new(SceneData::default()),
            observers: ObserverList::new(),
            batch_depth: Cell::new(0),
            interaction: RefCell::new(None),
            selection: RefCell::new(None),
            undo_hook: RefCell::new(None),
        })
    }

    /// Create a scene with fresh interaction and selection state installed.
    pub fn with_default_state(persistent_placement: bool) -> Rc<Self> {
        let scene = Self::new();
        scene.set_interaction_state(Some(InteractionState::new(persistent_placement)));
        scene.set_selection_state(Some(SelectionState::with_default_placeables()));
        scene
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&self, observer: &Rc<dyn SceneObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn emit(&self, event: SceneEvent) {
        for observer in self.observers.snapshot() {
            observer.on_scene_event(self, &event);
        }
    }

    // ------------------------------------------------------------------
    // Annotation nodes
    // ------------------------------------------------------------------

    /// Add a node and assign its id.
    pub fn add_node(&self, mut node: AnnotationNode) -> NodeId {
        let id = {
            let mut data = self.data.borrow_mut();
            let id = NodeId(data.allocate());
            node.id = id;
            data.nodes.insert(id, node);
            id
        };
        log::debug!("➕ Scene: added {}", id);
        self.emit(SceneEvent::NodeAdded(id));
        id
    }

    /// Add a node together with its display node, emitting a single `NodeAdded`.
    pub fn add_node_with_display(&self, mut node: AnnotationNode, mut display: DisplayNode) -> NodeId {
        let id = {
            let mut data = self.data.borrow_mut();
            let id = NodeId(data.allocate());
            let display_id = DisplayId(data.allocate());
            display.id = display_id;
            display.owner = Some(id);
            node.id = id;
            node.display_ids.push(display_id);
            data.displays.insert(display_id, display);
            data.nodes.insert(id, node);
            id
        };
        log::debug!("➕ Scene: added {} with display", id);
        self.emit(SceneEvent::NodeAdded(id));
        id
    }

    /// Remove a node and the display nodes it owns.
    pub fn remove_node(&self, id: NodeId) -> Option<AnnotationNode> {
        let removed = {
            let mut data = self.data.borrow_mut();
            let node = data.nodes.remove(&id)?;
            for display_id in &node.display_ids {
                data.displays.remove(display_id);
            }
            node
        };
        log::debug!("➖ Scene: removed {}", id);
        self.emit(SceneEvent::NodeRemoved(id));
        Some(removed)
    }

    /// Snapshot of a node.
    pub fn node(&self, id: NodeId) -> Option<AnnotationNode> {
        self.data.borrow().nodes.get(&id).cloned()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.data.borrow().nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.data.borrow().nodes.len()
    }

    /// Ids of all nodes of a kind, in creation order.
    pub fn node_ids_of_kind(&self, kind: AnnotationKind) -> Vec<NodeId> {
        self.data
            .borrow()
            .nodes
            .values()
            .filter(|n| n.kind == kind)
            .map(|n| n.id)
            .collect()
    }

    /// Mutate a node and broadcast `change` if anything actually changed.
    ///
    /// Returns true when the node existed and was modified.
    pub fn modify_node(
        &self,
        id: NodeId,
        change: NodeChange,
        f: impl FnOnce(&mut AnnotationNode),
    ) -> bool {
        let changed = {
            let mut data = self.data.borrow_mut();
            let Some(node) = data.nodes.get_mut(&id) else {
                log::debug!("Scene: modify of unknown {}", id);
                return false;
            };
            let before = node.clone();
            f(node);
            // The id and display links are owned by the scene.
            node.id = before.id;
            node.display_ids.clone_from(&before.display_ids);
            *node != before
        };
        if changed {
            self.emit(SceneEvent::NodeModified { id, change });
        }
        changed
    }

    pub fn set_control_points(&self, id: NodeId, points: Vec<DVec3>) -> bool {
        self.modify_node(id, NodeChange::PointModified, |n| n.control_points = points)
    }

    /// Move one control point. Out-of-range indices are ignored.
    pub fn set_control_point(&self, id: NodeId, index: usize, position: DVec3) -> bool {
        self.modify_node(id, NodeChange::PointModified, |n| {
            if let Some(p) = n.control_points.get_mut(index) {
                *p = position;
            }
        })
    }

    pub fn set_locked(&self, id: NodeId, locked: bool) -> bool {
        self.modify_node(id, NodeChange::LockModified, |n| n.locked = locked)
    }

    pub fn set_visible(&self, id: NodeId, visible: bool) -> bool {
        self.modify_node(id, NodeChange::VisibilityModified, |n| n.visible = visible)
    }

    pub fn set_name(&self, id: NodeId, name: &str) -> bool {
        self.modify_node(id, NodeChange::Modified, |n| n.name = name.to_string())
    }

    /// Set (`Some`) or clear (`None`) a node attribute.
    pub fn set_attribute(&self, id: NodeId, key: &str, value: Option<&str>) -> bool {
        self.modify_node(id, NodeChange::AttributeModified, |n| match value {
            Some(v) => {
                n.attributes.insert(key.to_string(), v.to_string());
            }
            None => {
                n.attributes.remove(key);
            }
        })
    }

    // ------------------------------------------------------------------
    // Display nodes
    // ------------------------------------------------------------------

    /// Attach a display node to an existing annotation node.
    pub fn add_display_node(&self, owner: NodeId, mut display: DisplayNode) -> Option<DisplayId> {
        let display_id = {
            let mut data = self.data.borrow_mut();
            if !data.nodes.contains_key(&owner) {
                log::warn!("Cannot attach display node to unknown {}", owner);
                return None;
            }
            let display_id = DisplayId(data.allocate());
            display.id = display_id;
            display.owner = Some(owner);
            data.displays.insert(display_id, display);
            if let Some(node) = data.nodes.get_mut(&owner) {
                node.display_ids.push(display_id);
            }
            display_id
        };
        self.emit(SceneEvent::NodeModified {
            id: owner,
            change: NodeChange::DisplayModified,
        });
        Some(display_id)
    }

    pub fn display_node(&self, id: DisplayId) -> Option<DisplayNode> {
        self.data.borrow().displays.get(&id).cloned()
    }

    /// First display node of an annotation node.
    pub fn primary_display(&self, node: NodeId) -> Option<DisplayNode> {
        let data = self.data.borrow();
        let display_id = data.nodes.get(&node)?.display_ids.first()?;
        data.displays.get(display_id).cloned()
    }

    /// Restyle a display node; the owning annotation node is notified.
    pub fn modify_display(&self, id: DisplayId, f: impl FnOnce(&mut DisplayNode)) -> bool {
        let owner = {
            let mut data = self.data.borrow_mut();
            let Some(display) = data.displays.get_mut(&id) else {
                log::debug!("Scene: modify of unknown {}", id);
                return false;
            };
            let before = display.clone();
            f(display);
            display.id = before.id;
            display.owner = before.owner;
            if *display == before {
                return false;
            }
            display.owner
        };
        if let Some(owner) = owner {
            self.emit(SceneEvent::NodeModified {
                id: owner,
                change: NodeChange::DisplayModified,
            });
        }
        true
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    pub fn add_transform(&self, mut transform: TransformNode) -> TransformId {
        let mut data = self.data.borrow_mut();
        let id = TransformId(data.allocate());
        transform.id = id;
        data.transforms.insert(id, transform);
        id
    }

    /// Replace a transform; every node underneath it is notified.
    pub fn set_transform_kind(&self, id: TransformId, kind: TransformKind) -> bool {
        let affected: Vec<NodeId> = {
            let mut data = self.data.borrow_mut();
            let Some(transform) = data.transforms.get_mut(&id) else {
                return false;
            };
            transform.kind = kind;
            data.nodes
                .values()
                .filter(|n| data.chain_contains(n.transform, id))
                .map(|n| n.id)
                .collect()
        };
        for node in affected {
            self.emit(SceneEvent::NodeModified {
                id: node,
                change: NodeChange::TransformModified,
            });
        }
        true
    }

    /// Parent a node under a transform (or detach it with `None`).
    pub fn set_node_transform(&self, node: NodeId, transform: Option<TransformId>) -> bool {
        if let Some(t) = transform {
            if !self.data.borrow().transforms.contains_key(&t) {
                log::warn!("Cannot parent {} under unknown {}", node, t);
                return false;
            }
        }
        self.modify_node(node, NodeChange::TransformModified, |n| n.transform = transform)
    }

    /// Transforms applying to a node, from its parent up to the root.
    pub fn transform_chain(&self, node: NodeId) -> Vec<TransformKind> {
        let data = self.data.borrow();
        let parent = data.nodes.get(&node).and_then(|n| n.transform);
        data.chain(parent)
    }

    /// World-to-local matrix of a node; identity for non-linear parents.
    pub fn world_to_local(&self, node: NodeId) -> DMat4 {
        slicemark_geom::world_to_local(&self.transform_chain(node))
    }

    // ------------------------------------------------------------------
    // Batch processing and close
    // ------------------------------------------------------------------

    /// Begin a bulk import. Batches nest; only the outermost emits events.
    pub fn start_batch(&self) {
        let depth = self.batch_depth.get();
        self.batch_depth.set(depth + 1);
        if depth == 0 {
            log::debug!("📦 Scene: batch started");
            self.emit(SceneEvent::StartBatch);
        }
    }

    pub fn end_batch(&self) {
        let depth = self.batch_depth.get();
        if depth == 0 {
            log::warn!("end_batch called without start_batch");
            return;
        }
        self.batch_depth.set(depth - 1);
        if depth == 1 {
            log::debug!("📦 Scene: batch ended");
            self.emit(SceneEvent::EndBatch);
        }
    }

    pub fn is_batch_processing(&self) -> bool {
        self.batch_depth.get() > 0
    }

    /// Remove every node without per-node notifications.
    pub fn clear(&self) {
        self.emit(SceneEvent::StartClose);
        {
            let mut data = self.data.borrow_mut();
            data.nodes.clear();
            data.displays.clear();
            data.transforms.clear();
        }
        log::debug!("🗑️ Scene cleared");
        self.emit(SceneEvent::EndClose);
    }

    // ------------------------------------------------------------------
    // Singletons and hooks
    // ------------------------------------------------------------------

    pub fn interaction(&self) -> Option<Rc<InteractionState>> {
        self.interaction.borrow().clone()
    }

    pub fn selection(&self) -> Option<Rc<SelectionState>> {
        self.selection.borrow().clone()
    }

    pub fn set_interaction_state(&self, state: Option<Rc<InteractionState>>) {
        *self.interaction.borrow_mut() = state;
        self.emit(SceneEvent::SingletonsChanged);
    }

    pub fn set_selection_state(&self, state: Option<Rc<SelectionState>>) {
        *self.selection.borrow_mut() = state;
        self.emit(SceneEvent::SingletonsChanged);
    }

    pub fn set_undo_hook(&self, hook: Option<Rc<dyn UndoHook>>) {
        *self.undo_hook.borrow_mut() = hook;
    }

    /// Let the undo hook (if any) capture the listed nodes.
    pub fn save_state_for_undo(&self, nodes: &[NodeId]) {
        let hook = self.undo_hook.borrow().clone();
        if let Some(hook) = hook {
            hook.save_state_for_undo(self, nodes);
        }
    }
}
