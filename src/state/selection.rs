//! Active annotation class and the registry of placeable classes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::model::{AnnotationKind, NodeId};
use crate::notify::{ObserverList, SubscriptionId};

/// Toolbar metadata for a class of annotation that can be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceableClass {
    pub kind: AnnotationKind,
    /// Label shown in toolbars
    pub label: String,
    /// Icon resource path
    pub icon: String,
    /// Attributes a front-end may filter on
    #[serde(default)]
    pub filter_attributes: BTreeMap<String, String>,
}

impl PlaceableClass {
    pub fn new(kind: AnnotationKind, icon: impl Into<String>) -> Self {
        Self {
            kind,
            label: kind.name().to_string(),
            icon: icon.into(),
            filter_attributes: BTreeMap::new(),
        }
    }
}

/// Notifications raised by [`SelectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    ActiveClassChanged(Option<AnnotationKind>),
    ActiveIdChanged(Option<NodeId>),
    PlaceablesChanged,
}

/// Receives selection notifications.
pub trait SelectionObserver {
    fn on_selection_event(&self, state: &SelectionState, event: &SelectionEvent);
}

/// Which class (and node) the next placement applies to.
pub struct SelectionState {
    active_class: Cell<Option<AnnotationKind>>,
    active_id: Cell<Option<NodeId>>,
    placeables: RefCell<Vec<PlaceableClass>>,
    observers: ObserverList<dyn SelectionObserver>,
}

impl SelectionState {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            active_class: Cell::new(None),
            active_id: Cell::new(None),
            placeables: RefCell::new(Vec::new()),
            observers: ObserverList::new(),
        })
    }

    /// Selection state with every annotation kind registered.
    pub fn with_default_placeables() -> Rc<Self> {
        let state = Self::new();
        for kind in AnnotationKind::all() {
            let icon = format!(":/Icons/Annotation{}.png", kind.name());
            state.add_placeable(PlaceableClass::new(*kind, icon));
        }
        state
    }

    pub fn subscribe(&self, observer: &Rc<dyn SelectionObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn emit(&self, event: SelectionEvent) {
        for observer in self.observers.snapshot() {
            observer.on_selection_event(self, &event);
        }
    }

    pub fn active_class(&self) -> Option<AnnotationKind> {
        self.active_class.get()
    }

    pub fn active_id(&self) -> Option<NodeId> {
        self.active_id.get()
    }

    pub fn set_active_class(&self, kind: Option<AnnotationKind>) {
        if self.active_class.replace(kind) == kind {
            return;
        }
        if let Some(kind) = kind {
            if !self.is_placeable(kind) {
                log::debug!("Active class {} is not registered as placeable", kind);
            }
        }
        self.emit(SelectionEvent::ActiveClassChanged(kind));
    }

    pub fn set_active_id(&self, id: Option<NodeId>) {
        if self.active_id.replace(id) != id {
            self.emit(SelectionEvent::ActiveIdChanged(id));
        }
    }

    /// Register a placeable class, replacing any entry of the same kind.
    pub fn add_placeable(&self, placeable: PlaceableClass) {
        {
            let mut placeables = self.placeables.borrow_mut();
            match placeables.iter_mut().find(|p| p.kind == placeable.kind) {
                Some(existing) => *existing = placeable,
                None => placeables.push(placeable),
            }
        }
        self.emit(SelectionEvent::PlaceablesChanged);
    }

    pub fn remove_placeable(&self, kind: AnnotationKind) -> bool {
        let removed = {
            let mut placeables = self.placeables.borrow_mut();
            let before = placeables.len();
            placeables.retain(|p| p.kind != kind);
            placeables.len() != before
        };
        if removed {
            self.emit(SelectionEvent::PlaceablesChanged);
        }
        removed
    }

    pub fn placeable(&self, kind: AnnotationKind) -> Option<PlaceableClass> {
        self.placeables
            .borrow()
            .iter()
            .find(|p| p.kind == kind)
            .cloned()
    }

    pub fn placeables(&self) -> Vec<PlaceableClass> {
        self.placeables.borrow().clone()
    }

    pub fn is_placeable(&self, kind: AnnotationKind) -> bool {
        self.placeables.borrow().iter().any(|p| p.kind == kind)
    }
}

impl std::fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionState")
            .field("active_class", &self.active_class.get())
            .field("active_id", &self.active_id.get())
            .field("placeables", &self.placeables.borrow().len())
            .finish()
    }
}
