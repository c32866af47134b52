//! Interaction mode state machine.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::notify::{ObserverList, SubscriptionId};

/// What a mouse click in a view currently does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Rotate/pan/zoom the view
    #[default]
    ViewTransform,
    /// Place the active annotation class
    Place,
    /// Adjust image window/level
    AdjustWindowLevel,
}

impl InteractionMode {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::ViewTransform => "View Transform",
            InteractionMode::Place => "Place",
            InteractionMode::AdjustWindowLevel => "Adjust Window/Level",
        }
    }
}

/// Notifications raised by [`InteractionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    ModeChanged {
        from: InteractionMode,
        to: InteractionMode,
    },
    PersistenceChanged(bool),
    /// Placement finished; every manager should drop its in-progress seeds
    EndPlacement,
}

/// Receives interaction notifications.
pub trait InteractionObserver {
    fn on_interaction_event(&self, state: &InteractionState, event: &InteractionEvent);
}

/// Current interaction mode and placement persistence.
pub struct InteractionState {
    mode: Cell<InteractionMode>,
    persistent: Cell<bool>,
    observers: ObserverList<dyn InteractionObserver>,
}

impl InteractionState {
    pub fn new(persistent: bool) -> Rc<Self> {
        Rc::new(Self {
            mode: Cell::new(InteractionMode::default()),
            persistent: Cell::new(persistent),
            observers: ObserverList::new(),
        })
    }

    pub fn subscribe(&self, observer: &Rc<dyn InteractionObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn emit(&self, event: InteractionEvent) {
        for observer in self.observers.snapshot() {
            observer.on_interaction_event(self, &event);
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode.get()
    }

    /// Whether placement stays active after a node is placed.
    pub fn is_persistent(&self) -> bool {
        self.persistent.get()
    }

    /// Switch mode. Leaving `Place` also broadcasts `EndPlacement`.
    ///
    /// Returns false (and emits nothing) if the mode is unchanged.
    pub fn set_mode(&self, mode: InteractionMode) -> bool {
        let from = self.mode.get();
        if from == mode {
            return false;
        }
        self.mode.set(mode);
        log::debug!("🖱️ Interaction mode: {} -> {}", from.name(), mode.name());
        self.emit(InteractionEvent::ModeChanged { from, to: mode });
        if from == InteractionMode::Place {
            self.emit(InteractionEvent::EndPlacement);
        }
        true
    }

    pub fn set_persistent(&self, persistent: bool) {
        if self.persistent.replace(persistent) != persistent {
            self.emit(InteractionEvent::PersistenceChanged(persistent));
        }
    }

    /// Enter one-shot placement.
    pub fn switch_to_single_place_mode(&self) {
        self.set_persistent(false);
        self.set_mode(InteractionMode::Place);
    }

    /// Enter sticky placement.
    pub fn switch_to_persistent_place_mode(&self) {
        self.set_persistent(true);
        self.set_mode(InteractionMode::Place);
    }

    pub fn switch_to_view_transform_mode(&self) {
        self.set_mode(InteractionMode::ViewTransform);
    }

    /// Ask every observer to finish placement without changing mode.
    pub fn end_placement(&self) {
        self.emit(InteractionEvent::EndPlacement);
    }
}

impl std::fmt::Debug for InteractionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionState")
            .field("mode", &self.mode.get())
            .field("persistent", &self.persistent.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<InteractionEvent>>);

    impl InteractionObserver for Recorder {
        fn on_interaction_event(&self, _state: &InteractionState, event: &InteractionEvent) {
            self.0.borrow_mut().push(*event);
        }
    }

    #[test]
    fn test_set_mode_emits_only_on_change() {
        let state = InteractionState::new(false);
        let recorder = Rc::new(Recorder::default());
        let observer: Rc<dyn InteractionObserver> = recorder.clone();
        state.subscribe(&observer);

        assert!(!state.set_mode(InteractionMode::ViewTransform));
        assert!(state.set_mode(InteractionMode::Place));
        assert!(!state.set_mode(InteractionMode::Place));
        assert_eq!(recorder.0.borrow().len(), 1);
    }

    #[test]
    fn test_leaving_place_ends_placement() {
        let state = InteractionState::new(false);
        let recorder = Rc::new(Recorder::default());
        let observer: Rc<dyn InteractionObserver> = recorder.clone();
        state.subscribe(&observer);

        state.switch_to_single_place_mode();
        state.switch_to_view_transform_mode();
        assert_eq!(
            *recorder.0.borrow(),
            vec![
                InteractionEvent::ModeChanged {
                    from: InteractionMode::ViewTransform,
                    to: InteractionMode::Place
                },
                InteractionEvent::ModeChanged {
                    from: InteractionMode::Place,
                    to: InteractionMode::ViewTransform
                },
                InteractionEvent::EndPlacement,
            ]
        );
    }

    #[test]
    fn test_persistent_place_mode() {
        let state = InteractionState::new(false);
        state.switch_to_persistent_place_mode();
        assert!(state.is_persistent());
        assert_eq!(state.mode(), InteractionMode::Place);
    }
}
