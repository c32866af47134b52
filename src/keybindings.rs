//! Customizable keybindings for mode and placement shortcuts.
//!
//! Session hotkeys switch the interaction mode or pick the class for the next
//! placement. The cancel key is routed through the display manager that owns
//! the current placement so only that manager drops its seed.

use serde::{Deserialize, Serialize};

use crate::model::AnnotationKind;
use crate::state::{InteractionMode, InteractionState, SelectionState};

/// Keys the shortcut layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    L,
    P,
    R,
    T,
    V,
    W,
    Key1,
    Key2,
    Key3,
    Escape,
    Delete,
    Space,
}

impl Key {
    pub fn name(&self) -> &'static str {
        match self {
            Key::A => "A",
            Key::B => "B",
            Key::C => "C",
            Key::D => "D",
            Key::E => "E",
            Key::F => "F",
            Key::G => "G",
            Key::L => "L",
            Key::P => "P",
            Key::R => "R",
            Key::T => "T",
            Key::V => "V",
            Key::W => "W",
            Key::Key1 => "1",
            Key::Key2 => "2",
            Key::Key3 => "3",
            Key::Escape => "Esc",
            Key::Delete => "Del",
            Key::Space => "Space",
        }
    }
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    SetMode(InteractionMode),
    /// Make `kind` the active class and enter placement
    Place(AnnotationKind),
    CancelPlacement,
    TogglePersistence,
}

/// Keybinding configuration for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub view_transform: Key,
    pub window_level: Key,
    pub place_fiducial: Key,
    pub place_ruler: Key,
    pub place_roi: Key,
    pub cancel_placement: Key,
    pub toggle_persistence: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            view_transform: Key::V,
            window_level: Key::W,
            place_fiducial: Key::Key1,
            place_ruler: Key::Key2,
            place_roi: Key::Key3,
            cancel_placement: Key::Escape,
            toggle_persistence: Key::P,
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the action bound to a key press, if any.
    pub fn action_for_key(&self, key: Key) -> Option<KeyAction> {
        if key == self.cancel_placement {
            Some(KeyAction::CancelPlacement)
        } else if key == self.view_transform {
            Some(KeyAction::SetMode(InteractionMode::ViewTransform))
        } else if key == self.window_level {
            Some(KeyAction::SetMode(InteractionMode::AdjustWindowLevel))
        } else if key == self.toggle_persistence {
            Some(KeyAction::TogglePersistence)
        } else {
            AnnotationKind::all()
                .iter()
                .find(|kind| self.key_for_kind(**kind) == key)
                .map(|kind| KeyAction::Place(*kind))
        }
    }

    pub fn key_for_kind(&self, kind: AnnotationKind) -> Key {
        match kind {
            AnnotationKind::Fiducial => self.place_fiducial,
            AnnotationKind::Ruler => self.place_ruler,
            AnnotationKind::Roi => self.place_roi,
        }
    }

    pub fn set_kind_key(&mut self, kind: AnnotationKind, key: Key) {
        match kind {
            AnnotationKind::Fiducial => self.place_fiducial = key,
            AnnotationKind::Ruler => self.place_ruler = key,
            AnnotationKind::Roi => self.place_roi = key,
        }
    }

    /// Describe what `key` is already bound to, if anything.
    pub fn key_conflict(&self, key: Key) -> Option<String> {
        self.action_for_key(key).map(|action| match action {
            KeyAction::SetMode(mode) => format!("{} mode", mode.name()),
            KeyAction::Place(kind) => format!("Place {}", kind.name()),
            KeyAction::CancelPlacement => "Cancel placement".to_string(),
            KeyAction::TogglePersistence => "Toggle persistent placement".to_string(),
        })
    }
}

/// Apply a session-level action to the interaction/selection state.
///
/// `CancelPlacement` is not handled here; it belongs to the owning display
/// manager. Returns false when the action was not applied.
pub fn apply_session_action(
    action: KeyAction,
    interaction: &InteractionState,
    selection: &SelectionState,
) -> bool {
    match action {
        KeyAction::SetMode(mode) => {
            interaction.set_mode(mode);
            true
        }
        KeyAction::Place(kind) => {
            if !selection.is_placeable(kind) {
                log::warn!("{} is not a registered placeable class", kind);
                return false;
            }
            selection.set_active_class(Some(kind));
            interaction.set_mode(InteractionMode::Place);
            true
        }
        KeyAction::TogglePersistence => {
            interaction.set_persistent(!interaction.is_persistent());
            true
        }
        KeyAction::CancelPlacement => false,
    }
}
