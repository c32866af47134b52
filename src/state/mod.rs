//! Session-wide interaction and selection state.
//!
//! Both objects live in the scene as shared singletons. Display managers
//! observe them through weak references and use [`is_placement_owner`] to decide
//! whether a raw input event is theirs to handle.

mod interaction;
mod selection;

pub use interaction::{InteractionEvent, InteractionMode, InteractionObserver, InteractionState};
pub use selection::{PlaceableClass, SelectionEvent, SelectionObserver, SelectionState};

use crate::model::AnnotationKind;

/// True iff the session is placing and the active class is `focus`.
///
/// Every display manager receives every click; this gate keeps all but one of
/// them from reacting.
pub fn is_placement_owner(
    interaction: &InteractionState,
    selection: &SelectionState,
    focus: AnnotationKind,
) -> bool {
    interaction.mode() == InteractionMode::Place && selection.active_class() == Some(focus)
}
