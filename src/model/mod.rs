//! Scene data model: annotation nodes, their display nodes, parent transforms
//! and the observable scene that owns them.

mod display;
mod kind;
mod node;
mod scene;
mod transform;

pub use display::{DisplayNode, GlyphType, ProjectionStyle};
pub use kind::AnnotationKind;
pub use node::{
    AnnotationNode, DisplayId, NodeId, TransformId, ATTR_ASSOCIATED_NODE, ATTR_DRAGGING_IN_VIEW,
};
pub use scene::{NodeChange, Scene, SceneEvent, SceneObserver, UndoHook};
pub use transform::TransformNode;
