//! Transform nodes that annotations can be parented under.

use slicemark_geom::TransformKind;

use super::node::TransformId;

/// A transform in the scene, optionally nested under another transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformNode {
    pub(crate) id: TransformId,
    pub parent: Option<TransformId>,
    pub kind: TransformKind,
}

impl TransformNode {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            id: TransformId(0),
            parent: None,
            kind,
        }
    }

    pub fn with_parent(mut self, parent: TransformId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn id(&self) -> TransformId {
        self.id
    }
}
