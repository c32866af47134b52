//! Error taxonomy for display synchronization.
//!
//! Nothing here is fatal. Entry points on the display manager catch these,
//! log them at the severity of their class and carry on with the next event.

use thiserror::Error;

use crate::model::{AnnotationKind, NodeId};
use crate::widget::WidgetRole;

/// How a failure is surfaced in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Transient; the next scene event re-syncs
    Warning,
    /// A logic bug the developer should see
    Error,
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Interaction/selection singleton, scene or view not available
    #[error("missing context: {what}")]
    MissingContext { what: &'static str },

    /// Node found but of another kind than the manager handles
    #[error("node {id} is a {found}, expected a {expected}")]
    TypeMismatch {
        id: NodeId,
        expected: AnnotationKind,
        found: AnnotationKind,
    },

    /// A widget was expected to exist for the node but does not
    #[error("no {role:?} widget for node {id}")]
    MissingWidget { id: NodeId, role: WidgetRole },

    /// Node id not present in the scene
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// Geometry could not be computed (singular camera, degenerate plane)
    #[error(transparent)]
    Geometry(#[from] slicemark_geom::GeomError),
}

impl SyncError {
    pub fn missing(what: &'static str) -> Self {
        Self::MissingContext { what }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SyncError::MissingContext { .. }
            | SyncError::UnknownNode(_)
            | SyncError::Geometry(_) => Severity::Warning,
            SyncError::TypeMismatch { .. } | SyncError::MissingWidget { .. } => Severity::Error,
        }
    }

    /// Log the error under `context` at its severity.
    pub fn report(&self, context: &str) {
        match self.severity() {
            Severity::Warning => log::warn!("{}: {}", context, self),
            Severity::Error => log::error!("{}: {}", context, self),
        }
    }
}

/// Result type alias for display synchronization.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classes() {
        assert_eq!(SyncError::missing("interaction").severity(), Severity::Warning);
        assert_eq!(
            SyncError::TypeMismatch {
                id: NodeId(1),
                expected: AnnotationKind::Ruler,
                found: AnnotationKind::Fiducial,
            }
            .severity(),
            Severity::Error
        );
        assert_eq!(
            SyncError::MissingWidget {
                id: NodeId(1),
                role: WidgetRole::Primary,
            }
            .severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_messages() {
        let err = SyncError::TypeMismatch {
            id: NodeId(4),
            expected: AnnotationKind::Roi,
            found: AnnotationKind::Ruler,
        };
        assert_eq!(err.to_string(), "node annotation4 is a Ruler, expected a ROI");
    }
}
