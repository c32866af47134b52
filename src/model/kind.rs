//! Annotation kinds that can be placed in a view.

use serde::{Deserialize, Serialize};

/// The class of an annotation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Single point marker
    Fiducial,
    /// Two-point distance measurement
    Ruler,
    /// Box-shaped region of interest
    Roi,
}

impl AnnotationKind {
    /// Get the display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            AnnotationKind::Fiducial => "Fiducial",
            AnnotationKind::Ruler => "Ruler",
            AnnotationKind::Roi => "ROI",
        }
    }

    /// Get all annotation kinds.
    pub fn all() -> &'static [AnnotationKind] {
        &[
            AnnotationKind::Fiducial,
            AnnotationKind::Ruler,
            AnnotationKind::Roi,
        ]
    }

    /// Number of control points a complete node of this kind has.
    ///
    /// A region stores its centre followed by its half-extents.
    pub fn control_point_count(&self) -> usize {
        match self {
            AnnotationKind::Fiducial => 1,
            AnnotationKind::Ruler | AnnotationKind::Roi => 2,
        }
    }

    /// Number of clicks needed to place a node of this kind.
    pub fn clicks_to_place(&self) -> u32 {
        match self {
            AnnotationKind::Fiducial => 1,
            AnnotationKind::Ruler | AnnotationKind::Roi => 2,
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
