//! Display nodes: rendering style shared by every view showing an annotation.

use serde::{Deserialize, Serialize};

use super::kind::AnnotationKind;
use super::node::{DisplayId, NodeId};

/// Glyph drawn for point handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphType {
    #[default]
    Sphere,
    Crosshair,
    StarBurst,
    Diamond,
    Circle,
    Square,
}

/// Style of the out-of-plane projection lines drawn for rulers in slice views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionStyle {
    /// Draw projection lines at all
    pub enabled: bool,
    pub color: [u8; 3],
    /// Color used when the ruler lies (nearly) parallel to the slice
    pub parallel_color: Option<[u8; 3]>,
    /// Width of the segment on the viewer side of the plane
    pub over_thickness: f64,
    /// Width of the segment behind the plane
    pub under_thickness: f64,
    pub opacity: f64,
}

impl Default for ProjectionStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: [255, 255, 255],
            parallel_color: None,
            over_thickness: 3.0,
            under_thickness: 1.0,
            opacity: 1.0,
        }
    }
}

/// Rendering style of one annotation node.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    pub(crate) id: DisplayId,
    pub(crate) owner: Option<NodeId>,
    pub color: [u8; 3],
    pub selected_color: [u8; 3],
    pub opacity: f64,
    pub glyph: GlyphType,
    pub glyph_scale: f64,
    pub line_thickness: f64,
    pub text_scale: f64,
    /// Views this node is shown in; empty means every view
    pub view_ids: Vec<String>,
    pub projection: ProjectionStyle,
}

impl DisplayNode {
    /// Default style for a kind of annotation.
    pub fn for_kind(kind: AnnotationKind) -> Self {
        let color = match kind {
            AnnotationKind::Fiducial => [230, 77, 77],
            AnnotationKind::Ruler => [77, 230, 77],
            AnnotationKind::Roi => [77, 128, 230],
        };
        Self {
            id: DisplayId(0),
            owner: None,
            color,
            selected_color: [255, 255, 0],
            opacity: 1.0,
            glyph: GlyphType::default(),
            glyph_scale: 3.0,
            line_thickness: 2.0,
            text_scale: 4.5,
            view_ids: Vec::new(),
            projection: ProjectionStyle::default(),
        }
    }

    pub fn id(&self) -> DisplayId {
        self.id
    }

    /// Annotation node this display node belongs to.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Whether the node should be drawn in the given view.
    pub fn shown_in_view(&self, view_id: &str) -> bool {
        self.view_ids.is_empty() || self.view_ids.iter().any(|v| v == view_id)
    }

    pub fn with_view_ids(mut self, view_ids: Vec<String>) -> Self {
        self.view_ids = view_ids;
        self
    }

    pub fn with_projection(mut self, projection: ProjectionStyle) -> Self {
        self.projection = projection;
        self
    }
}
