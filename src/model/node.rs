//! Annotation nodes.

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec3;

use super::kind::AnnotationKind;

/// Attribute naming the image or model that was under the cursor at placement.
pub const ATTR_ASSOCIATED_NODE: &str = "AssociatedNodeID";

/// Attribute holding the id of the view a node is currently dragged in.
pub const ATTR_DRAGGING_IN_VIEW: &str = "DraggingInView";

macro_rules! scene_id {
    ($name:ident, $prefix:literal) => {
        #[doc = concat!("Scene-unique id (`", $prefix, "N`).")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

scene_id!(NodeId, "annotation");
scene_id!(DisplayId, "display");
scene_id!(TransformId, "transform");

/// One placed annotation.
///
/// Control points are world coordinates. A region stores its centre as the
/// first point and its half-extents (along the parent transform's local axes)
/// as the second.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationNode {
    pub(crate) id: NodeId,
    /// Annotation class
    pub kind: AnnotationKind,
    /// Label shown next to the widget
    pub name: String,
    /// Geometry in world coordinates
    pub control_points: Vec<DVec3>,
    /// Locked nodes ignore widget interaction
    pub locked: bool,
    pub visible: bool,
    /// Parent transform, if any
    pub transform: Option<TransformId>,
    /// Associated display nodes
    pub display_ids: Vec<DisplayId>,
    /// Free-form metadata
    pub attributes: BTreeMap<String, String>,
}

impl AnnotationNode {
    /// Create an empty node. The id is assigned when the node is added to a scene.
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            id: NodeId(0),
            kind,
            name: String::new(),
            control_points: Vec::new(),
            locked: false,
            visible: true,
            transform: None,
            display_ids: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn fiducial(position: DVec3) -> Self {
        Self::new(AnnotationKind::Fiducial).with_points(vec![position])
    }

    pub fn ruler(start: DVec3, end: DVec3) -> Self {
        Self::new(AnnotationKind::Ruler).with_points(vec![start, end])
    }

    pub fn roi(center: DVec3, radius: DVec3) -> Self {
        Self::new(AnnotationKind::Roi).with_points(vec![center, radius.abs()])
    }

    pub fn with_points(mut self, points: Vec<DVec3>) -> Self {
        self.control_points = points;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Whether the node has as many control points as its kind needs.
    pub fn is_complete(&self) -> bool {
        self.control_points.len() >= self.kind.control_point_count()
    }

    /// Centre of a region (first control point).
    pub fn region_center(&self) -> Option<DVec3> {
        self.control_points.first().copied()
    }

    /// Half-extents of a region (second control point).
    pub fn region_radius(&self) -> Option<DVec3> {
        self.control_points.get(1).map(|r| r.abs())
    }

    /// Distance between the two endpoints of a ruler.
    pub fn ruler_length(&self) -> Option<f64> {
        match self.control_points.as_slice() {
            [a, b, ..] => Some(a.distance(*b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let ruler = AnnotationNode::ruler(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0));
        assert_eq!(ruler.kind, AnnotationKind::Ruler);
        assert!(ruler.is_complete());
        assert_eq!(ruler.ruler_length(), Some(5.0));

        let roi = AnnotationNode::roi(DVec3::ONE, DVec3::new(-2.0, 1.0, 1.0));
        assert_eq!(roi.region_radius(), Some(DVec3::new(2.0, 1.0, 1.0)));
    }

    #[test]
    fn test_incomplete_node() {
        let node = AnnotationNode::new(AnnotationKind::Fiducial);
        assert!(!node.is_complete());
        assert!(node.region_center().is_none());
    }

    #[test]
    fn test_attributes() {
        let node = AnnotationNode::fiducial(DVec3::ZERO).with_attribute(ATTR_ASSOCIATED_NODE, "volume1");
        assert_eq!(node.attribute(ATTR_ASSOCIATED_NODE), Some("volume1"));
        assert_eq!(node.attribute("missing"), None);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(NodeId(7).to_string(), "annotation7");
        assert_eq!(DisplayId(2).to_string(), "display2");
    }
}
