//! Per-view interactive widgets and their lifecycle.
//!
//! A [`Widget`] is the transient, render-side representation of one node in one
//! view. It is never persisted and never owned by the node: the
//! [`WidgetLifecycleHelper`] of the view's display manager owns every widget
//! it creates and releases them on node removal, scene close or teardown.

mod helper;

pub use helper::{HelperStats, WidgetLifecycleHelper, WidgetSet};

use std::rc::Rc;

use glam::DVec3;
use slicemark_geom::{display_changed, points_changed, world_changed};

use crate::model::{DisplayNode, GlyphType, NodeId};

/// Identifier of a widget, unique within one helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u64);

/// Which slot of a node's widget set a widget occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetRole {
    /// The interactive widget for the node itself
    Primary,
    /// Where a ruler crosses the cutting plane
    IntersectionMarker,
    /// Projected segment on the viewer's side of the plane
    OverProjection,
    /// Projected segment behind the plane
    UnderProjection,
    /// In-progress placement marker, not bound to a node yet
    Seed,
}

/// Rendering representation of a widget.
///
/// A 3D handle cannot be rendered per lightbox pane, so a point widget has to
/// be recreated as a 2D handle when its view switches to a lightbox layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    Handle3D,
    Handle2D,
    Line,
    /// Region drawn as a solid box (3D views)
    Box,
    /// Region drawn as its intersection with the cutting plane (2D views)
    Outline,
    /// Single glyph without interaction
    Marker,
}

impl Representation {
    /// Handle-based representations need `complete_interaction` after being re-shown.
    pub fn is_seed_style(&self) -> bool {
        matches!(self, Representation::Handle3D | Representation::Handle2D)
    }
}

/// Interaction substate reported by the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetSubstate {
    #[default]
    Idle,
    /// Button pressed on a handle
    Start,
    /// Handle is being dragged
    Moving,
}

/// Rendering style copied from a display node.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetStyle {
    pub color: [u8; 3],
    pub selected_color: [u8; 3],
    pub opacity: f64,
    pub glyph: GlyphType,
    pub glyph_scale: f64,
    pub line_thickness: f64,
    pub text_scale: f64,
}

impl WidgetStyle {
    pub fn from_display(display: &DisplayNode) -> Self {
        Self {
            color: display.color,
            selected_color: display.selected_color,
            opacity: display.opacity,
            glyph: display.glyph,
            glyph_scale: display.glyph_scale,
            line_thickness: display.line_thickness,
            text_scale: display.text_scale,
        }
    }

    /// Line style for a projection segment.
    pub fn projection(display: &DisplayNode, color: [u8; 3], thickness: f64) -> Self {
        Self {
            color,
            opacity: display.projection.opacity,
            line_thickness: thickness,
            ..Self::from_display(display)
        }
    }
}

impl Default for WidgetStyle {
    fn default() -> Self {
        Self {
            color: [255, 255, 255],
            selected_color: [255, 255, 255],
            opacity: 1.0,
            glyph: GlyphType::default(),
            glyph_scale: 1.0,
            line_thickness: 1.0,
            text_scale: 1.0,
        }
    }
}

/// Notifications for outer UI (property panels, toolbars).
///
/// Every method has an empty default so implementors pick what they need.
/// `widget_modified` is called synchronously from inside widget setters, so an
/// implementation may re-enter the scene while a display manager is updating.
pub trait WidgetHook {
    fn widget_created(&self, _view_id: &str, _widget: &Widget) {}
    fn widget_about_to_edit(&self, _view_id: &str, _node: NodeId) {}
    fn widget_modified(&self, _widget: &Widget) {}
    fn widget_removed(&self, _view_id: &str, _widget: &Widget) {}
}

/// One interactive representation of a node (or a seed) in one view.
///
/// Setters compare before writing and return whether anything changed; only a
/// real change bumps the revision and notifies the hook.
pub struct Widget {
    id: WidgetId,
    node: Option<NodeId>,
    role: WidgetRole,
    representation: Representation,
    enabled: bool,
    process_events: bool,
    renderer: Option<usize>,
    world_points: Vec<DVec3>,
    display_points: Vec<DVec3>,
    style: WidgetStyle,
    substate: WidgetSubstate,
    plane_equation: Option<[f64; 4]>,
    /// Cross-section polygon (regions in slice views) or box corners (3D)
    outline: Vec<DVec3>,
    handles_visible: bool,
    revision: u64,
    hook: Option<Rc<dyn WidgetHook>>,
}

impl Widget {
    pub(crate) fn new(
        id: WidgetId,
        node: Option<NodeId>,
        role: WidgetRole,
        representation: Representation,
        hook: Option<Rc<dyn WidgetHook>>,
    ) -> Self {
        Self {
            id,
            node,
            role,
            representation,
            enabled: false,
            process_events: role == WidgetRole::Primary,
            renderer: None,
            world_points: Vec::new(),
            display_points: Vec::new(),
            style: WidgetStyle::default(),
            substate: WidgetSubstate::Idle,
            plane_equation: None,
            outline: Vec::new(),
            handles_visible: true,
            revision: 0,
            hook,
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
        if let Some(hook) = self.hook.clone() {
            hook.widget_modified(self);
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn role(&self) -> WidgetRole {
        self.role
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn process_events(&self) -> bool {
        self.process_events
    }

    /// Lightbox pane (renderer) the widget is attached to.
    pub fn renderer(&self) -> Option<usize> {
        self.renderer
    }

    pub fn world_points(&self) -> &[DVec3] {
        &self.world_points
    }

    pub fn display_points(&self) -> &[DVec3] {
        &self.display_points
    }

    pub fn style(&self) -> &WidgetStyle {
        &self.style
    }

    pub fn substate(&self) -> WidgetSubstate {
        self.substate
    }

    pub fn plane_equation(&self) -> Option<[f64; 4]> {
        self.plane_equation
    }

    pub fn outline(&self) -> &[DVec3] {
        &self.outline
    }

    pub fn handles_visible(&self) -> bool {
        self.handles_visible
    }

    /// Number of changes applied since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        self.touch();
        true
    }

    pub fn set_process_events(&mut self, process: bool) -> bool {
        if self.process_events == process {
            return false;
        }
        self.process_events = process;
        self.touch();
        true
    }

    pub fn set_renderer(&mut self, renderer: Option<usize>) -> bool {
        if self.renderer == renderer {
            return false;
        }
        self.renderer = renderer;
        self.touch();
        true
    }

    /// Replace the world points if any moved by more than `epsilon`.
    pub fn set_world_points(&mut self, points: Vec<DVec3>, epsilon: f64) -> bool {
        if !points_changed(&self.world_points, &points, |a, b| world_changed(a, b, epsilon)) {
            return false;
        }
        self.world_points = points;
        self.touch();
        true
    }

    /// Replace the display points if any moved by more than `threshold` pixels.
    pub fn set_display_points(&mut self, points: Vec<DVec3>, threshold: f64) -> bool {
        if !points_changed(&self.display_points, &points, |a, b| {
            display_changed(a, b, threshold)
        }) {
            return false;
        }
        self.display_points = points;
        self.touch();
        true
    }

    pub fn set_style(&mut self, style: WidgetStyle) -> bool {
        if self.style == style {
            return false;
        }
        self.style = style;
        self.touch();
        true
    }

    pub fn set_plane_equation(&mut self, equation: Option<[f64; 4]>) -> bool {
        if self.plane_equation == equation {
            return false;
        }
        self.plane_equation = equation;
        self.touch();
        true
    }

    pub fn set_outline(&mut self, outline: Vec<DVec3>, epsilon: f64) -> bool {
        if !points_changed(&self.outline, &outline, |a, b| world_changed(a, b, epsilon)) {
            return false;
        }
        self.outline = outline;
        self.touch();
        true
    }

    pub fn set_handles_visible(&mut self, visible: bool) -> bool {
        if self.handles_visible == visible {
            return false;
        }
        self.handles_visible = visible;
        self.touch();
        true
    }

    /// Substate changes come from the render layer and do not count as edits.
    pub fn set_substate(&mut self, substate: WidgetSubstate) {
        self.substate = substate;
    }

    /// Finish any pending interaction so the representation is redrawn cleanly.
    pub fn complete_interaction(&mut self) {
        self.substate = WidgetSubstate::Idle;
        self.touch();
    }
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("role", &self.role)
            .field("representation", &self.representation)
            .field("enabled", &self.enabled)
            .field("process_events", &self.process_events)
            .field("renderer", &self.renderer)
            .field("world_points", &self.world_points)
            .field("revision", &self.revision)
            .finish()
    }
}
