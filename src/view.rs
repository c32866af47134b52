//! Per-view rendering context.
//!
//! A view is either a 2D slice view (optionally split into a lightbox grid) or
//! a 3D view looking through a perspective camera. Display managers query it
//! for coordinate conversions and ask it to render; they subscribe to it to
//! hear about slice moves and layout switches.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::{DVec2, DVec3};
use slicemark_geom::{Camera3D, LightboxLayout, Plane, SliceView};
use web_time::Instant;

use crate::notify::{ObserverList, SubscriptionId};

/// Geometry of a view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewGeometry {
    Slice(SliceView),
    ThreeD(Camera3D),
}

/// Surface picking used by 3D views to snap clicks onto rendered geometry.
pub trait Picker {
    /// World position under the pixel, if something was hit.
    fn pick(&self, x: f64, y: f64) -> Option<DVec3>;
}

/// Notifications raised by a [`ViewContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// Slice plane, camera or viewport changed
    GeometryChanged,
    LayoutChanged { was_lightbox: bool, is_lightbox: bool },
}

/// Receives view notifications.
pub trait ViewObserver {
    fn on_view_event(&self, view: &ViewContext, event: &ViewEvent);
}

/// One rendered view: its geometry, optional picker and render bookkeeping.
pub struct ViewContext {
    id: String,
    geometry: RefCell<ViewGeometry>,
    picker: RefCell<Option<Rc<dyn Picker>>>,
    observers: ObserverList<dyn ViewObserver>,
    /// Renders actually issued
    render_count: Cell<u64>,
    /// A render was requested while the scene was batch processing
    render_deferred: Cell<bool>,
    last_render: Cell<Option<Instant>>,
}

impl ViewContext {
    pub fn new(id: impl Into<String>, geometry: ViewGeometry) -> Rc<Self> {
        Rc::new(Self {
            id: id.into(),
            geometry: RefCell::new(geometry),
            picker: RefCell::new(None),
            observers: ObserverList::new(),
            render_count: Cell::new(0),
            render_deferred: Cell::new(false),
            last_render: Cell::new(None),
        })
    }

    pub fn slice(id: impl Into<String>, slice: SliceView) -> Rc<Self> {
        Self::new(id, ViewGeometry::Slice(slice))
    }

    pub fn three_d(id: impl Into<String>, camera: Camera3D) -> Rc<Self> {
        Self::new(id, ViewGeometry::ThreeD(camera))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self, observer: &Rc<dyn ViewObserver>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn emit(&self, event: ViewEvent) {
        for observer in self.observers.snapshot() {
            observer.on_view_event(self, &event);
        }
    }

    pub fn geometry(&self) -> ViewGeometry {
        *self.geometry.borrow()
    }

    /// Slice geometry, or `None` for 3D views.
    pub fn slice_view(&self) -> Option<SliceView> {
        match *self.geometry.borrow() {
            ViewGeometry::Slice(slice) => Some(slice),
            ViewGeometry::ThreeD(_) => None,
        }
    }

    pub fn is_2d(&self) -> bool {
        matches!(*self.geometry.borrow(), ViewGeometry::Slice(_))
    }

    pub fn layout(&self) -> LightboxLayout {
        match *self.geometry.borrow() {
            ViewGeometry::Slice(slice) => slice.layout(),
            ViewGeometry::ThreeD(_) => LightboxLayout::single(),
        }
    }

    pub fn is_lightbox(&self) -> bool {
        self.layout().is_lightbox()
    }

    /// Cutting plane of pane 0 for slice views.
    pub fn cutting_plane(&self) -> Option<Plane> {
        self.slice_view().map(|slice| slice.plane())
    }

    pub fn set_picker(&self, picker: Option<Rc<dyn Picker>>) {
        *self.picker.borrow_mut() = picker;
    }

    pub fn world_to_display(&self, world: DVec3) -> DVec3 {
        match *self.geometry.borrow() {
            ViewGeometry::Slice(slice) => slice.world_to_display(world),
            ViewGeometry::ThreeD(camera) => camera.world_to_display(world),
        }
    }

    /// Convert display to world. 3D views try the picker before unprojecting.
    pub fn display_to_world(&self, display: DVec3) -> DVec3 {
        let geometry = *self.geometry.borrow();
        match geometry {
            ViewGeometry::Slice(slice) => slice.display_to_world(display),
            ViewGeometry::ThreeD(camera) => self
                .pick(display.x, display.y)
                .unwrap_or_else(|| camera.display_to_world(display)),
        }
    }

    pub fn display_to_viewport(&self, display: DVec3) -> DVec2 {
        match *self.geometry.borrow() {
            ViewGeometry::Slice(slice) => slice.display_to_viewport(display),
            ViewGeometry::ThreeD(camera) => camera.display_to_viewport(display),
        }
    }

    fn pick(&self, x: f64, y: f64) -> Option<DVec3> {
        let picker = self.picker.borrow().clone()?;
        picker.pick(x, y)
    }

    /// World position and pane of a click in whole-view pixels.
    ///
    /// Slice views place the point on the clicked pane's plane. 3D views use
    /// the picker, falling back to the focal depth of the camera.
    pub fn click_to_world(&self, x: f64, y: f64) -> Option<(DVec3, usize)> {
        let geometry = *self.geometry.borrow();
        match geometry {
            ViewGeometry::Slice(slice) => {
                let (display, pane) = slice.click_to_display(x, y)?;
                Some((slice.display_to_world(display), pane))
            }
            ViewGeometry::ThreeD(camera) => {
                let viewport = camera.viewport();
                if !viewport.is_valid() || x < 0.0 || y < 0.0 || x >= viewport.width || y >= viewport.height {
                    return None;
                }
                let world = self.pick(x, y).unwrap_or_else(|| {
                    camera.display_to_world(DVec3::new(x, y, camera.focal_depth()))
                });
                Some((world, 0))
            }
        }
    }

    /// Renderer (lightbox pane) that should draw a display point.
    pub fn renderer_for_display(&self, display: DVec3) -> Option<usize> {
        match *self.geometry.borrow() {
            ViewGeometry::Slice(slice) => slice.pane_for_display(display),
            ViewGeometry::ThreeD(_) => Some(0),
        }
    }

    /// Change the lightbox grid of a slice view.
    pub fn set_layout(&self, layout: LightboxLayout) {
        let (was_lightbox, changed) = {
            let mut geometry = self.geometry.borrow_mut();
            let ViewGeometry::Slice(slice) = &mut *geometry else {
                log::warn!("View {} is not a slice view; layout ignored", self.id);
                return;
            };
            let was = slice.layout();
            slice.set_layout(layout);
            (was.is_lightbox(), was != layout)
        };
        if !changed {
            return;
        }
        log::debug!(
            "🔲 View {} layout {}x{}",
            self.id,
            layout.rows,
            layout.columns
        );
        self.emit(ViewEvent::LayoutChanged {
            was_lightbox,
            is_lightbox: layout.is_lightbox(),
        });
    }

    /// Move the cutting plane of a slice view along its normal.
    pub fn translate_slice(&self, distance: f64) {
        let moved = match &mut *self.geometry.borrow_mut() {
            ViewGeometry::Slice(slice) => {
                slice.translate_along_normal(distance);
                true
            }
            ViewGeometry::ThreeD(_) => false,
        };
        if moved {
            self.emit(ViewEvent::GeometryChanged);
        }
    }

    /// Replace the geometry wholesale (new slice matrix or camera).
    pub fn set_geometry(&self, geometry: ViewGeometry) {
        let layout_before = self.layout();
        {
            let mut current = self.geometry.borrow_mut();
            if *current == geometry {
                return;
            }
            *current = geometry;
        }
        let layout_after = self.layout();
        if layout_before != layout_after {
            self.emit(ViewEvent::LayoutChanged {
                was_lightbox: layout_before.is_lightbox(),
                is_lightbox: layout_after.is_lightbox(),
            });
        }
        self.emit(ViewEvent::GeometryChanged);
    }

    /// Request a render. While `batching` it is only remembered.
    pub fn request_render(&self, batching: bool) {
        if batching {
            self.render_deferred.set(true);
            return;
        }
        self.render_deferred.set(false);
        self.render_count.set(self.render_count.get() + 1);
        self.last_render.set(Some(Instant::now()));
        log::trace!("Render {} (#{})", self.id, self.render_count.get());
    }

    /// Issue the render deferred during a batch. Returns true if one was pending.
    pub fn flush_deferred_render(&self) -> bool {
        if !self.render_deferred.get() {
            return false;
        }
        self.request_render(false);
        true
    }

    pub fn has_deferred_render(&self) -> bool {
        self.render_deferred.get()
    }

    pub fn render_count(&self) -> u64 {
        self.render_count.get()
    }

    pub fn last_render(&self) -> Option<Instant> {
        self.last_render.get()
    }
}

impl std::fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewContext")
            .field("id", &self.id)
            .field("geometry", &*self.geometry.borrow())
            .field("render_count", &self.render_count.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicemark_geom::Viewport;

    const EPSILON: f64 = 1e-6;

    struct FixedPicker(DVec3);

    impl Picker for FixedPicker {
        fn pick(&self, _x: f64, _y: f64) -> Option<DVec3> {
            Some(self.0)
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<ViewEvent>>);

    impl ViewObserver for Recorder {
        fn on_view_event(&self, _view: &ViewContext, event: &ViewEvent) {
            self.0.borrow_mut().push(*event);
        }
    }

    fn axial() -> Rc<ViewContext> {
        let slice = SliceView::axial(DVec3::ZERO, 1.0, Viewport::new(200.0, 200.0)).unwrap();
        ViewContext::slice("Red", slice)
    }

    fn camera() -> Camera3D {
        Camera3D::new(
            DVec3::new(0.0, -500.0, 0.0),
            DVec3::ZERO,
            DVec3::Z,
            Viewport::new(400.0, 300.0),
        )
        .unwrap()
    }

    #[test]
    fn test_slice_round_trip() {
        let view = axial();
        let p = DVec3::new(12.5, -40.0, 0.25);
        let back = view.display_to_world(view.world_to_display(p));
        assert!((back - p).length() < EPSILON);
    }

    #[test]
    fn test_three_d_prefers_picker() {
        let view = ViewContext::three_d("3D", camera());
        let (unprojected, _) = view.click_to_world(200.0, 150.0).unwrap();
        assert!(unprojected.length() < 1e-3);

        view.set_picker(Some(Rc::new(FixedPicker(DVec3::new(1.0, 2.0, 3.0)))));
        let (picked, pane) = view.click_to_world(200.0, 150.0).unwrap();
        assert_eq!(picked, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(pane, 0);
        assert!(view.click_to_world(-1.0, 0.0).is_none());
    }

    #[test]
    fn test_layout_change_is_notified_once() {
        let view = axial();
        let recorder = Rc::new(Recorder::default());
        let observer: Rc<dyn ViewObserver> = recorder.clone();
        view.subscribe(&observer);

        view.set_layout(LightboxLayout::new(2, 2));
        view.set_layout(LightboxLayout::new(2, 2));
        assert_eq!(
            *recorder.0.borrow(),
            vec![ViewEvent::LayoutChanged {
                was_lightbox: false,
                is_lightbox: true
            }]
        );
        assert!(view.is_lightbox());
    }

    #[test]
    fn test_render_is_deferred_while_batching() {
        let view = axial();
        view.request_render(true);
        view.request_render(true);
        assert_eq!(view.render_count(), 0);
        assert!(view.flush_deferred_render());
        assert!(!view.flush_deferred_render());
        assert_eq!(view.render_count(), 1);
        assert!(view.last_render().is_some());
    }
}
