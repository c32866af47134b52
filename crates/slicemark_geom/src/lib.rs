//! Coordinate space math for slicemark views.
//!
//! Three coordinate spaces are involved when an annotation is drawn in a view:
//!
//! - **world**: physical 3D space (millimetres), where node geometry lives
//! - **display**: pixels of one view (or one lightbox pane). For slice views the
//!   z component is the signed distance to the cutting plane in world units, so
//!   pane `k` of a lightbox sits at `z = k * slice_spacing`. For 3D views z is the
//!   normalized depth of the camera projection.
//! - **viewport**: display coordinates normalized to `0..1` over the pane
//!
//! Nothing in this crate knows about scenes or widgets.

mod camera;
mod compare;
mod error;
mod lightbox;
mod oriented_box;
mod plane;
mod slice;
mod transform;
mod viewport;

pub use camera::Camera3D;
pub use compare::{
    display_changed, points_changed, world_changed, DISPLAY_CHANGE_THRESHOLD, WORLD_EPSILON,
};
pub use error::GeomError;
pub use lightbox::{LightboxLayout, PaneHit};
pub use oriented_box::OrientedBox;
pub use plane::{segment_plane_crossing, Plane};
pub use slice::SliceView;
pub use transform::{accumulate_to_world, world_to_local, TransformKind};
pub use viewport::Viewport;

pub use glam::{DMat4, DVec2, DVec3, DVec4};
