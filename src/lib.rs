//! slicemark - annotation display synchronization for multi-view medical image viewers
//!
//! Keeps interactive per-view widgets (points, rulers, regions) in two-way sync
//! with a shared, observable scene graph across any number of 2D slice views
//! (including lightbox grids) and 3D views.
//!
//! Single-threaded: every notification is delivered synchronously on the
//! calling thread, and shared state is held through `Rc`/`Weak`.

pub mod click_counter;
pub mod config;
pub mod constants;
pub mod error;
pub mod keybindings;
pub mod manager;
pub mod model;
pub mod notify;
pub mod state;
pub mod view;
pub mod widget;

pub use click_counter::ClickCounter;
pub use config::{AppConfig, ConfigError, LogLevel, SyncSettings, CONFIG_VERSION};
pub use error::{Severity, SyncError};
pub use keybindings::{apply_session_action, Key, KeyAction, KeyBindings};
pub use manager::{DisplayManager, KindHandler, ManagerPhase, WidgetInteraction};
pub use model::{
    AnnotationKind, AnnotationNode, DisplayNode, NodeChange, NodeId, Scene, SceneEvent,
    SceneObserver, UndoHook,
};
pub use state::{InteractionMode, InteractionState, PlaceableClass, SelectionState};
pub use view::{Picker, ViewContext, ViewEvent, ViewGeometry};
pub use widget::{Representation, Widget, WidgetHook, WidgetLifecycleHelper, WidgetRole};

pub use slicemark_geom as geom;
