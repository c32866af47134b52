//! Global constants for slicemark

/// Half-width of the slab around a 2D cutting plane in which points are shown
pub const DEFAULT_SLICE_DISTANCE_MARGIN: f64 = 0.5;

/// Display-space distance (pixels) a widget point must move to count as changed
pub const DEFAULT_DISPLAY_CHANGE_THRESHOLD: f64 = slicemark_geom::DISPLAY_CHANGE_THRESHOLD;

/// World-space tolerance for "did the node geometry change"
pub const DEFAULT_WORLD_EPSILON: f64 = slicemark_geom::WORLD_EPSILON;

/// |cos| between ruler direction and plane normal below which the ruler lies parallel
pub const DEFAULT_PARALLEL_THRESHOLD: f64 = 0.05;

/// Smallest half-extent a click-placed region may have along any axis
pub const DEFAULT_MIN_REGION_HALF_EXTENT: f64 = 0.5;

/// Seeds are drawn slightly larger than placed handles
pub const SEED_GLYPH_SCALE_FACTOR: f64 = 1.5;
