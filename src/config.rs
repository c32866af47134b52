//! Configuration file support for slicemark.
//!
//! Preferences, keybindings and the placeable-class registry are stored as a
//! versioned JSON document. The numeric tolerances are handed to display
//! managers as [`SyncSettings`].

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DISPLAY_CHANGE_THRESHOLD, DEFAULT_MIN_REGION_HALF_EXTENT, DEFAULT_PARALLEL_THRESHOLD,
    DEFAULT_SLICE_DISTANCE_MARGIN, DEFAULT_WORLD_EPSILON,
};
use crate::keybindings::KeyBindings;
use crate::model::AnnotationKind;
use crate::state::{PlaceableClass, SelectionState};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration that can be exported and imported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindings,

    /// Placeable classes registered in the selection state
    #[serde(default = "default_placeables")]
    pub placeables: Vec<PlaceableClass>,
}

fn default_placeables() -> Vec<PlaceableClass> {
    AnnotationKind::all()
        .iter()
        .map(|kind| PlaceableClass::new(*kind, format!(":/Icons/Annotation{}.png", kind.name())))
        .collect()
}

/// User preferences section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Stay in place mode after a node is placed
    #[serde(default)]
    pub persistent_placement: bool,

    #[serde(default = "default_slice_distance_margin")]
    pub slice_distance_margin: f64,

    #[serde(default = "default_display_change_threshold")]
    pub display_change_threshold: f64,

    #[serde(default = "default_world_epsilon")]
    pub world_epsilon: f64,

    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: f64,

    #[serde(default = "default_min_region_half_extent")]
    pub min_region_half_extent: f64,
}

fn default_slice_distance_margin() -> f64 {
    DEFAULT_SLICE_DISTANCE_MARGIN
}

fn default_display_change_threshold() -> f64 {
    DEFAULT_DISPLAY_CHANGE_THRESHOLD
}

fn default_world_epsilon() -> f64 {
    DEFAULT_WORLD_EPSILON
}

fn default_parallel_threshold() -> f64 {
    DEFAULT_PARALLEL_THRESHOLD
}

fn default_min_region_half_extent() -> f64 {
    DEFAULT_MIN_REGION_HALF_EXTENT
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            persistent_placement: false,
            slice_distance_margin: default_slice_distance_margin(),
            display_change_threshold: default_display_change_threshold(),
            world_epsilon: default_world_epsilon(),
            parallel_threshold: default_parallel_threshold(),
            min_region_half_extent: default_min_region_half_extent(),
        }
    }
}

/// Tolerances used by display managers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncSettings {
    pub slice_distance_margin: f64,
    pub display_change_threshold: f64,
    pub world_epsilon: f64,
    pub parallel_threshold: f64,
    pub min_region_half_extent: f64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&UserPreferences::default())
    }
}

impl From<&UserPreferences> for SyncSettings {
    fn from(prefs: &UserPreferences) -> Self {
        Self {
            slice_distance_margin: prefs.slice_distance_margin.max(0.0),
            display_change_threshold: prefs.display_change_threshold.max(0.0),
            world_epsilon: prefs.world_epsilon.max(0.0),
            parallel_threshold: prefs.parallel_threshold.clamp(0.0, 1.0),
            min_region_half_extent: prefs.min_region_half_extent.max(0.0),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            keybindings: KeyBindings::default(),
            placeables: default_placeables(),
        }
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings::from(&self.preferences)
    }

    /// Register the configured placeables in `selection`.
    pub fn apply_placeables(&self, selection: &SelectionState) {
        for placeable in &self.placeables {
            selection.add_placeable(placeable.clone());
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "slicemark-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("slicemark").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("slicemark")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
