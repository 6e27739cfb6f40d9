//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::multimon::{DisplayOrder, DisplayRecord};

/// Scene placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Scene units per 1000 pixels (> 0)
    #[serde(default = "default_scale")]
    pub scale_per_thousand_pixels: f32,

    /// Constant vertical offset added to every screen (>= 0)
    #[serde(default)]
    pub height_offset: f32,

    /// Constant forward distance of every screen (>= 0)
    #[serde(default = "default_depth_offset")]
    pub depth_offset: f32,

    /// Correct positions when a screen renders at a different size than
    /// its display's reported resolution
    #[serde(default = "default_true")]
    pub size_compensation: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            scale_per_thousand_pixels: default_scale(),
            height_offset: 0.0,
            depth_offset: default_depth_offset(),
            size_compensation: true,
        }
    }
}

fn default_scale() -> f32 {
    1.0
}

fn default_depth_offset() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Slot count configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsConfig {
    /// "auto" (one per display) or "fixed"
    #[serde(default = "default_slot_mode")]
    pub mode: String,

    /// Slot count when `mode = "fixed"`
    #[serde(default = "default_slot_count")]
    pub count: usize,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            mode: default_slot_mode(),
            count: default_slot_count(),
        }
    }
}

fn default_slot_mode() -> String {
    "auto".to_string()
}

fn default_slot_count() -> usize {
    1
}

/// Display discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// "os" (platform enumeration) or "static" (the list below)
    #[serde(default = "default_source")]
    pub source: String,

    /// Snapshot ordering
    #[serde(default)]
    pub order: DisplayOrder,

    /// Displays used when `source = "static"`, and as the fallback layout
    /// when OS enumeration is unavailable
    #[serde(default)]
    pub displays: Vec<DisplayRecord>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            order: DisplayOrder::default(),
            displays: Vec::new(),
        }
    }
}

fn default_source() -> String {
    "os".to_string()
}

/// Virtual display driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Run the driver commands at all
    #[serde(default)]
    pub enabled: bool,

    /// argv that adds one virtual display
    #[serde(default)]
    pub add_command: Vec<String>,

    /// argv that removes one virtual display
    #[serde(default)]
    pub remove_command: Vec<String>,

    /// Virtual displays to add at startup
    #[serde(default)]
    pub virtual_displays: usize,

    /// Removal attempts per display during cleanup
    #[serde(default = "default_cleanup_attempts")]
    pub max_cleanup_attempts: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            add_command: Vec::new(),
            remove_command: Vec::new(),
            virtual_displays: 0,
            max_cleanup_attempts: default_cleanup_attempts(),
        }
    }
}

fn default_cleanup_attempts() -> u32 {
    3
}

/// Frame loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ticks per second
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Headless backend: configure calls before a slot reports its display
    #[serde(default = "default_settle_frames")]
    pub settle_frames: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            settle_frames: default_settle_frames(),
        }
    }
}

fn default_target_fps() -> u32 {
    60
}

fn default_settle_frames() -> u32 {
    3
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for a daily rolling log file (None = console only)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
