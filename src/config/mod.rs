//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files (explicit path or the per-user default location)
//! - CLI arguments
//!
//! Every field has a default, so an empty file (or no file) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::multimon::{
    platform_enumerator, DisplayEnumerator, DisplayOrder, DisplayRecord, MultiMonitorConfig,
    Placement, SlotMode, StaticEnumerator,
};

pub mod types;

pub use types::{
    DiscoveryConfig, DriverConfig, LoggingConfig, PlacementConfig, RuntimeConfig, SlotsConfig,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scene placement
    #[serde(default)]
    pub placement: PlacementConfig,
    /// Slot count policy
    #[serde(default)]
    pub slots: SlotsConfig,
    /// Display discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Virtual display driver
    #[serde(default)]
    pub driver: DriverConfig,
    /// Frame loop
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else
    /// the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => {
                info!("No configuration file, using defaults");
                Ok(Self::default_config())
            }
        }
    }

    /// `<config dir>/virtual-monitors/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("virtual-monitors").join("config.toml"))
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.placement()
            .context("Invalid [placement] configuration")?;

        match self.slots.mode.as_str() {
            "auto" => {}
            "fixed" => {
                if self.slots.count == 0 {
                    anyhow::bail!("slots.count must be at least 1 when slots.mode = 'fixed'");
                }
            }
            _ => anyhow::bail!("Invalid slot mode: {}", self.slots.mode),
        }

        match self.discovery.source.as_str() {
            "os" => {}
            "static" => {
                if self.discovery.displays.is_empty() {
                    warn!("discovery.source = 'static' with no displays listed");
                }
            }
            _ => anyhow::bail!("Invalid discovery source: {}", self.discovery.source),
        }

        if self.driver.enabled {
            if self.driver.add_command.is_empty() || self.driver.remove_command.is_empty() {
                anyhow::bail!("driver.add_command and driver.remove_command are required when the driver is enabled");
            }
            if self.driver.max_cleanup_attempts == 0 {
                anyhow::bail!("driver.max_cleanup_attempts must be at least 1");
            }
        }

        if !(1..=240).contains(&self.runtime.target_fps) {
            anyhow::bail!(
                "runtime.target_fps must be between 1 and 240, got {}",
                self.runtime.target_fps
            );
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    ///
    /// Any `static_displays` switch discovery to the static source.
    pub fn with_overrides(
        mut self,
        scale: Option<f32>,
        fixed_count: Option<usize>,
        static_displays: Vec<DisplayRecord>,
    ) -> Self {
        if let Some(scale) = scale {
            self.placement.scale_per_thousand_pixels = scale;
        }

        if let Some(count) = fixed_count {
            self.slots.mode = "fixed".to_string();
            self.slots.count = count;
        }

        if !static_displays.is_empty() {
            self.discovery.source = "static".to_string();
            self.discovery.displays = static_displays;
        }

        self
    }

    /// Validated placement parameters
    pub fn placement(&self) -> Result<Placement> {
        let placement = Placement::new(
            self.placement.scale_per_thousand_pixels,
            self.placement.height_offset,
            self.placement.depth_offset,
        )?;
        Ok(placement)
    }

    /// Slot count policy
    pub fn slot_mode(&self) -> SlotMode {
        match self.slots.mode.as_str() {
            "fixed" => SlotMode::Fixed {
                count: self.slots.count,
            },
            _ => SlotMode::Auto,
        }
    }

    /// Manager configuration
    pub fn multimon_config(&self) -> Result<MultiMonitorConfig> {
        let config = MultiMonitorConfig {
            placement: self.placement()?,
            slot_mode: self.slot_mode(),
            size_compensation: self.placement.size_compensation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Snapshot ordering
    pub fn display_order(&self) -> DisplayOrder {
        self.discovery.order
    }

    /// Build the configured display source
    ///
    /// Falls back to the static list when OS enumeration is not available on
    /// this platform.
    pub fn display_enumerator(&self) -> Box<dyn DisplayEnumerator> {
        if self.discovery.source == "os" {
            if let Some(enumerator) = platform_enumerator() {
                return enumerator;
            }
            warn!(
                "OS display enumeration is not available on this platform, using {} configured display(s)",
                self.discovery.displays.len()
            );
        }

        Box::new(StaticEnumerator::new(self.discovery.displays.clone()))
    }

    /// Tick interval for the frame loop
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.runtime.target_fps.max(1)))
    }
}
