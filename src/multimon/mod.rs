//! Multi-Monitor Placement Module
//!
//! Mirrors the physical monitor layout reported by the operating system into
//! a set of rendered screen objects in a 3D scene.
//!
//! # Overview
//!
//! The OS reports displays as an unordered list of `(name, x, y)` records with
//! no persistent identifiers, and the enumeration call is far too slow to run
//! every frame. The capture backend that renders each screen object resolves
//! its target by name, asynchronously, and may show the wrong display for the
//! first few frames. This module keeps the two sides consistent:
//!
//! - **Discovery:** [`LayoutModel`] calls the [`DisplayEnumerator`] once per
//!   activation (or explicit re-scan) and caches a [`LayoutSnapshot`]
//! - **Slots:** [`ScreenRegistry`] creates/destroys scene objects so there is
//!   one [`ScreenSlot`] per display
//! - **Identity:** [`IdentityReconciler`] binds each slot to a record by name,
//!   re-matching only when a slot's resolved name drifts
//! - **Placement:** [`CoordinateMapper`] converts pixel positions to scene
//!   coordinates around a shared centering offset
//! - **Orchestration:** [`MonitorManager`] runs the per-frame tick
//!
//! # Coordinate Spaces
//!
//! ```text
//!   OS pixel space (y down)              scene space (y up)
//!
//!   (0,0)      (1920,0)     (3840,0)
//!   ┌────────┐ ┌────────┐ ┌────────┐     ┌────────┐┌────────┐┌────────┐
//!   │DISPLAY2│ │DISPLAY1│ │DISPLAY3│  →  │  -1.92 ││  0.00  ││  1.92  │
//!   └────────┘ └────────┘ └────────┘     └────────┘└────────┘└────────┘
//!          offset = midpoint(min, max) = (1920, 0)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use virtual_monitors::headless::HeadlessScene;
//! use virtual_monitors::multimon::{
//!     DisplayOrder, DisplayRecord, MonitorManager, MultiMonitorConfig, StaticEnumerator,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let displays = vec![
//!     DisplayRecord::new("DISPLAY1", 0, 0).with_size(1920, 1080),
//!     DisplayRecord::new("DISPLAY2", 1920, 0).with_size(1920, 1080),
//! ];
//! let scene = HeadlessScene::new(displays.clone(), 2);
//! let enumerator = Box::new(StaticEnumerator::new(displays));
//!
//! let mut manager = MonitorManager::new(
//!     MultiMonitorConfig::default(),
//!     enumerator,
//!     DisplayOrder::Enumeration,
//!     scene,
//! );
//! manager.activate()?;
//!
//! for _ in 0..10 {
//!     let report = manager.tick()?;
//!     println!("frame {}: {:?}", report.frame, report.outcome);
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod display;
mod layout;
mod manager;
mod mapper;
mod reconcile;
mod registry;

pub use backend::{CaptureState, SceneBackend, SlotParams};
pub use display::{platform_enumerator, DisplayEnumerator, DisplayRecord, StaticEnumerator};
pub use layout::{DisplayOrder, LayoutModel, LayoutSnapshot};
pub use manager::{MonitorManager, MultiMonitorConfig, SlotMode, TickReport};
pub use mapper::{CoordinateMapper, Placement, ScenePosition, SizeCompensation};
pub use reconcile::{IdentityReconciler, ReconcileOutcome};
pub use registry::{ScreenRegistry, ScreenSlot};

#[cfg(test)]
pub(crate) use display::MockDisplayEnumerator;

use thiserror::Error;

/// Multi-monitor result type
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Multi-monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Display enumeration failed
    #[error("Display enumeration failed: {0}")]
    Enumeration(String),

    /// Scene backend could not create or drive a screen object
    #[error("Scene backend error: {0}")]
    Backend(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid display description (e.g. from the command line)
    #[error("Invalid display description '{0}': expected NAME:X:Y[:WxH]")]
    InvalidDisplay(String),

    /// Manager used before `activate()`
    #[error("Monitor manager is not active")]
    NotActive,
}
