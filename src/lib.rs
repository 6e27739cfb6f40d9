//! # virtual-monitors
//!
//! Places virtual copies of the user's physical monitors into a 3D scene and
//! keeps each screen's position and captured content lined up with the real
//! display layout reported by the OS.
//!
//! The OS gives displays no persistent identity and enumerates them in no
//! particular order, and enumeration is too expensive to run every frame.
//! This crate therefore enumerates once per activation, caches the layout,
//! and matches rendered screens back to layout records by captured display
//! name on every frame.
//!
//! # Architecture
//!
//! ```text
//! virtual-monitors
//!   ├─> LayoutModel      (cached enumeration + centering offset)
//!   ├─> ScreenRegistry   (scene objects, one per slot)
//!   ├─> IdentityReconciler (slot ↔ record matching by name)
//!   ├─> CoordinateMapper (pixels → scene units)
//!   └─> MonitorManager   (owns the above, runs activate/tick)
//! ```
//!
//! The 3D engine and texture capture sit behind
//! [`multimon::SceneBackend`]; [`headless::HeadlessScene`] is an in-process
//! implementation used by the binary (through [`headless::HeadlessRunner`])
//! and the tests. Virtual display drivers
//! are controlled through [`driver`].
//!
//! # Data Flow
//!
//! **Activation:** DisplayEnumerator → LayoutSnapshot → ScreenRegistry::sync
//!
//! **Per frame:** configure slots → poll capture → reconcile → position

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration file handling
pub mod config;

/// Virtual display driver control
pub mod driver;

/// In-process scene and capture backend
pub mod headless;

/// Display discovery, identity reconciliation and placement
pub mod multimon;

/// Diagnostics, metrics and error formatting
pub mod utils;
