//! Utility Functions and Diagnostics
//!
//! Startup diagnostics, tick metrics, and user-friendly error formatting.
//!
//! # Overview
//!
//! 1. **Diagnostics** - Host information and whether OS display enumeration
//!    is available on this build
//! 2. **Metrics** - Counters, gauges and histograms fed by the monitor
//!    manager each tick
//! 3. **Error Formatting** - Boxed fatal-error messages with likely causes
//!
//! ## Metrics
//!
//! ```rust
//! use std::sync::Arc;
//! use virtual_monitors::utils::{metric_names, MetricsCollector};
//!
//! let metrics = Arc::new(MetricsCollector::new());
//! metrics.increment_counter(metric_names::TICKS, 1);
//! metrics.record_histogram(metric_names::TICK_TIME_MS, 0.4);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.counters.get(metric_names::TICKS), Some(&1));
//! ```
//!
//! ## Error Formatting
//!
//! ```rust
//! use virtual_monitors::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Failed to parse config file");
//! eprintln!("{}", format_user_error(&error));
//! ```

pub mod diagnostics;
pub mod errors;
pub mod metrics;

pub use diagnostics::{log_startup_diagnostics, os_enumeration_available, SystemInfo};
pub use errors::format_user_error;
pub use metrics::{metric_names, HistogramStats, MetricsCollector, MetricsSnapshot, Timer};
