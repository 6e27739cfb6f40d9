//! Tick Metrics
//!
//! Counters, gauges and histograms for the per-frame loop:
//! - ticks run and rematch passes triggered
//! - slots relabelled and positioned
//! - displays discovered per rescan
//! - tick duration
//!
//! Histograms keep an exact count/sum/min/max over their whole lifetime but
//! compute spread and percentiles over a bounded window of recent samples,
//! since a frame loop records one sample per frame indefinitely.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant, SystemTime};

/// Number of recent samples kept per histogram for percentile estimates
pub const HISTOGRAM_WINDOW: usize = 1024;

/// Thread-safe metrics collector
///
/// Shared behind an `Arc` between the tick loop and whoever reports.
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, u64>>,
    gauges: RwLock<HashMap<String, f64>>,
    histograms: RwLock<HashMap<String, Histogram>>,
    start_time: Instant,
}

impl MetricsCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            gauges: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Add `value` to a counter
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut counters = self.counters.write();
        *counters.entry(name.to_string()).or_insert(0) += value;
    }

    /// Set a gauge
    pub fn set_gauge(&self, name: &str, value: f64) {
        self.gauges.write().insert(name.to_string(), value);
    }

    /// Record one histogram observation
    pub fn record_histogram(&self, name: &str, value: f64) {
        let mut histograms = self.histograms.write();
        histograms
            .entry(name.to_string())
            .or_insert_with(Histogram::new)
            .record(value);
    }

    /// Counter value, `None` if never incremented
    pub fn get_counter(&self, name: &str) -> Option<u64> {
        self.counters.read().get(name).copied()
    }

    /// Gauge value, `None` if never set
    pub fn get_gauge(&self, name: &str) -> Option<f64> {
        self.gauges.read().get(name).copied()
    }

    /// Histogram statistics, `None` if nothing recorded
    pub fn get_histogram(&self, name: &str) -> Option<HistogramStats> {
        self.histograms.read().get(name).map(|h| h.stats())
    }

    /// Point-in-time copy of everything
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: SystemTime::now(),
            uptime: self.start_time.elapsed(),
            counters: self.counters.read().clone(),
            gauges: self.gauges.read().clone(),
            histograms: self
                .histograms
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.stats()))
                .collect(),
        }
    }

    /// Export a snapshot as pretty JSON
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

struct Histogram {
    recent: VecDeque<f64>,
    count: u64,
    min: f64,
    max: f64,
    sum: f64,
}

impl Histogram {
    fn new() -> Self {
        Self {
            recent: VecDeque::with_capacity(HISTOGRAM_WINDOW),
            count: 0,
            min: f64::MAX,
            max: f64::MIN,
            sum: 0.0,
        }
    }

    fn record(&mut self, value: f64) {
        if self.recent.len() == HISTOGRAM_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(value);
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
    }

    fn stats(&self) -> HistogramStats {
        if self.count == 0 {
            return HistogramStats::default();
        }

        let mean = self.sum / self.count as f64;

        let window_mean = self.recent.iter().sum::<f64>() / self.recent.len() as f64;
        let variance = self
            .recent
            .iter()
            .map(|v| {
                let diff = v - window_mean;
                diff * diff
            })
            .sum::<f64>()
            / self.recent.len() as f64;

        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        HistogramStats {
            count: self.count,
            sum: self.sum,
            min: self.min,
            max: self.max,
            mean,
            stddev: variance.sqrt(),
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            p99: percentile(&sorted, 0.99),
        }
    }
}

/// Inclusive percentile over sorted values (lower interpolation)
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let index = ((sorted_values.len() - 1) as f64 * p) as usize;
    sorted_values[index.min(sorted_values.len() - 1)]
}

/// Histogram statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramStats {
    /// Observations over the histogram's lifetime
    pub count: u64,
    /// Sum over the lifetime
    pub sum: f64,
    /// Minimum over the lifetime
    pub min: f64,
    /// Maximum over the lifetime
    pub max: f64,
    /// Lifetime mean
    pub mean: f64,
    /// Standard deviation over the recent window
    pub stddev: f64,
    /// Median over the recent window
    pub p50: f64,
    /// 95th percentile over the recent window
    pub p95: f64,
    /// 99th percentile over the recent window
    pub p99: f64,
}

/// Point-in-time snapshot of all collected metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// When this snapshot was taken
    pub timestamp: SystemTime,
    /// Time since the collector was created
    pub uptime: Duration,
    /// Counter values
    pub counters: HashMap<String, u64>,
    /// Gauge values
    pub gauges: HashMap<String, f64>,
    /// Histogram statistics
    pub histograms: HashMap<String, HistogramStats>,
}

pub mod metric_names {
    //! Metric names used by the monitor manager.

    /// Ticks run
    pub const TICKS: &str = "ticks_total";
    /// Ticks that found drift and ran a rematch pass
    pub const REMATCHES: &str = "rematches_total";
    /// Slot labels rewritten by rematch passes
    pub const RELABELLED_SLOTS: &str = "relabelled_slots_total";
    /// Slots positioned on the last tick
    pub const SLOTS_POSITIONED: &str = "slots_positioned";
    /// Tick duration histogram (milliseconds)
    pub const TICK_TIME_MS: &str = "tick_time_ms";

    /// Display rescans performed
    pub const RESCANS: &str = "rescans_total";
    /// Displays found by the last rescan
    pub const DISPLAYS_DISCOVERED: &str = "displays_discovered";
    /// Live screen slots after the last rescan
    pub const SLOTS_ACTIVE: &str = "slots_active";
}

/// Wall-clock timer for histogram samples
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
