//! Layout Model
//!
//! Caches the result of the (expensive) display enumeration and derives the
//! centering offset shared by every coordinate conversion.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::multimon::display::{DisplayEnumerator, DisplayRecord};

/// Ordering applied to enumerated displays before they become a snapshot
///
/// The OS returns displays in no particular order; the reconciler binds slots
/// in snapshot order, so the order is made explicit here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayOrder {
    /// Keep the order the enumerator returned
    #[default]
    Enumeration,

    /// Sort by display name, descending (stable for equal names)
    NameDescending,

    /// Sort left to right, then top to bottom
    Position,
}

impl DisplayOrder {
    fn apply(self, records: &mut [DisplayRecord]) {
        match self {
            DisplayOrder::Enumeration => {}
            DisplayOrder::NameDescending => records.sort_by(|a, b| b.name.cmp(&a.name)),
            DisplayOrder::Position => records.sort_by_key(|r| (r.x, r.y)),
        }
    }
}

/// Immutable result of one discovery pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutSnapshot {
    records: Vec<DisplayRecord>,
    offset: (i32, i32),
}

impl LayoutSnapshot {
    /// Build a snapshot from records already in the desired order
    pub fn new(records: Vec<DisplayRecord>) -> Self {
        let offset = calculate_offset(&records);
        Self { records, offset }
    }

    /// Build a snapshot from raw enumeration output
    pub fn from_enumeration(mut records: Vec<DisplayRecord>, order: DisplayOrder) -> Self {
        order.apply(&mut records);
        Self::new(records)
    }

    /// Records in snapshot order
    pub fn records(&self) -> &[DisplayRecord] {
        &self.records
    }

    /// Record at snapshot index `index`
    pub fn record(&self, index: usize) -> Option<&DisplayRecord> {
        self.records.get(index)
    }

    /// Number of displays
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no displays were discovered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Centering offset in pixels: midpoint of the min/max top-left corner on
    /// each axis. `(0, 0)` for an empty snapshot.
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Offset pre-multiplied by `scale`, so it can be subtracted directly from
    /// a position scaled by the same factor
    pub fn offset_for(&self, scale: f32) -> (f32, f32) {
        (self.offset.0 as f32 * scale, self.offset.1 as f32 * scale)
    }

    /// `(min_x, min_y, max_x, max_y)` over the records' top-left corners
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        calculate_bounds(&self.records)
    }
}

/// Owns the enumerator and the cached snapshot
pub struct LayoutModel {
    enumerator: Box<dyn DisplayEnumerator>,
    order: DisplayOrder,
    snapshot: LayoutSnapshot,
    scans: u64,
}

impl LayoutModel {
    /// Create a model. No enumeration happens until [`LayoutModel::rescan`].
    pub fn new(enumerator: Box<dyn DisplayEnumerator>, order: DisplayOrder) -> Self {
        Self {
            enumerator,
            order,
            snapshot: LayoutSnapshot::default(),
            scans: 0,
        }
    }

    /// Enumerate displays exactly once and replace the cached snapshot
    ///
    /// An enumeration failure is logged and treated like zero displays.
    pub fn rescan(&mut self) -> &LayoutSnapshot {
        self.scans += 1;

        let records = match self.enumerator.list_displays() {
            Ok(records) => records,
            Err(e) => {
                warn!("Display enumeration failed, continuing with no displays: {}", e);
                Vec::new()
            }
        };

        self.snapshot = LayoutSnapshot::from_enumeration(records, self.order);

        info!(
            "Discovered {} displays (scan #{}, offset {:?})",
            self.snapshot.len(),
            self.scans,
            self.snapshot.offset()
        );
        for (idx, record) in self.snapshot.records().iter().enumerate() {
            debug!("  [{}] {}", idx, record);
        }

        &self.snapshot
    }

    /// The cached snapshot (empty before the first scan)
    pub fn snapshot(&self) -> &LayoutSnapshot {
        &self.snapshot
    }

    /// Cached offset scaled by `scale`
    pub fn offset_for(&self, scale: f32) -> (f32, f32) {
        self.snapshot.offset_for(scale)
    }

    /// Number of enumeration calls made so far
    pub fn scan_count(&self) -> u64 {
        self.scans
    }

    /// Ordering applied to each scan
    pub fn order(&self) -> DisplayOrder {
        self.order
    }
}

fn calculate_bounds(records: &[DisplayRecord]) -> Option<(i32, i32, i32, i32)> {
    let first = records.first()?;
    let mut bounds = (first.x, first.y, first.x, first.y);

    for record in &records[1..] {
        bounds.0 = bounds.0.min(record.x);
        bounds.1 = bounds.1.min(record.y);
        bounds.2 = bounds.2.max(record.x);
        bounds.3 = bounds.3.max(record.y);
    }

    Some(bounds)
}

fn calculate_offset(records: &[DisplayRecord]) -> (i32, i32) {
    match calculate_bounds(records) {
        // Widened so extreme coordinates cannot overflow; `/` truncates toward zero
        Some((min_x, min_y, max_x, max_y)) => (
            ((min_x as i64 + max_x as i64) / 2) as i32,
            ((min_y as i64 + max_y as i64) / 2) as i32,
        ),
        None => (0, 0),
    }
}
