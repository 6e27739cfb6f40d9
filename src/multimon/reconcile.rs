//! Identity Reconciliation
//!
//! Each slot's capture backend resolves its display by name, independently
//! and asynchronously, and may show the wrong display (or none) for a while
//! after creation. This module binds every slot to a snapshot record using
//! name equality, with a deterministic fallback when names do not match.
//!
//! # Algorithm
//!
//! ```text
//! for record i in snapshot order:
//!     slot = first unclaimed slot (creation order) with current_name == record[i].name
//!         or first unclaimed slot (creation order)
//!     slot.claimed = true; slot.bound_record = i
//!     slot.label  = slot.current_name
//! ```
//!
//! The O(n²) pass only runs when some slot drifted (label differs from the
//! resolved name) or bindings are incomplete; otherwise a tick costs O(n).

use tracing::{debug, trace};

use crate::multimon::display::DisplayRecord;
use crate::multimon::registry::ScreenSlot;

/// Result of one reconciliation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing drifted, bindings untouched
    Stable,

    /// A full re-match ran
    Rematched {
        /// Slots whose label changed
        relabelled: usize,
    },
}

/// Binds slots to layout records
pub struct IdentityReconciler;

impl IdentityReconciler {
    /// Run one tick: reset claims, then re-match only if needed
    pub fn reconcile<H>(slots: &mut [ScreenSlot<H>], records: &[DisplayRecord]) -> ReconcileOutcome {
        for slot in slots.iter_mut() {
            slot.claimed = false;
        }

        if Self::is_stable(slots, records) {
            trace!("Slot identities stable");
            return ReconcileOutcome::Stable;
        }

        Self::rematch(slots, records)
    }

    /// True when no slot drifted and every slot that can be bound is bound to
    /// a record that still exists
    ///
    /// A freshly created slot is unbound, so it always triggers a re-match.
    pub fn is_stable<H>(slots: &[ScreenSlot<H>], records: &[DisplayRecord]) -> bool {
        if slots.iter().any(|s| s.has_drifted()) {
            return false;
        }

        let mut bound = 0;
        for slot in slots {
            match slot.bound_record {
                Some(k) if k >= records.len() => return false,
                Some(_) => bound += 1,
                None => {}
            }
        }

        bound == slots.len().min(records.len())
    }

    /// Full O(n²) re-match
    pub fn rematch<H>(slots: &mut [ScreenSlot<H>], records: &[DisplayRecord]) -> ReconcileOutcome {
        for slot in slots.iter_mut() {
            slot.claimed = false;
        }

        let mut relabelled = 0;

        for (index, record) in records.iter().enumerate() {
            let exact = slots
                .iter()
                .position(|s| !s.claimed && s.current_name() == Some(record.name.as_str()));
            let pick = exact.or_else(|| slots.iter().position(|s| !s.claimed));

            let Some(pos) = pick else {
                // More records than slots
                trace!("No slot left for record {} ({})", index, record.name);
                continue;
            };

            let slot = &mut slots[pos];
            slot.claimed = true;
            if slot.bound_record != Some(index) {
                debug!(
                    "Slot {} -> record {} ({}){}",
                    slot.logical_index(),
                    index,
                    record.name,
                    if exact.is_some() { "" } else { " [fallback]" }
                );
            }
            slot.bound_record = Some(index);

            if slot.has_drifted() {
                slot.label = slot.current_name().map(str::to_owned);
                relabelled += 1;
            }
        }

        // Surplus slots: no record, but accept their name so they stop
        // reporting drift every frame
        for slot in slots.iter_mut().filter(|s| !s.claimed) {
            slot.bound_record = None;
            if slot.has_drifted() {
                slot.label = slot.current_name().map(str::to_owned);
                relabelled += 1;
            }
        }

        debug!("Re-matched {} slots, {} relabelled", slots.len(), relabelled);
        ReconcileOutcome::Rematched { relabelled }
    }
}
