//! Screen Registry
//!
//! Owns the rendered screen objects. Slots are kept in creation order, which
//! is also the iteration order the reconciler's fallback relies on.

use tracing::{debug, info, warn};

use crate::multimon::backend::{CaptureState, SceneBackend, SlotParams};
use crate::multimon::mapper::{ScenePosition, SizeCompensation};
use crate::multimon::Result;

/// One rendered screen object and its identity bookkeeping
#[derive(Debug)]
pub struct ScreenSlot<H> {
    handle: H,
    logical_index: usize,
    pub(super) bound_record: Option<usize>,
    pub(super) claimed: bool,
    pub(super) label: Option<String>,
    current_name: Option<String>,
    compensation: Option<SizeCompensation>,
    position: Option<ScenePosition>,
}

impl<H> ScreenSlot<H> {
    /// Fresh slot: unclaimed, unbound, unlabelled
    pub fn new(handle: H, logical_index: usize) -> Self {
        Self {
            handle,
            logical_index,
            bound_record: None,
            claimed: false,
            label: None,
            current_name: None,
            compensation: None,
            position: None,
        }
    }

    /// Record what the capture backend currently resolves for this slot
    pub fn observe(&mut self, state: CaptureState) {
        self.compensation = state.size_compensation();
        self.current_name = state.resolved_name;
    }

    /// Scene-object handle
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Sequential index assigned at creation
    pub fn logical_index(&self) -> usize {
        self.logical_index
    }

    /// Snapshot index this slot represents
    pub fn bound_record(&self) -> Option<usize> {
        self.bound_record
    }

    /// Claimed during the last reconciliation pass
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Persisted identity label (last accepted resolved name)
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Name the capture backend resolved on the last poll
    pub fn current_name(&self) -> Option<&str> {
        self.current_name.as_deref()
    }

    /// True when the label no longer matches the resolved name
    pub fn has_drifted(&self) -> bool {
        self.label != self.current_name
    }

    /// Size compensation inputs from the last poll
    pub fn compensation(&self) -> Option<&SizeCompensation> {
        self.compensation.as_ref()
    }

    /// Last position pushed to the scene
    pub fn position(&self) -> Option<ScenePosition> {
        self.position
    }
}

/// Collection of screen slots backed by a [`SceneBackend`]
pub struct ScreenRegistry<B: SceneBackend> {
    backend: B,
    slots: Vec<ScreenSlot<B::Handle>>,
}

impl<B: SceneBackend> ScreenRegistry<B> {
    /// Create an empty registry
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            slots: Vec::new(),
        }
    }

    /// Grow or shrink to exactly `desired` slots
    ///
    /// New slots get the next sequential logical index. Surplus slots are
    /// destroyed from the end, i.e. highest logical index first.
    ///
    /// # Errors
    ///
    /// Returns the backend error if an object cannot be instantiated; slots
    /// created before the failure are kept.
    pub fn sync(&mut self, desired: usize, scale_factor: f32) -> Result<()> {
        let before = self.slots.len();

        while self.slots.len() > desired {
            if let Some(slot) = self.slots.pop() {
                debug!("Destroying screen slot {}", slot.logical_index);
                self.backend.destroy(slot.handle);
            }
        }

        while self.slots.len() < desired {
            let params = SlotParams {
                logical_index: self.slots.len(),
                scale_factor,
            };
            let handle = self.backend.instantiate(&params)?;
            debug!("Created screen slot {}", params.logical_index);
            self.slots.push(ScreenSlot::new(handle, params.logical_index));
        }

        if before != desired {
            info!("Screen slots: {} -> {}", before, desired);
        }

        Ok(())
    }

    /// Re-send `{ logical_index, scale_factor }` to every slot
    pub fn refresh_parameters(&mut self, scale_factor: f32) {
        for slot in &self.slots {
            let params = SlotParams {
                logical_index: slot.logical_index,
                scale_factor,
            };
            self.backend.configure(&slot.handle, &params);
        }
    }

    /// Read back every slot's capture state
    pub fn poll_capture(&mut self) {
        for slot in &mut self.slots {
            let state = self.backend.capture_state(&slot.handle);
            slot.observe(state);
        }
    }

    /// Push positions computed by `place`; slots for which it returns `None`
    /// are left where they are. Returns the number of slots moved.
    pub fn apply_positions<F>(&mut self, mut place: F) -> usize
    where
        F: FnMut(&ScreenSlot<B::Handle>) -> Option<ScenePosition>,
    {
        let mut moved = 0;
        for slot in &mut self.slots {
            if let Some(position) = place(&*slot) {
                self.backend.set_position(&slot.handle, position);
                slot.position = Some(position);
                moved += 1;
            }
        }
        moved
    }

    /// Forget every binding and label so the next tick re-matches from scratch
    pub fn unbind_all(&mut self) {
        for slot in &mut self.slots {
            slot.bound_record = None;
            slot.claimed = false;
            slot.label = None;
        }
    }

    /// Destroy every slot
    pub fn clear(&mut self) {
        if !self.slots.is_empty() {
            info!("Destroying all {} screen slots", self.slots.len());
        }
        for slot in self.slots.drain(..).rev() {
            self.backend.destroy(slot.handle);
        }
    }

    /// Slots in creation order
    pub fn slots(&self) -> &[ScreenSlot<B::Handle>] {
        &self.slots
    }

    pub(super) fn slots_mut(&mut self) -> &mut [ScreenSlot<B::Handle>] {
        &mut self.slots
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when there are no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The scene backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The scene backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: SceneBackend> Drop for ScreenRegistry<B> {
    fn drop(&mut self) {
        if !self.slots.is_empty() {
            warn!(
                "Screen registry dropped with {} live slots, releasing them",
                self.slots.len()
            );
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessScene;
    use crate::multimon::DisplayRecord;

    fn scene() -> HeadlessScene {
        HeadlessScene::new(
            vec![
                DisplayRecord::new("A", 0, 0).with_size(1920, 1080),
                DisplayRecord::new("B", 1920, 0).with_size(1920, 1080),
            ],
            0,
        )
    }

    #[test]
    fn test_sync_grows_with_sequential_indices() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(3, 1.0).unwrap();

        let indices: Vec<_> = registry.slots().iter().map(|s| s.logical_index()).collect();
        assert_eq!(indices, [0, 1, 2]);
        assert_eq!(registry.backend().object_count(), 3);

        for slot in registry.slots() {
            assert!(!slot.is_claimed());
            assert_eq!(slot.bound_record(), None);
            assert_eq!(slot.label(), None);
        }
    }

    #[test]
    fn test_sync_shrinks_from_the_end() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(5, 1.0).unwrap();
        registry.sync(2, 1.0).unwrap();

        let indices: Vec<_> = registry.slots().iter().map(|s| s.logical_index()).collect();
        assert_eq!(indices, [0, 1]);
        assert_eq!(registry.backend().object_count(), 2);

        let mut destroyed = registry.backend().destroyed_indices().to_vec();
        destroyed.sort_unstable();
        assert_eq!(destroyed, [2, 3, 4]);
    }

    #[test]
    fn test_sync_regrow_reuses_next_index() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(3, 1.0).unwrap();
        registry.sync(1, 1.0).unwrap();
        registry.sync(2, 1.0).unwrap();

        let indices: Vec<_> = registry.slots().iter().map(|s| s.logical_index()).collect();
        assert_eq!(indices, [0, 1]);
    }

    #[test]
    fn test_sync_zero_is_empty() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(0, 1.0).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.backend().object_count(), 0);
    }

    #[test]
    fn test_poll_capture_reads_names() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(2, 1.0).unwrap();
        registry.refresh_parameters(1.0);
        registry.poll_capture();

        let names: Vec<_> = registry.slots().iter().map(|s| s.current_name()).collect();
        assert_eq!(names, [Some("A"), Some("B")]);
        assert!(registry.slots().iter().all(|s| s.has_drifted()));
    }

    #[test]
    fn test_apply_positions_skips_none() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(2, 1.0).unwrap();

        let moved = registry.apply_positions(|slot| {
            (slot.logical_index() == 1).then_some(ScenePosition {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            })
        });

        assert_eq!(moved, 1);
        assert_eq!(registry.slots()[0].position(), None);
        assert_eq!(registry.slots()[1].position().map(|p| p.x), Some(1.0));
    }

    #[test]
    fn test_clear_destroys_everything() {
        let mut registry = ScreenRegistry::new(scene());
        registry.sync(3, 1.0).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.backend().object_count(), 0);
    }

    #[test]
    fn test_instantiate_failure_keeps_created_slots() {
        let mut registry = ScreenRegistry::new(scene().with_object_limit(2));
        assert!(registry.sync(4, 1.0).is_err());
        assert_eq!(registry.len(), 2);
    }
}
