//! Headless Scene Backend
//!
//! In-process stand-in for the 3D engine and the texture-capture backend.
//! It keeps no pixels, only the bookkeeping the core interacts with:
//!
//! - objects created/destroyed through [`SceneBackend`]
//! - each object's capture target, resolved by logical index through the
//!   backend's *own* desktop ordering, which need not match the OS
//!   enumeration order
//! - a settle delay: an object reports no display for its first
//!   `settle_frames` configure calls, like a real capture that has not
//!   produced its first frame yet
//!
//! [`HeadlessRunner`] pairs the scene with a [`MonitorManager`] and keeps the
//! captured display set equal to the manager's latest snapshot, so the
//! capture side follows hot-plug re-scans. Used by the `virtual-monitors`
//! binary and by tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::multimon::{
    CaptureState, DisplayEnumerator, DisplayOrder, DisplayRecord, MonitorError, MonitorManager,
    MultiMonitorConfig, Result, SceneBackend, ScenePosition, SlotParams, TickReport,
};
use crate::utils::metrics::MetricsCollector;

/// Handle to a headless scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

#[derive(Debug)]
struct SceneObject {
    params: SlotParams,
    frames: u32,
    position: Option<ScenePosition>,
}

/// Scene + capture simulation
#[derive(Debug)]
pub struct HeadlessScene {
    displays: Vec<DisplayRecord>,
    capture_order: Vec<usize>,
    settle_frames: u32,
    object_limit: Option<usize>,
    objects: BTreeMap<ObjectId, SceneObject>,
    next_id: u64,
    destroyed: Vec<usize>,
}

impl HeadlessScene {
    /// Create a scene capturing `displays`; desktop `i` is `displays[i]`
    pub fn new(displays: Vec<DisplayRecord>, settle_frames: u32) -> Self {
        let capture_order = (0..displays.len()).collect();
        Self {
            displays,
            capture_order,
            settle_frames,
            object_limit: None,
            objects: BTreeMap::new(),
            next_id: 1,
            destroyed: Vec::new(),
        }
    }

    /// Use a different desktop ordering: desktop `i` is
    /// `displays[order[i]]`
    pub fn with_capture_order(mut self, order: Vec<usize>) -> Self {
        self.capture_order = order;
        self
    }

    /// Fail instantiation once `limit` objects are alive
    pub fn with_object_limit(mut self, limit: usize) -> Self {
        self.object_limit = Some(limit);
        self
    }

    /// Replace the captured display set (hot-plug); resets the ordering to
    /// identity
    pub fn set_displays(&mut self, displays: Vec<DisplayRecord>) {
        debug!("Headless scene now capturing {} displays", displays.len());
        self.capture_order = (0..displays.len()).collect();
        self.displays = displays;
    }

    /// Live object count
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Logical indices of destroyed objects, in destruction order
    pub fn destroyed_indices(&self) -> &[usize] {
        &self.destroyed
    }

    /// Last position of the object with `logical_index`
    pub fn position_of(&self, logical_index: usize) -> Option<ScenePosition> {
        self.objects
            .values()
            .find(|o| o.params.logical_index == logical_index)
            .and_then(|o| o.position)
    }

    /// `(logical_index, captured name, position)` for every live object
    pub fn placements(&self) -> Vec<(usize, Option<String>, Option<ScenePosition>)> {
        self.objects
            .values()
            .map(|o| {
                let name = self.captured(o).map(|d| d.name.clone());
                (o.params.logical_index, name, o.position)
            })
            .collect()
    }

    fn captured(&self, object: &SceneObject) -> Option<&DisplayRecord> {
        if object.frames <= self.settle_frames {
            return None;
        }
        let display = *self.capture_order.get(object.params.logical_index)?;
        self.displays.get(display)
    }
}

impl SceneBackend for HeadlessScene {
    type Handle = ObjectId;

    fn instantiate(&mut self, params: &SlotParams) -> Result<ObjectId> {
        if let Some(limit) = self.object_limit {
            if self.objects.len() >= limit {
                return Err(MonitorError::Backend(format!(
                    "object limit {} reached",
                    limit
                )));
            }
        }

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            SceneObject {
                params: *params,
                frames: 0,
                position: None,
            },
        );
        trace!("Instantiated {:?} for desktop {}", id, params.logical_index);
        Ok(id)
    }

    fn destroy(&mut self, handle: ObjectId) {
        if let Some(object) = self.objects.remove(&handle) {
            trace!("Destroyed {:?}", handle);
            self.destroyed.push(object.params.logical_index);
        }
    }

    fn configure(&mut self, handle: &ObjectId, params: &SlotParams) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.params = *params;
            object.frames = object.frames.saturating_add(1);
        }
    }

    fn capture_state(&self, handle: &ObjectId) -> CaptureState {
        let Some(object) = self.objects.get(handle) else {
            return CaptureState::default();
        };
        let Some(display) = self.captured(object) else {
            return CaptureState::default();
        };

        let px_to_unit = object.params.scale_factor / 1000.0;
        CaptureState {
            resolved_name: Some(display.name.clone()),
            reported_width: display.width,
            reported_height: display.height,
            rendered_width: display.width as f32 * px_to_unit,
            rendered_height: display.height as f32 * px_to_unit,
        }
    }

    fn set_position(&mut self, handle: &ObjectId, position: ScenePosition) {
        if let Some(object) = self.objects.get_mut(handle) {
            object.position = Some(position);
        }
    }
}

/// Manager driving a [`HeadlessScene`] that captures whatever the manager
/// last enumerated
///
/// The scene starts empty and is seeded from the snapshot after
/// activation and after every tick that ran a re-scan. Enumeration happens
/// only inside the manager.
pub struct HeadlessRunner {
    manager: MonitorManager<HeadlessScene>,
}

impl HeadlessRunner {
    /// Create a runner; nothing is enumerated until [`HeadlessRunner::start`]
    pub fn new(
        config: MultiMonitorConfig,
        enumerator: Box<dyn DisplayEnumerator>,
        order: DisplayOrder,
        settle_frames: u32,
    ) -> Self {
        let scene = HeadlessScene::new(Vec::new(), settle_frames);
        Self {
            manager: MonitorManager::new(config, enumerator, order, scene),
        }
    }

    /// Record tick statistics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.manager = self.manager.with_metrics(metrics);
        self
    }

    /// Activate the manager and point the capture side at the snapshot
    pub fn start(&mut self) -> Result<()> {
        self.manager.activate()?;
        self.sync_capture();
        Ok(())
    }

    /// Run one frame
    pub fn tick(&mut self) -> Result<TickReport> {
        let report = self.manager.tick()?;
        if report.rescanned {
            self.sync_capture();
        }
        Ok(report)
    }

    /// Re-scan at the start of the next tick
    pub fn request_rescan(&mut self) {
        self.manager.request_rescan();
    }

    /// The wrapped manager
    pub fn manager(&self) -> &MonitorManager<HeadlessScene> {
        &self.manager
    }

    /// Destroy every scene object
    pub fn shutdown(&mut self) {
        self.manager.shutdown();
    }

    fn sync_capture(&mut self) {
        let records = self.manager.snapshot().records().to_vec();
        info!("Capturing {} display(s)", records.len());
        self.manager.backend_mut().set_displays(records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multimon::MockDisplayEnumerator;

    fn params(index: usize) -> SlotParams {
        SlotParams {
            logical_index: index,
            scale_factor: 1.0,
        }
    }

    fn displays() -> Vec<DisplayRecord> {
        vec![
            DisplayRecord::new("A", 0, 0).with_size(1920, 1080),
            DisplayRecord::new("B", 1920, 0).with_size(2560, 1440),
        ]
    }

    #[test]
    fn test_resolves_after_settle_frames() {
        let mut scene = HeadlessScene::new(displays(), 2);
        let id = scene.instantiate(&params(0)).unwrap();

        for _ in 0..2 {
            scene.configure(&id, &params(0));
            assert_eq!(scene.capture_state(&id).resolved_name, None);
        }

        scene.configure(&id, &params(0));
        assert_eq!(scene.capture_state(&id).resolved_name.as_deref(), Some("A"));
    }

    #[test]
    fn test_capture_order_maps_desktops() {
        let mut scene = HeadlessScene::new(displays(), 0).with_capture_order(vec![1, 0]);
        let id = scene.instantiate(&params(0)).unwrap();
        scene.configure(&id, &params(0));

        let state = scene.capture_state(&id);
        assert_eq!(state.resolved_name.as_deref(), Some("B"));
        assert_eq!((state.reported_width, state.reported_height), (2560, 1440));
        assert!((state.rendered_width - 2.56).abs() < 1e-5);
    }

    #[test]
    fn test_desktop_out_of_range_never_resolves() {
        let mut scene = HeadlessScene::new(displays(), 0);
        let id = scene.instantiate(&params(5)).unwrap();
        scene.configure(&id, &params(5));
        assert_eq!(scene.capture_state(&id), CaptureState::default());
    }

    #[test]
    fn test_object_limit() {
        let mut scene = HeadlessScene::new(displays(), 0).with_object_limit(1);
        assert!(scene.instantiate(&params(0)).is_ok());
        assert!(matches!(
            scene.instantiate(&params(1)),
            Err(MonitorError::Backend(_))
        ));
    }

    #[test]
    fn test_destroy_records_index() {
        let mut scene = HeadlessScene::new(displays(), 0);
        let a = scene.instantiate(&params(0)).unwrap();
        let b = scene.instantiate(&params(1)).unwrap();
        scene.destroy(b);
        scene.destroy(a);

        assert_eq!(scene.object_count(), 0);
        assert_eq!(scene.destroyed_indices(), [1, 0]);
    }

    // =========================================================================
    // HeadlessRunner
    // =========================================================================

    #[test]
    fn test_runner_resolves_slots_from_snapshot() {
        let mut enumerator = MockDisplayEnumerator::new();
        enumerator
            .expect_list_displays()
            .times(1)
            .returning(|| Ok(displays()));

        let mut runner = HeadlessRunner::new(
            MultiMonitorConfig::default(),
            Box::new(enumerator),
            DisplayOrder::Enumeration,
            1,
        );
        runner.start().unwrap();
        for _ in 0..4 {
            runner.tick().unwrap();
        }

        let slots = runner.manager().slots();
        assert_eq!(slots[0].current_name(), Some("A"));
        assert_eq!(slots[1].current_name(), Some("B"));
        assert_eq!(runner.manager().backend().position_of(1), slots[1].position());
        assert_eq!(runner.manager().layout().scan_count(), 1);
    }

    #[test]
    fn test_runner_follows_removed_display_after_rescan() {
        let mut enumerator = MockDisplayEnumerator::new();
        let mut seq = mockall::Sequence::new();
        enumerator
            .expect_list_displays()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(displays()));
        enumerator
            .expect_list_displays()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![DisplayRecord::new("B", 1920, 0).with_size(2560, 1440)]));

        let mut runner = HeadlessRunner::new(
            MultiMonitorConfig::default(),
            Box::new(enumerator),
            DisplayOrder::Enumeration,
            0,
        );
        runner.start().unwrap();
        runner.tick().unwrap();
        assert_eq!(runner.manager().slots()[0].current_name(), Some("A"));

        runner.request_rescan();
        assert!(runner.tick().unwrap().rescanned);
        for _ in 0..4 {
            runner.tick().unwrap();
        }

        let slots = runner.manager().slots();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].current_name(), Some("B"));
        assert_eq!(slots[0].label(), Some("B"));
        assert_eq!(slots[0].bound_record(), Some(0));

        let placements = runner.manager().backend().placements();
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].1.as_deref(), Some("B"));
        assert!(placements[0].2.unwrap().x.abs() < 1e-5);
    }
}
