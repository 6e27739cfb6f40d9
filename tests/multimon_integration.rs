use std::collections::HashSet;

use virtual_monitors::headless::HeadlessScene;
use virtual_monitors::multimon::{
    DisplayOrder, DisplayRecord, MonitorError, MonitorManager, MultiMonitorConfig, Placement,
    ReconcileOutcome, ScreenRegistry, SlotMode, StaticEnumerator,
};

const EPS: f32 = 1e-5;

fn record(name: &str, x: i32, y: i32) -> DisplayRecord {
    DisplayRecord::new(name, x, y).with_size(1920, 1080)
}

fn manager(
    displays: Vec<DisplayRecord>,
    scene: HeadlessScene,
    config: MultiMonitorConfig,
) -> MonitorManager<HeadlessScene> {
    MonitorManager::new(
        config,
        Box::new(StaticEnumerator::new(displays)),
        DisplayOrder::Enumeration,
        scene,
    )
}

fn run(manager: &mut MonitorManager<HeadlessScene>, frames: usize) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::Stable;
    for _ in 0..frames {
        outcome = manager.tick().unwrap().outcome;
    }
    outcome
}

#[test]
fn test_bijection_with_shuffled_capture_order() {
    let displays = vec![
        record("DISPLAY1", 0, 0),
        record("DISPLAY2", 1920, 0),
        record("DISPLAY3", 3840, 0),
        record("DISPLAY4", 0, 1080),
    ];
    let order = vec![2, 0, 3, 1];
    let scene = HeadlessScene::new(displays.clone(), 2).with_capture_order(order.clone());
    let mut manager = manager(displays.clone(), scene, MultiMonitorConfig::default());
    manager.activate().unwrap();

    assert_eq!(run(&mut manager, 8), ReconcileOutcome::Stable);

    let bound: Vec<_> = manager.slots().iter().map(|s| s.bound_record()).collect();
    let unique: HashSet<_> = bound.iter().flatten().collect();
    assert_eq!(unique.len(), displays.len());

    for (slot, &shown) in manager.slots().iter().zip(&order) {
        assert_eq!(slot.bound_record(), Some(shown));
        assert_eq!(slot.label(), Some(displays[shown].name.as_str()));
    }
}

#[test]
fn test_second_pass_is_idempotent() {
    let displays = vec![record("A", 0, 0), record("B", 1920, 0)];
    let scene = HeadlessScene::new(displays.clone(), 0).with_capture_order(vec![1, 0]);
    let mut manager = manager(displays, scene, MultiMonitorConfig::default());
    manager.activate().unwrap();

    assert!(matches!(
        manager.tick().unwrap().outcome,
        ReconcileOutcome::Rematched { .. }
    ));
    let before: Vec<_> = manager.slots().iter().map(|s| s.bound_record()).collect();

    assert_eq!(manager.tick().unwrap().outcome, ReconcileOutcome::Stable);
    let after: Vec<_> = manager.slots().iter().map(|s| s.bound_record()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_middle_display_is_centered() {
    let displays = vec![
        record("LEFT", 0, 0),
        record("MIDDLE", 1920, 0),
        record("RIGHT", 3840, 0),
    ];
    let mut manager = manager(
        displays.clone(),
        HeadlessScene::new(displays, 0),
        MultiMonitorConfig::default(),
    );
    manager.activate().unwrap();
    run(&mut manager, 2);

    assert_eq!(manager.snapshot().offset(), (1920, 0));

    let x: Vec<f32> = manager
        .slots()
        .iter()
        .map(|s| s.position().unwrap().x)
        .collect();
    assert!((x[0] + 1.92).abs() < EPS);
    assert!(x[1].abs() < EPS);
    assert!((x[2] - 1.92).abs() < EPS);
}

#[test]
fn test_y_axis_is_inverted() {
    let displays = vec![record("TOP", 0, 0), record("BOTTOM", 0, 1080)];
    let mut manager = manager(
        displays.clone(),
        HeadlessScene::new(displays, 0),
        MultiMonitorConfig::default(),
    );
    manager.activate().unwrap();
    run(&mut manager, 2);

    let top = manager.slots()[0].position().unwrap();
    let bottom = manager.slots()[1].position().unwrap();
    assert!(top.y > bottom.y);
    assert!((top.y - 0.54).abs() < EPS);
    assert!((bottom.y + 0.54).abs() < EPS);
}

#[test]
fn test_duplicate_names_still_form_a_bijection() {
    let displays = vec![
        record("Generic PCI Monitor", 0, 0),
        record("Generic PCI Monitor", 1920, 0),
    ];
    let mut manager = manager(
        displays.clone(),
        HeadlessScene::new(displays, 0),
        MultiMonitorConfig::default(),
    );
    manager.activate().unwrap();

    run(&mut manager, 1);
    let bound: Vec<_> = manager.slots().iter().map(|s| s.bound_record()).collect();
    assert_eq!(bound, [Some(0), Some(1)]);

    assert_eq!(run(&mut manager, 3), ReconcileOutcome::Stable);
    let again: Vec<_> = manager.slots().iter().map(|s| s.bound_record()).collect();
    assert_eq!(bound, again);
}

#[test]
fn test_registry_shrinks_from_highest_index() {
    let mut registry = ScreenRegistry::new(HeadlessScene::new(Vec::new(), 0));
    registry.sync(5, 1.0).unwrap();
    registry.sync(2, 1.0).unwrap();

    let indices: Vec<_> = registry.slots().iter().map(|s| s.logical_index()).collect();
    assert_eq!(indices, [0, 1]);

    let mut destroyed = registry.backend().destroyed_indices().to_vec();
    destroyed.sort_unstable();
    assert_eq!(destroyed, [2, 3, 4]);
}

#[test]
fn test_zero_scale_is_rejected() {
    assert!(matches!(
        Placement::new(0.0, 0.0, 0.0),
        Err(MonitorError::InvalidConfiguration(_))
    ));
    assert!(Placement::new(-1.0, 0.0, 0.0).is_err());
    assert!(Placement::new(f32::NAN, 0.0, 0.0).is_err());
}

#[test]
fn test_fixed_zero_slots_is_rejected() {
    let config = MultiMonitorConfig {
        slot_mode: SlotMode::Fixed { count: 0 },
        ..MultiMonitorConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_no_displays_means_no_screens() {
    let mut manager = manager(
        Vec::new(),
        HeadlessScene::new(Vec::new(), 0),
        MultiMonitorConfig::default(),
    );
    manager.activate().unwrap();

    for _ in 0..3 {
        let report = manager.tick().unwrap();
        assert_eq!(report.positioned, 0);
    }
    assert_eq!(manager.backend().object_count(), 0);
}

#[test]
fn test_hot_plug_via_rescan() {
    let two = vec![record("A", 0, 0), record("B", 1920, 0)];
    let three = vec![record("A", 0, 0), record("B", 1920, 0), record("C", 3840, 0)];

    // The layout source reports the third display only after the re-scan
    let mut manager = MonitorManager::new(
        MultiMonitorConfig::default(),
        Box::new(SwitchingEnumerator::new(two.clone(), three.clone())),
        DisplayOrder::Enumeration,
        HeadlessScene::new(two, 0),
    );
    manager.activate().unwrap();
    run(&mut manager, 2);
    assert_eq!(manager.slots().len(), 2);

    manager.backend_mut().set_displays(three);
    manager.request_rescan();
    let report = manager.tick().unwrap();
    assert!(report.rescanned);
    assert_eq!(manager.slots().len(), 3);

    assert_eq!(run(&mut manager, 2), ReconcileOutcome::Stable);
    assert_eq!(manager.snapshot().offset(), (1920, 0));
    assert!(manager.slots()[1].position().unwrap().x.abs() < EPS);
}

#[test]
fn test_position_order_sorts_snapshot() {
    let displays = vec![record("RIGHT", 1920, 0), record("LEFT", 0, 0)];
    let mut manager = MonitorManager::new(
        MultiMonitorConfig::default(),
        Box::new(StaticEnumerator::new(displays)),
        DisplayOrder::Position,
        HeadlessScene::new(Vec::new(), 0),
    );
    manager.activate().unwrap();

    let names: Vec<_> = manager
        .snapshot()
        .records()
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, ["LEFT", "RIGHT"]);
}

/// Returns `first` on the first call and `second` afterwards
struct SwitchingEnumerator {
    first: Vec<DisplayRecord>,
    second: Vec<DisplayRecord>,
    calls: std::cell::Cell<usize>,
}

impl SwitchingEnumerator {
    fn new(first: Vec<DisplayRecord>, second: Vec<DisplayRecord>) -> Self {
        Self {
            first,
            second,
            calls: std::cell::Cell::new(0),
        }
    }
}

impl virtual_monitors::multimon::DisplayEnumerator for SwitchingEnumerator {
    fn list_displays(&self) -> virtual_monitors::multimon::Result<Vec<DisplayRecord>> {
        let calls = self.calls.get();
        self.calls.set(calls + 1);
        Ok(if calls == 0 {
            self.first.clone()
        } else {
            self.second.clone()
        })
    }
}
