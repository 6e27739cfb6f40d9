//! Monitor Manager
//!
//! Composition point: owns the layout model and the screen registry and runs
//! the per-frame tick. Constructed and owned by whatever drives the frame
//! loop; there is no global instance.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::multimon::backend::SceneBackend;
use crate::multimon::display::DisplayEnumerator;
use crate::multimon::layout::{DisplayOrder, LayoutModel, LayoutSnapshot};
use crate::multimon::mapper::{CoordinateMapper, Placement};
use crate::multimon::reconcile::{IdentityReconciler, ReconcileOutcome};
use crate::multimon::registry::{ScreenRegistry, ScreenSlot};
use crate::multimon::{MonitorError, Result};
use crate::utils::metrics::{metric_names, MetricsCollector, Timer};

/// How many screen slots to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SlotMode {
    /// One slot per discovered display
    #[default]
    Auto,

    /// A fixed number of slots regardless of discovery
    Fixed {
        /// Slot count (>= 1)
        count: usize,
    },
}

/// Multi-monitor configuration
#[derive(Debug, Clone)]
pub struct MultiMonitorConfig {
    /// Scale and constant offsets
    pub placement: Placement,

    /// Slot count policy
    pub slot_mode: SlotMode,

    /// Correct positions for objects rendered at a different size than the
    /// display's reported resolution
    pub size_compensation: bool,
}

impl MultiMonitorConfig {
    /// Reject a fixed slot count of zero
    ///
    /// Placement values are already checked by [`Placement::new`].
    pub fn validate(&self) -> Result<()> {
        if let SlotMode::Fixed { count: 0 } = self.slot_mode {
            return Err(MonitorError::InvalidConfiguration(
                "fixed slot count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MultiMonitorConfig {
    fn default() -> Self {
        Self {
            placement: Placement::default(),
            slot_mode: SlotMode::Auto,
            size_compensation: true,
        }
    }
}

/// Summary of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Frame number, starting at 1
    pub frame: u64,

    /// Whether identities were re-matched
    pub outcome: ReconcileOutcome,

    /// Slots whose position was pushed to the scene
    pub positioned: usize,

    /// A pending re-scan ran at the start of this tick
    pub rescanned: bool,
}

/// Monitor manager coordinates discovery, identity and placement
pub struct MonitorManager<B: SceneBackend> {
    config: MultiMonitorConfig,
    layout: LayoutModel,
    registry: ScreenRegistry<B>,
    metrics: Option<Arc<MetricsCollector>>,
    active: bool,
    rescan_requested: bool,
    frame: u64,
}

impl<B: SceneBackend> MonitorManager<B> {
    /// Create a manager. Nothing is enumerated or instantiated until
    /// [`MonitorManager::activate`].
    pub fn new(
        config: MultiMonitorConfig,
        enumerator: Box<dyn DisplayEnumerator>,
        order: DisplayOrder,
        backend: B,
    ) -> Self {
        Self {
            config,
            layout: LayoutModel::new(enumerator, order),
            registry: ScreenRegistry::new(backend),
            metrics: None,
            active: false,
            rescan_requested: false,
            frame: 0,
        }
    }

    /// Record tick statistics into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Discover displays and create the slots
    ///
    /// # Errors
    ///
    /// Fails if the scene backend cannot instantiate a slot. Zero displays is
    /// not an error.
    pub fn activate(&mut self) -> Result<()> {
        if self.active {
            warn!("Monitor manager already active, ignoring activate()");
            return Ok(());
        }

        info!("Activating monitor manager");
        self.discover()?;
        self.active = true;
        Ok(())
    }

    /// Enumerate again right now and resize the slot set
    ///
    /// # Errors
    ///
    /// [`MonitorError::NotActive`] before [`MonitorManager::activate`].
    pub fn rescan(&mut self) -> Result<()> {
        if !self.active {
            return Err(MonitorError::NotActive);
        }
        info!("Manual display re-scan");
        self.discover()
    }

    /// Ask for a re-scan at the start of the next tick
    pub fn request_rescan(&mut self) {
        debug!("Re-scan requested");
        self.rescan_requested = true;
    }

    /// Run one frame: refresh parameters, check stability, re-match if
    /// needed, then reposition every bound slot
    pub fn tick(&mut self) -> Result<TickReport> {
        if !self.active {
            return Err(MonitorError::NotActive);
        }

        let timer = Timer::new();

        let rescanned = std::mem::take(&mut self.rescan_requested);
        if rescanned {
            self.discover()?;
        }

        self.frame += 1;

        let placement = self.config.placement;
        let compensate = self.config.size_compensation;

        self.registry
            .refresh_parameters(placement.scale_per_thousand_pixels());
        self.registry.poll_capture();

        let snapshot = self.layout.snapshot();
        let outcome = IdentityReconciler::reconcile(self.registry.slots_mut(), snapshot.records());

        if let ReconcileOutcome::Rematched { relabelled } = outcome {
            debug!("Frame {}: identities re-matched, {} relabelled", self.frame, relabelled);
        }

        let offset = snapshot.offset_for(placement.px_to_unit());
        let positioned = self.registry.apply_positions(|slot| {
            let record = snapshot.record(slot.bound_record()?)?;
            let compensation = if compensate { slot.compensation() } else { None };
            Some(CoordinateMapper::position(record, offset, &placement, compensation))
        });

        if let Some(metrics) = &self.metrics {
            metrics.increment_counter(metric_names::TICKS, 1);
            if let ReconcileOutcome::Rematched { relabelled } = outcome {
                metrics.increment_counter(metric_names::REMATCHES, 1);
                metrics.increment_counter(metric_names::RELABELLED_SLOTS, relabelled as u64);
            }
            metrics.set_gauge(metric_names::SLOTS_POSITIONED, positioned as f64);
            metrics.record_histogram(metric_names::TICK_TIME_MS, timer.elapsed_ms());
        }

        Ok(TickReport {
            frame: self.frame,
            outcome,
            positioned,
            rescanned,
        })
    }

    /// Destroy every slot and go inactive
    pub fn shutdown(&mut self) {
        if self.active {
            info!("Shutting down monitor manager after {} frames", self.frame);
        }
        self.registry.clear();
        self.active = false;
    }

    /// Replace scale/offset parameters; takes effect on the next tick
    pub fn set_placement(&mut self, placement: Placement) {
        self.config.placement = placement;
    }

    /// Host origin (e.g. VR camera) height added to every screen
    pub fn set_origin_height(&mut self, origin_height: f32) {
        self.config.placement = self.config.placement.with_origin_height(origin_height);
    }

    /// Slots the current mode asks for
    pub fn desired_count(&self) -> usize {
        match self.config.slot_mode {
            SlotMode::Auto => self.layout.snapshot().len(),
            SlotMode::Fixed { count } => count,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> &LayoutSnapshot {
        self.layout.snapshot()
    }

    /// Slots in creation order
    pub fn slots(&self) -> &[ScreenSlot<B::Handle>] {
        self.registry.slots()
    }

    /// Layout model (scan count, ordering)
    pub fn layout(&self) -> &LayoutModel {
        &self.layout
    }

    /// Scene backend
    pub fn backend(&self) -> &B {
        self.registry.backend()
    }

    /// Scene backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        self.registry.backend_mut()
    }

    /// Active configuration
    pub fn config(&self) -> &MultiMonitorConfig {
        &self.config
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// True between `activate()` and `shutdown()`
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn discover(&mut self) -> Result<()> {
        let displays = self.layout.rescan().len();

        self.registry.unbind_all();
        let desired = self.desired_count();
        if desired == 0 {
            warn!("No displays discovered, no screens will be rendered");
        }
        self.registry
            .sync(desired, self.config.placement.scale_per_thousand_pixels())?;

        if let Some(metrics) = &self.metrics {
            metrics.increment_counter(metric_names::RESCANS, 1);
            metrics.set_gauge(metric_names::DISPLAYS_DISCOVERED, displays as f64);
            metrics.set_gauge(metric_names::SLOTS_ACTIVE, self.registry.len() as f64);
        }

        Ok(())
    }
}
