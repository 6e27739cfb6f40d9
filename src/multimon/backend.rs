//! Scene and capture backend interface
//!
//! The engine-side object lifecycle and the texture-capture backend are
//! external services. The core only instantiates/destroys objects, pushes
//! per-slot parameters and positions, and polls what each object currently
//! captures.

use crate::multimon::mapper::{ScenePosition, SizeCompensation};
use crate::multimon::Result;

/// Capture-target parameters pushed to every slot each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotParams {
    /// Logical slot index; the capture backend uses it as its desktop index
    pub logical_index: usize,

    /// Scene units per 1000 pixels
    pub scale_factor: f32,
}

/// What a slot's capture backend resolved, polled once per tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureState {
    /// Name of the display currently captured, `None` until resolved
    pub resolved_name: Option<String>,

    /// Reported pixel width of the captured display
    pub reported_width: u32,
    /// Reported pixel height of the captured display
    pub reported_height: u32,

    /// Rendered object width in scene units
    pub rendered_width: f32,
    /// Rendered object height in scene units
    pub rendered_height: f32,
}

impl CaptureState {
    /// Size compensation inputs, only available once a display is captured
    pub fn size_compensation(&self) -> Option<SizeCompensation> {
        self.resolved_name.as_ref()?;

        Some(SizeCompensation {
            reported_width: self.reported_width,
            reported_height: self.reported_height,
            rendered_width: self.rendered_width,
            rendered_height: self.rendered_height,
        })
    }
}

/// Scene-object lifecycle plus capture queries
///
/// Calls happen on the tick thread only; nothing is pushed back into the core.
pub trait SceneBackend {
    /// Opaque handle to one rendered screen object
    type Handle;

    /// Create a screen object and point its capture at `params`
    fn instantiate(&mut self, params: &SlotParams) -> Result<Self::Handle>;

    /// Release the object and its capture resource
    fn destroy(&mut self, handle: Self::Handle);

    /// Re-apply capture parameters
    fn configure(&mut self, handle: &Self::Handle, params: &SlotParams);

    /// Last-known capture result for the object
    fn capture_state(&self, handle: &Self::Handle) -> CaptureState;

    /// Move the object
    fn set_position(&mut self, handle: &Self::Handle, position: ScenePosition);
}
