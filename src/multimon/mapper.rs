//! Coordinate Mapping
//!
//! Converts OS pixel-space display positions into scene-space positions.
//! Everything here is pure: the same inputs always give the same output.

use serde::{Deserialize, Serialize};

use crate::multimon::display::DisplayRecord;
use crate::multimon::{MonitorError, Result};

/// Position of a screen object in the scene (y up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenePosition {
    /// Horizontal, positive to the right
    pub x: f32,
    /// Vertical, positive up
    pub y: f32,
    /// Depth, positive away from the viewer
    pub z: f32,
}

/// Validated placement parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    scale_per_thousand_pixels: f32,
    height_offset: f32,
    depth_offset: f32,
    origin_height: f32,
}

impl Placement {
    /// Create placement parameters
    ///
    /// # Errors
    ///
    /// `scale_per_thousand_pixels` must be finite and strictly positive (it is
    /// a divisor in size compensation); both offsets must be finite and `>= 0`.
    pub fn new(scale_per_thousand_pixels: f32, height_offset: f32, depth_offset: f32) -> Result<Self> {
        if !scale_per_thousand_pixels.is_finite() || scale_per_thousand_pixels <= 0.0 {
            return Err(MonitorError::InvalidConfiguration(format!(
                "scale_per_thousand_pixels must be > 0, got {}",
                scale_per_thousand_pixels
            )));
        }
        if !height_offset.is_finite() || height_offset < 0.0 {
            return Err(MonitorError::InvalidConfiguration(format!(
                "height_offset must be >= 0, got {}",
                height_offset
            )));
        }
        if !depth_offset.is_finite() || depth_offset < 0.0 {
            return Err(MonitorError::InvalidConfiguration(format!(
                "depth_offset must be >= 0, got {}",
                depth_offset
            )));
        }

        Ok(Self {
            scale_per_thousand_pixels,
            height_offset,
            depth_offset,
            origin_height: 0.0,
        })
    }

    /// Add the host's camera/origin height to every y
    pub fn with_origin_height(mut self, origin_height: f32) -> Self {
        self.origin_height = origin_height;
        self
    }

    /// Scene units per 1000 pixels
    pub fn scale_per_thousand_pixels(&self) -> f32 {
        self.scale_per_thousand_pixels
    }

    /// Scene units per pixel
    pub fn px_to_unit(&self) -> f32 {
        self.scale_per_thousand_pixels / 1000.0
    }

    /// Constant vertical offset
    pub fn height_offset(&self) -> f32 {
        self.height_offset
    }

    /// Constant depth
    pub fn depth_offset(&self) -> f32 {
        self.depth_offset
    }

    /// Host-supplied origin height
    pub fn origin_height(&self) -> f32 {
        self.origin_height
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            scale_per_thousand_pixels: 1.0,
            height_offset: 0.0,
            depth_offset: 0.0,
            origin_height: 0.0,
        }
    }
}

/// Reported vs. rendered size of one screen object
///
/// Some capture backends letterbox or rescale, so the rendered object is not
/// exactly `reported * px_to_unit` big. Positions are divided by the per-axis
/// ratio `expected / rendered` so that screens keep touching edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeCompensation {
    /// Width the OS reports for the captured display, in pixels
    pub reported_width: u32,
    /// Height the OS reports for the captured display, in pixels
    pub reported_height: u32,
    /// Width of the rendered object in scene units
    pub rendered_width: f32,
    /// Height of the rendered object in scene units
    pub rendered_height: f32,
}

impl SizeCompensation {
    /// Per-axis divisor, `None` when an axis cannot be compensated
    fn ratio(reported: u32, rendered: f32, px_to_unit: f32) -> Option<f32> {
        if reported == 0 || !rendered.is_finite() || rendered <= 0.0 {
            return None;
        }
        Some(reported as f32 * px_to_unit / rendered)
    }

    /// `(x_ratio, y_ratio)`; 1.0 on an axis that is skipped
    pub fn ratios(&self, px_to_unit: f32) -> (f32, f32) {
        (
            Self::ratio(self.reported_width, self.rendered_width, px_to_unit).unwrap_or(1.0),
            Self::ratio(self.reported_height, self.rendered_height, px_to_unit).unwrap_or(1.0),
        )
    }
}

/// Pixel space → scene space conversion
pub struct CoordinateMapper;

impl CoordinateMapper {
    /// Scene position of `record`
    ///
    /// `offset_scaled` is the layout offset already multiplied by
    /// [`Placement::px_to_unit`] (see [`super::LayoutSnapshot::offset_for`]).
    pub fn position(
        record: &DisplayRecord,
        offset_scaled: (f32, f32),
        placement: &Placement,
        compensation: Option<&SizeCompensation>,
    ) -> ScenePosition {
        let px_to_unit = placement.px_to_unit();

        let mut x = record.x as f32 * px_to_unit - offset_scaled.0;
        // OS y grows downward, scene y grows upward
        let mut y = -(record.y as f32 * px_to_unit - offset_scaled.1);

        if let Some(compensation) = compensation {
            let (rx, ry) = compensation.ratios(px_to_unit);
            x /= rx;
            y /= ry;
        }

        ScenePosition {
            x,
            y: y + placement.height_offset + placement.origin_height,
            z: placement.depth_offset,
        }
    }
}
