//! Canvas geometry: CSS size, device-pixel ratio, crisp-line snapping.

use serde::{Deserialize, Serialize};

/// A display canvas in CSS pixels plus the device-pixel ratio it is shown at.
///
/// The backing store is `css size × dpr` device pixels and the context is
/// scaled by `dpr`, so draw commands are always in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl CanvasSize {
    /// Non-finite or negative sizes collapse to zero; an unusable ratio becomes 1.
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        let dimension = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            width: dimension(width),
            height: dimension(height),
            dpr: if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 },
        }
    }

    pub fn backing_width(&self) -> u32 {
        (self.width * self.dpr).round() as u32
    }

    pub fn backing_height(&self) -> u32 {
        (self.height * self.dpr).round() as u32
    }

    /// Half a device pixel, in CSS pixels.
    pub fn line_offset(&self) -> f64 {
        0.5 / self.dpr
    }

    /// Snap a coordinate to the device-pixel grid and shift it half a device
    /// pixel so a 1 px stroke covers exactly one row of device pixels.
    pub fn crisp(&self, v: f64) -> f64 {
        (v * self.dpr).floor() / self.dpr + self.line_offset()
    }
}
