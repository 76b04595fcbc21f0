//! Pinhole projection of a known physical diameter to pixels.

use crate::camera::FocalLengths;

/// Regulation tennis ball diameter.
pub const TENNIS_BALL_DIAMETER_MM: f64 = 68.6;

/// Expected on-image width and height of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PixelFootprint {
    pub width: u32,
    pub height: u32,
}

impl PixelFootprint {
    /// Square footprint of side `d`.
    pub fn square(d: u32) -> Self {
        Self {
            width: d,
            height: d,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Mean of the two axes, halved and truncated.
    pub fn expected_radius_px(&self) -> u32 {
        ((self.width as u64 + self.height as u64) / 4) as u32
    }
}

/// Projects a fixed target diameter at a measured range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedSizeModel {
    pub diameter_mm: f64,
}

impl Default for ExpectedSizeModel {
    fn default() -> Self {
        Self {
            diameter_mm: TENNIS_BALL_DIAMETER_MM,
        }
    }
}

impl ExpectedSizeModel {
    pub fn new(diameter_mm: f64) -> Self {
        Self { diameter_mm }
    }

    /// `ceil(diameter / range * f)` per axis; `(0, 0)` for an invalid range
    /// or invalid focal lengths.
    pub fn footprint(&self, range_mm: f64, focal: FocalLengths) -> PixelFootprint {
        if !range_mm.is_finite() || range_mm <= 0.0 || !focal.is_valid() {
            return PixelFootprint::default();
        }
        let project = |f: f64| {
            let px = (self.diameter_mm / range_mm * f).ceil();
            if px.is_finite() && px > 0.0 {
                px.min(u32::MAX as f64) as u32
            } else {
                0
            }
        };
        PixelFootprint {
            width: project(focal.fx),
            height: project(focal.fy),
        }
    }
}
