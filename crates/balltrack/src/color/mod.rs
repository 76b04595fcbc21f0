//! Colour thresholding in HSV space followed by binary morphology.
//!
//! The filter is described by a [`ColorRange`] (inclusive lower/upper HSV
//! bounds in 8-bit channel units) and a [`MorphologyConfig`] (how many
//! erosion and dilation passes clean the thresholded mask). Together they
//! form the [`FilterParams`] that the interactive tuner edits live.

mod hsv;
mod segment;

pub use hsv::{rgb_to_hsv, to_hsv, HsvImage};
pub use segment::{segment, threshold_hsv, MaskStages};

/// One of the three HSV channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HsvChannel {
    Hue,
    Saturation,
    Value,
}

impl HsvChannel {
    /// Largest representable value of the channel (OpenCV 8-bit convention).
    pub fn max_value(self) -> u8 {
        match self {
            Self::Hue => 179,
            Self::Saturation | Self::Value => 255,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Hue => 0,
            Self::Saturation => 1,
            Self::Value => 2,
        }
    }
}

/// Inclusive HSV bounds, `[hue, saturation, value]` per side.
///
/// `lower <= upper` is not enforced: an inverted channel simply matches no
/// pixel, which is a legitimate intermediate state while tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Returns `true` when every channel of `hsv` lies within the bounds.
    #[inline]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

impl Default for ColorRange {
    /// Yellow-green of a tennis ball under typical outdoor lighting.
    fn default() -> Self {
        Self {
            lower: [35, 70, 30],
            upper: [85, 255, 255],
        }
    }
}

/// Number of 3x3 erosion and dilation passes applied to the raw mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    pub erosions: u32,
    pub dilations: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            erosions: 2,
            dilations: 3,
        }
    }
}

/// Complete colour filter: HSV bounds plus mask cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub color: ColorRange,
    pub morphology: MorphologyConfig,
}

impl std::fmt::Display for FilterParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HSV filter: ({:?}, {:?}), erosions: {}, dilations: {}",
            self.color.lower, self.color.upper, self.morphology.erosions, self.morphology.dilations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_matches_tennis_ball_yellow() {
        let range = ColorRange::default();
        assert!(range.contains([38, 208, 220]));
        assert!(!range.contains([0, 0, 20]));
        assert!(!range.contains([100, 200, 200]));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = ColorRange::new([10, 20, 30], [40, 50, 60]);
        assert!(range.contains([10, 20, 30]));
        assert!(range.contains([40, 50, 60]));
        assert!(!range.contains([9, 20, 30]));
        assert!(!range.contains([40, 51, 60]));
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let range = ColorRange::new([90, 0, 0], [10, 255, 255]);
        for h in 0..=179u8 {
            assert!(!range.contains([h, 128, 128]));
        }
    }

    #[test]
    fn filter_params_deserialize_with_missing_fields() {
        let params: FilterParams =
            serde_json::from_str(r#"{"color":{"lower":[1,2,3],"upper":[4,5,6]}}"#)
                .expect("valid json");
        assert_eq!(params.color.lower, [1, 2, 3]);
        assert_eq!(params.morphology, MorphologyConfig::default());
    }
}
