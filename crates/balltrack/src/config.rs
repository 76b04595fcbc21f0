//! Tracker configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes.

use std::path::Path;

use crate::color::FilterParams;
use crate::expected_size::TENNIS_BALL_DIAMETER_MM;
use crate::hough::HoughConfig;
use crate::roi::RoiConfig;

/// Which optional pipeline stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineMode {
    /// Size the region of interest from the sampled depth. When off, the
    /// coarse enclosing circle sets the size and invalid depth does not
    /// halt the frame.
    pub depth_sizing: bool,
    /// Confirm the target with a circle search inside the region.
    pub circle_refinement: bool,
}

impl Default for PipelineMode {
    fn default() -> Self {
        Self {
            depth_sizing: true,
            circle_refinement: true,
        }
    }
}

/// Top-level tracker configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Physical target diameter (mm).
    pub target_diameter_mm: f64,
    pub filter: FilterParams,
    pub roi: RoiConfig,
    pub hough: HoughConfig,
    pub mode: PipelineMode,
    /// Median pre-blur radius; 0 disables it.
    pub median_blur_radius: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target_diameter_mm: TENNIS_BALL_DIAMETER_MM,
            filter: FilterParams::default(),
            roi: RoiConfig::default(),
            hough: HoughConfig::default(),
            mode: PipelineMode::default(),
            median_blur_radius: 0,
        }
    }
}

impl TrackerConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values no frame could be processed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_diameter_mm.is_finite() && self.target_diameter_mm > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "target_diameter_mm must be positive, got {}",
                self.target_diameter_mm
            )));
        }
        if !(self.roi.buffer_factor.is_finite() && self.roi.buffer_factor >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "roi.buffer_factor must be non-negative, got {}",
                self.roi.buffer_factor
            )));
        }
        let [lo, hi] = self.hough.radius_band;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi) {
            return Err(ConfigError::Invalid(format!(
                "hough.radius_band must satisfy 0 < lo <= hi, got [{lo}, {hi}]"
            )));
        }
        if self.hough.canny_low > self.hough.canny_high {
            return Err(ConfigError::Invalid(
                "hough.canny_low must not exceed hough.canny_high".to_string(),
            ));
        }
        let [hue_lo, _, _] = self.filter.color.lower;
        let [hue_hi, _, _] = self.filter.color.upper;
        if hue_lo > 179 || hue_hi > 179 {
            return Err(ConfigError::Invalid(
                "hue bounds must lie in 0..=179".to_string(),
            ));
        }
        Ok(())
    }
}

/// Failure loading a [`TrackerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse(e) => write!(f, "cannot parse config: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
