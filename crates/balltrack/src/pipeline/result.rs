use crate::blob::{Centroid, EnclosingCircle};
use crate::expected_size::PixelFootprint;
use crate::hough::HoughCircle;
use crate::range::DepthSample;
use crate::roi::Roi;
use crate::spherical::SphericalCoord;

/// Furthest point a frame reached in the detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// No blob, or the blob has no centroid.
    NoBlob,
    /// Blob found but its depth sample is invalid.
    BlobFound,
    /// Depth sampled; only passed through while the frame is processed.
    RangeKnown,
    /// Expected size known but the region of interest left the frame.
    SizeKnown,
    /// Region extracted and refinement disabled.
    RoiValid,
    /// A circle was found inside the region.
    CircleConfirmed,
    /// The circle search found nothing; colour-only position.
    ColorOnlyFallback,
}

impl PipelineStage {
    /// Whether a frame halted here still carries a [`Detection`].
    pub fn has_detection(self) -> bool {
        !matches!(self, Self::NoBlob | Self::BlobFound | Self::RangeKnown)
    }
}

/// How the reported position was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Colour blob confirmed by a circle.
    Confirmed,
    /// Colour blob only.
    ColorOnly,
}

/// What the blob detector saw, even when the frame halted early.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlobObservation {
    pub area_px: f64,
    pub centroid: Option<Centroid>,
    pub coarse_circle: EnclosingCircle,
}

/// Per-frame target detection.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub centroid: Centroid,
    pub coarse_radius_px: f32,
    /// Depth sample at the centroid, absent when depth sizing is off and
    /// the sample was invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<DepthSample>,
    pub pixel_footprint: PixelFootprint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<Roi>,
    /// Best circle candidate, frame coordinates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_circle: Option<HoughCircle>,
    /// Every circle candidate, best first, frame coordinates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub circle_candidates: Vec<HoughCircle>,
    /// Position derived from the centroid's depth sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spherical: Option<SphericalCoord>,
    pub confidence: Confidence,
}

impl Detection {
    pub fn range_mm(&self) -> Option<f64> {
        self.depth.map(|d| d.range_mm)
    }

    /// One-line operator report, `None` without a position.
    ///
    /// Confirmed detections read "Detected", colour-only ones "Guessed".
    pub fn report(&self) -> Option<String> {
        let coord = self.spherical?;
        let label = match self.confidence {
            Confidence::Confirmed => "Detected",
            Confidence::ColorOnly => "Guessed",
        };
        Some(format!("{label} target at {coord}"))
    }
}

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameResult {
    pub stage: PipelineStage,
    /// Frame dimensions `[width, height]`.
    pub image_size: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob: Option<BlobObservation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<Detection>,
}

impl FrameResult {
    /// Result for a frame without any blob.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            stage: PipelineStage::NoBlob,
            image_size: [width, height],
            blob: None,
            detection: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.stage == PipelineStage::CircleConfirmed
    }

    pub fn spherical(&self) -> Option<SphericalCoord> {
        self.detection.as_ref().and_then(|d| d.spherical)
    }
}
