//! Per-frame detection pipeline.
//!
//! Wires the stages together: colour segmentation -> largest blob -> depth
//! at the centroid -> expected pixel size -> region of interest -> circle
//! search. The pipeline holds configuration only; every frame is processed
//! from scratch and the result records the stage at which it stopped.
//!
//! Recoverable conditions (no blob, zero-area blob, invalid depth, region
//! outside the frame, no circle) are encoded in [`FrameResult::stage`],
//! never as errors.

mod result;
mod run;

pub use result::{BlobObservation, Confidence, Detection, FrameResult, PipelineStage};

use image::RgbImage;

use crate::camera::{FocalLengths, PointCloud};
use crate::color::{segment, FilterParams, MaskStages};
use crate::config::TrackerConfig;

/// Stateless-per-frame target detector.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    config: TrackerConfig,
}

impl DetectionPipeline {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the colour filter, e.g. with values confirmed in the tuner.
    pub fn set_filter(&mut self, filter: FilterParams) {
        self.config.filter = filter;
    }

    /// Run every stage on one frame.
    pub fn process<C: PointCloud + ?Sized>(
        &self,
        frame: &RgbImage,
        cloud: &C,
        focal: FocalLengths,
    ) -> FrameResult {
        self.process_with_masks(frame, cloud, focal).0
    }

    /// Like [`process`](Self::process), also returning the segmentation masks.
    pub fn process_with_masks<C: PointCloud + ?Sized>(
        &self,
        frame: &RgbImage,
        cloud: &C,
        focal: FocalLengths,
    ) -> (FrameResult, MaskStages) {
        let masks = segment(frame, &self.config.filter, self.config.median_blur_radius);
        let result = run::run(frame, &masks.cleaned, cloud, focal, &self.config);
        (result, masks)
    }
}
