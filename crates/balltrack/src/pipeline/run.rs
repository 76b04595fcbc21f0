//! Per-frame state machine: blob -> range -> size -> roi -> circle.

use image::{GrayImage, RgbImage};

use super::result::{BlobObservation, Confidence, Detection, FrameResult, PipelineStage};
use crate::blob::detect_largest_blob;
use crate::camera::{FocalLengths, PointCloud};
use crate::config::TrackerConfig;
use crate::expected_size::{ExpectedSizeModel, PixelFootprint};
use crate::hough::{refine_in_roi, HoughCircle};
use crate::range::{sample_depth, DepthSample};
use crate::roi::extract_roi;
use crate::spherical::camera_to_spherical;

pub(super) fn run<C: PointCloud + ?Sized>(
    frame: &RgbImage,
    mask: &GrayImage,
    cloud: &C,
    focal: FocalLengths,
    config: &TrackerConfig,
) -> FrameResult {
    let (w, h) = frame.dimensions();
    let mut result = FrameResult::empty(w, h);

    let Some(blob) = detect_largest_blob(mask) else {
        tracing::trace!("no blob in mask");
        return result;
    };
    result.blob = Some(BlobObservation {
        area_px: blob.area,
        centroid: blob.centroid,
        coarse_circle: blob.coarse_circle,
    });
    let Some(centroid) = blob.centroid else {
        return result;
    };
    result.stage = PipelineStage::BlobFound;
    tracing::debug!(
        "blob at ({}, {}), area {:.1}, coarse radius {:.1}",
        centroid.x,
        centroid.y,
        blob.area,
        blob.coarse_circle.radius
    );

    let depth = match sample_depth(cloud, centroid) {
        Ok(sample) => {
            result.stage = PipelineStage::RangeKnown;
            Some(sample)
        }
        Err(reason) if config.mode.depth_sizing => {
            tracing::warn!(
                "invalid depth at ({}, {}): {reason}; skipping frame",
                centroid.x,
                centroid.y
            );
            return result;
        }
        Err(reason) => {
            tracing::debug!("invalid depth at ({}, {}): {reason}", centroid.x, centroid.y);
            None
        }
    };

    let footprint = match depth {
        Some(sample) if config.mode.depth_sizing => {
            depth_footprint(&sample, config.target_diameter_mm, focal)
        }
        _ => coarse_footprint(blob.coarse_circle.radius),
    };
    result.stage = PipelineStage::SizeKnown;
    tracing::debug!(
        "expected footprint {}x{} px (range {:?} mm)",
        footprint.width,
        footprint.height,
        depth.map(|d| d.range_mm)
    );

    let mut detection = Detection {
        centroid,
        coarse_radius_px: blob.coarse_circle.radius,
        depth,
        pixel_footprint: footprint,
        roi: None,
        refined_circle: None,
        circle_candidates: Vec::new(),
        spherical: depth.map(|d| camera_to_spherical(d.xyz_mm)),
        confidence: Confidence::ColorOnly,
    };

    let Some(roi) = extract_roi(centroid, footprint, &config.roi, [w, h]) else {
        result.detection = Some(detection);
        return result;
    };
    detection.roi = Some(roi);

    if !config.mode.circle_refinement {
        result.stage = PipelineStage::RoiValid;
        result.detection = Some(detection);
        return result;
    }

    let crop = roi.crop(frame);
    let candidates: Vec<HoughCircle> = refine_in_roi(&crop, footprint.expected_radius_px(), &config.hough)
        .into_iter()
        .map(|c| {
            let [x, y] = roi.to_frame([c.x, c.y]);
            HoughCircle { x, y, ..c }
        })
        .collect();

    match candidates.first() {
        Some(best) => {
            tracing::debug!(
                "circle confirmed at ({:.1}, {:.1}) r={:.1}, {} votes",
                best.x,
                best.y,
                best.r,
                best.votes
            );
            detection.refined_circle = Some(*best);
            detection.confidence = Confidence::Confirmed;
            result.stage = PipelineStage::CircleConfirmed;
        }
        None => {
            tracing::debug!("no circle inside roi; colour-only fallback");
            result.stage = PipelineStage::ColorOnlyFallback;
        }
    }
    detection.circle_candidates = candidates;
    result.detection = Some(detection);
    result
}

/// Footprint at the sampled range, rounded to whole millimetres.
fn depth_footprint(sample: &DepthSample, diameter_mm: f64, focal: FocalLengths) -> PixelFootprint {
    ExpectedSizeModel::new(diameter_mm).footprint(sample.range_mm.round(), focal)
}

/// Footprint from the coarse enclosing circle's diameter.
fn coarse_footprint(radius: f32) -> PixelFootprint {
    let d = (2.0 * radius).ceil();
    if d.is_finite() && d > 0.0 {
        PixelFootprint::square(d as u32)
    } else {
        PixelFootprint::default()
    }
}
