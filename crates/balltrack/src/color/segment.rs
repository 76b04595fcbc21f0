use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use super::{to_hsv, ColorRange, FilterParams, HsvImage};
use crate::tuner::DisplayMode;

const MASK_ON: u8 = 255;

/// Every intermediate mask of one segmentation run.
///
/// The detector only consumes [`MaskStages::cleaned`]; the tuner displays
/// whichever stage the operator selected.
#[derive(Debug, Clone)]
pub struct MaskStages {
    /// Pixels inside the HSV bounds.
    pub raw: GrayImage,
    /// `raw` after the configured erosion passes.
    pub eroded: GrayImage,
    /// `eroded` after the configured dilation passes.
    pub cleaned: GrayImage,
}

impl MaskStages {
    pub fn stage(&self, mode: DisplayMode) -> &GrayImage {
        match mode {
            DisplayMode::RawMask => &self.raw,
            DisplayMode::Eroded => &self.eroded,
            DisplayMode::ErodedDilated => &self.cleaned,
        }
    }
}

/// Binary mask (`0` / `255`) of pixels inside `range`.
pub fn threshold_hsv(hsv: &HsvImage, range: &ColorRange) -> GrayImage {
    let (w, h) = hsv.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (dst, src) in mask.pixels_mut().zip(hsv.pixels()) {
        if range.contains(src.0) {
            *dst = Luma([MASK_ON]);
        }
    }
    mask
}

/// Threshold `frame` by colour and clean the mask with erosion then dilation.
///
/// `median_blur_radius > 0` median-filters the frame first. An all-zero mask
/// is a normal result when nothing matches.
pub fn segment(frame: &RgbImage, params: &FilterParams, median_blur_radius: u32) -> MaskStages {
    let hsv = if median_blur_radius > 0 {
        let blurred = imageproc::filter::median_filter(frame, median_blur_radius, median_blur_radius);
        to_hsv(&blurred)
    } else {
        to_hsv(frame)
    };

    let raw = threshold_hsv(&hsv, &params.color);
    let eroded = repeat_square(&raw, params.morphology.erosions, morphology::erode);
    let cleaned = repeat_square(&eroded, params.morphology.dilations, morphology::dilate);

    MaskStages {
        raw,
        eroded,
        cleaned,
    }
}

/// Apply `passes` iterations of a 3x3 square operator.
///
/// `k` passes of a 3x3 square equal one pass at L-inf radius `k`, so the
/// work is batched into the largest radius the operator accepts.
fn repeat_square(
    mask: &GrayImage,
    passes: u32,
    op: fn(&GrayImage, Norm, u8) -> GrayImage,
) -> GrayImage {
    let mut out = mask.clone();
    let mut remaining = passes;
    while remaining > 0 {
        let step = remaining.min(u8::MAX as u32) as u8;
        out = op(&out, Norm::LInf, step);
        remaining -= step as u32;
    }
    out
}
