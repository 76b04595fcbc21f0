//! Detection annotations drawn onto a copy of the frame.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::pipeline::FrameResult;

const COARSE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const ROI_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const CIRCLE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Full width of the centroid marker (pixels).
const MARKER_SIZE: f32 = 10.0;

/// Draw the coarse circle, centroid marker, region of interest and refined
/// circle of `result` onto `frame`.
pub fn draw_detection(frame: &mut RgbImage, result: &FrameResult) {
    if let Some(blob) = &result.blob {
        let c = blob.coarse_circle;
        let r = c.radius as i32;
        if r > 1 {
            draw_hollow_circle_mut(frame, (c.center[0] as i32, c.center[1] as i32), r, COARSE_COLOR);
        }
        if let Some(centroid) = blob.centroid {
            draw_tilted_cross(frame, centroid.x as f32, centroid.y as f32);
        }
    }

    let Some(det) = &result.detection else {
        return;
    };
    if let Some(roi) = det.roi {
        let rect = Rect::at(roi.x1 as i32, roi.y1 as i32).of_size(roi.width(), roi.height());
        draw_hollow_rect_mut(frame, rect, ROI_COLOR);
    }
    if let Some(circle) = det.refined_circle {
        let center = (circle.x.round() as i32, circle.y.round() as i32);
        let r = circle.r.round() as i32;
        // Two rings for a 2 px outline.
        draw_hollow_circle_mut(frame, center, r, CIRCLE_COLOR);
        draw_hollow_circle_mut(frame, center, r + 1, CIRCLE_COLOR);
    }
}

/// Return an annotated copy of `frame`.
pub fn annotate(frame: &RgbImage, result: &FrameResult) -> RgbImage {
    let mut out = frame.clone();
    draw_detection(&mut out, result);
    out
}

fn draw_tilted_cross(frame: &mut RgbImage, x: f32, y: f32) {
    let h = MARKER_SIZE / 2.0;
    draw_line_segment_mut(frame, (x - h, y - h), (x + h, y + h), MARKER_COLOR);
    draw_line_segment_mut(frame, (x - h, y + h), (x + h, y - h), MARKER_COLOR);
}
