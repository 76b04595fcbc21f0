//! Gradient Hough circle search inside the region of interest.
//!
//! Every Canny edge pixel votes along its gradient direction (both senses)
//! for centres at every radius in the band. Accumulator peaks above the
//! vote threshold become centre candidates; each candidate's radius is the
//! most supported edge distance within the band.

use image::{GrayImage, RgbImage};

/// Circle search parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Radius search band as multiples of the expected radius.
    pub radius_band: [f32; 2],
    /// Minimum distance between accepted centres (pixels).
    pub min_center_dist_px: f32,
    /// Upper Canny hysteresis threshold.
    pub canny_high: f32,
    /// Lower Canny hysteresis threshold.
    pub canny_low: f32,
    /// Votes a centre needs, and edge pixels a radius needs.
    pub accumulator_threshold: u32,
    /// Cap on returned candidates.
    pub max_circles: usize,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            radius_band: [0.8, 1.2],
            min_center_dist_px: 1.0,
            canny_high: 200.0,
            canny_low: 100.0,
            accumulator_threshold: 15,
            max_circles: 16,
        }
    }
}

impl HoughConfig {
    /// Integer radius search range for `expected_radius`, never below 1 px.
    pub fn radius_bounds(&self, expected_radius: u32) -> (u32, u32) {
        let r = expected_radius as f32;
        let lo = (self.radius_band[0] * r).floor().max(1.0) as u32;
        let hi = (self.radius_band[1] * r).ceil().max(lo as f32) as u32;
        (lo, hi)
    }
}

/// A detected circle with its accumulator support.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HoughCircle {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub votes: u32,
}

/// Search `crop` for circles near `expected_radius`.
///
/// Candidates are in crop coordinates, best first.
pub fn refine_in_roi(crop: &RgbImage, expected_radius: u32, cfg: &HoughConfig) -> Vec<HoughCircle> {
    let gray = image::imageops::grayscale(crop);
    let (r_min, r_max) = cfg.radius_bounds(expected_radius);
    tracing::trace!(
        "hough search {}x{} crop, radius band [{r_min}, {r_max}]",
        gray.width(),
        gray.height()
    );
    find_circles(&gray, r_min, r_max, cfg)
}

/// Find circles with radius in `[r_min, r_max]`, sorted by votes descending.
pub fn find_circles(gray: &GrayImage, r_min: u32, r_max: u32, cfg: &HoughConfig) -> Vec<HoughCircle> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 || r_max < r_min || r_min == 0 {
        return Vec::new();
    }

    let edges = imageproc::edges::canny(gray, cfg.canny_low, cfg.canny_high);
    let smoothed = imageproc::filter::gaussian_blur_f32(gray, 1.4);
    let gx = imageproc::gradients::horizontal_sobel(&smoothed);
    let gy = imageproc::gradients::vertical_sobel(&smoothed);

    let stride = w as usize;
    let mut edge_points = Vec::new();
    let mut accum = vec![0u32; stride * h as usize];

    for (x, y, p) in edges.enumerate_pixels() {
        if p[0] == 0 {
            continue;
        }
        edge_points.push([x as f32, y as f32]);
        let gxv = gx.get_pixel(x, y)[0] as f32;
        let gyv = gy.get_pixel(x, y)[0] as f32;
        let mag = gxv.hypot(gyv);
        if mag < 1e-3 {
            continue;
        }
        let (dx, dy) = (gxv / mag, gyv / mag);

        for sign in [1.0f32, -1.0] {
            let mut last = None;
            for r in r_min..=r_max {
                let vx = (x as f32 + sign * dx * r as f32).round();
                let vy = (y as f32 + sign * dy * r as f32).round();
                if vx < 0.0 || vy < 0.0 || vx >= w as f32 || vy >= h as f32 {
                    break;
                }
                let idx = vy as usize * stride + vx as usize;
                // One vote per cell per ray.
                if last != Some(idx) {
                    accum[idx] += 1;
                    last = Some(idx);
                }
            }
        }
    }

    let mut centers = Vec::new();
    for y in 1..h as usize - 1 {
        for x in 1..stride - 1 {
            let idx = y * stride + x;
            let v = accum[idx];
            if v > cfg.accumulator_threshold
                && v > accum[idx - 1]
                && v >= accum[idx + 1]
                && v > accum[idx - stride]
                && v >= accum[idx + stride]
            {
                centers.push((idx, v));
            }
        }
    }
    centers.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let min_dist_sq = cfg.min_center_dist_px * cfg.min_center_dist_px;
    let mut circles: Vec<HoughCircle> = Vec::new();
    for (idx, votes) in centers {
        if circles.len() >= cfg.max_circles {
            break;
        }
        let cx = (idx % stride) as f32;
        let cy = (idx / stride) as f32;
        let too_close = circles.iter().any(|c| {
            let (ddx, ddy) = (c.x - cx, c.y - cy);
            ddx * ddx + ddy * ddy < min_dist_sq
        });
        if too_close {
            continue;
        }
        if let Some(r) = best_radius(&edge_points, [cx, cy], r_min, r_max, cfg.accumulator_threshold)
        {
            circles.push(HoughCircle {
                x: cx,
                y: cy,
                r,
                votes,
            });
        }
    }
    circles
}

/// Most supported edge distance from `center`, or `None` below `min_support`.
///
/// Only distances inside `[r_min, r_max]` count. They are binned to whole
/// pixels and the winning bin's mean distance is returned, so the result
/// never leaves the band. Ties keep the smaller radius.
fn best_radius(
    edge_points: &[[f32; 2]],
    center: [f32; 2],
    r_min: u32,
    r_max: u32,
    min_support: u32,
) -> Option<f32> {
    let bins = (r_max - r_min + 1) as usize;
    let mut count = vec![0u32; bins];
    let mut sum = vec![0.0f32; bins];
    for p in edge_points {
        let d = (p[0] - center[0]).hypot(p[1] - center[1]);
        if d < r_min as f32 || d > r_max as f32 {
            continue;
        }
        let b = d.round() as usize - r_min as usize;
        count[b] += 1;
        sum[b] += d;
    }
    let (b, &n) = count
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
    if n < min_support || n == 0 {
        return None;
    }
    Some((sum[b] / n as f32).clamp(r_min as f32, r_max as f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::render_ball_frame;

    #[test]
    fn radius_bounds_follow_band() {
        let cfg = HoughConfig::default();
        assert_eq!(cfg.radius_bounds(24), (19, 29));
        assert_eq!(cfg.radius_bounds(0), (1, 1));
    }

    #[test]
    fn finds_single_disc_in_crop() {
        let crop = render_ball_frame(96, 96, [48.0, 47.0], 24.0);
        let circles = refine_in_roi(&crop, 24, &HoughConfig::default());
        let best = circles.first().expect("circle found");
        assert!((best.x - 48.0).abs() <= 2.0, "x = {}", best.x);
        assert!((best.y - 47.0).abs() <= 2.0, "y = {}", best.y);
        assert!(best.r >= 19.0 && best.r <= 29.0, "r = {}", best.r);
        assert!(best.votes > 15);
    }

    #[test]
    fn candidates_are_sorted_by_votes() {
        let crop = render_ball_frame(96, 96, [48.0, 48.0], 22.0);
        let circles = refine_in_roi(&crop, 22, &HoughConfig::default());
        assert!(circles.windows(2).all(|w| w[0].votes >= w[1].votes));
        assert!(circles.len() <= HoughConfig::default().max_circles);
    }

    #[test]
    fn flat_crop_has_no_circle() {
        let flat = GrayImage::from_pixel(64, 64, image::Luma([120]));
        assert!(find_circles(&flat, 10, 20, &HoughConfig::default()).is_empty());
    }

    #[test]
    fn radius_far_outside_band_is_not_reported() {
        let cfg = HoughConfig::default();
        let (lo, hi) = cfg.radius_bounds(8);
        let crop = render_ball_frame(96, 96, [48.0, 48.0], 30.0);
        let circles = refine_in_roi(&crop, 8, &cfg);
        for c in &circles {
            assert!(c.r >= lo as f32 && c.r <= hi as f32, "r = {} outside [{lo}, {hi}]", c.r);
        }
    }

    #[test]
    fn reported_radius_stays_inside_search_band() {
        let cfg = HoughConfig::default();
        for true_r in (14..=32).step_by(2) {
            let crop = render_ball_frame(96, 96, [48.0, 48.0], true_r as f32);
            for expected in (10..=30).step_by(5) {
                let (lo, hi) = cfg.radius_bounds(expected);
                for c in refine_in_roi(&crop, expected, &cfg) {
                    assert!(
                        c.r >= lo as f32 && c.r <= hi as f32,
                        "disc r={true_r}, search [{lo}, {hi}], reported r={}",
                        c.r
                    );
                }
            }
        }
    }

    #[test]
    fn radius_histogram_ignores_distances_past_band_edges() {
        // All edge points sit 0.4 px beyond r_max; rounding would put them
        // in the last bin.
        let points: Vec<[f32; 2]> = (0..40)
            .map(|i| {
                let a = i as f32 * std::f32::consts::TAU / 40.0;
                [10.4 * a.cos(), 10.4 * a.sin()]
            })
            .collect();
        assert_eq!(best_radius(&points, [0.0, 0.0], 6, 10, 15), None);

        let inside: Vec<[f32; 2]> = points.iter().map(|p| [p[0] * 0.95, p[1] * 0.95]).collect();
        let r = best_radius(&inside, [0.0, 0.0], 6, 10, 15).expect("supported radius");
        assert!((6.0..=10.0).contains(&r), "r = {r}");
    }

    #[test]
    fn degenerate_inputs_return_nothing() {
        let tiny = GrayImage::new(2, 2);
        assert!(find_circles(&tiny, 1, 3, &HoughConfig::default()).is_empty());
        let img = GrayImage::new(32, 32);
        assert!(find_circles(&img, 5, 4, &HoughConfig::default()).is_empty());
    }
}
