//! Largest-blob selection on a binary mask.
//!
//! Contours come from `imageproc`'s border following and are converted to
//! this crate's [`Contour`] immediately. Area and centroid use polygon
//! moments of the border (Green's theorem), so thin or single-pixel regions
//! have zero area and no centroid.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Closed border of one connected mask region, in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<[i32; 2]>,
}

/// Integer pixel location of a region's centre of mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Centroid {
    pub x: i32,
    pub y: i32,
}

/// Zeroth and first-order polygon moments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

/// Smallest circle containing every contour point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnclosingCircle {
    pub center: [f32; 2],
    pub radius: f32,
}

/// Largest region of a mask.
#[derive(Debug, Clone)]
pub struct Blob {
    pub contour: Contour,
    pub area: f64,
    /// `None` when the region's area moment is exactly zero.
    pub centroid: Option<Centroid>,
    pub coarse_circle: EnclosingCircle,
}

impl Contour {
    /// Polygon moments over the closed border.
    pub fn moments(&self) -> Moments {
        let [s00, s10, s01] = self.raw_moments();
        Moments {
            m00: s00 as f64 / 2.0,
            m10: s10 as f64 / 6.0,
            m01: s01 as f64 / 6.0,
        }
    }

    /// Enclosed polygon area in pixels².
    pub fn area(&self) -> f64 {
        self.moments().m00
    }

    /// Centre of mass truncated to integer pixels, or `None` for zero area.
    pub fn centroid(&self) -> Option<Centroid> {
        let [s00, s10, s01] = self.raw_moments();
        if s00 == 0 {
            return None;
        }
        // One division of exact integer sums keeps symmetric regions exact.
        let denom = 3.0 * s00 as f64;
        Some(Centroid {
            x: (s10 as f64 / denom) as i32,
            y: (s01 as f64 / denom) as i32,
        })
    }

    /// Doubled area and sextupled first moments, normalized to positive area.
    fn raw_moments(&self) -> [i64; 3] {
        let n = self.points.len();
        if n < 3 {
            return [0; 3];
        }
        let mut s00 = 0i64;
        let mut s10 = 0i64;
        let mut s01 = 0i64;
        let mut prev = self.points[n - 1];
        for &p in &self.points {
            let (xp, yp) = (prev[0] as i64, prev[1] as i64);
            let (x, y) = (p[0] as i64, p[1] as i64);
            let a = xp * y - x * yp;
            s00 += a;
            s10 += a * (xp + x);
            s01 += a * (yp + y);
            prev = p;
        }
        if s00 < 0 {
            [-s00, -s10, -s01]
        } else {
            [s00, s10, s01]
        }
    }

    /// Minimum enclosing circle, `None` for an empty contour.
    pub fn min_enclosing_circle(&self) -> Option<EnclosingCircle> {
        if self.points.is_empty() {
            return None;
        }
        let pts: Vec<Point<i32>> = self.points.iter().map(|p| Point::new(p[0], p[1])).collect();
        let hull = imageproc::geometry::convex_hull(pts.as_slice());
        let hull: Vec<[f64; 2]> = if hull.is_empty() {
            self.points.iter().map(|p| [p[0] as f64, p[1] as f64]).collect()
        } else {
            hull.iter().map(|p| [p.x as f64, p.y as f64]).collect()
        };
        let (c, r) = welzl_iterative(&hull);
        Some(EnclosingCircle {
            center: [c[0] as f32, c[1] as f32],
            radius: r as f32,
        })
    }
}

/// Outer borders of top-level regions in `mask` (non-zero = foreground).
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .map(|c| Contour {
            points: c.points.iter().map(|p| [p.x, p.y]).collect(),
        })
        .collect()
}

/// Pick the contour with the largest enclosed area.
///
/// Ties keep the first contour in border-following order, so identical
/// masks always produce the same blob.
pub fn detect_largest_blob(mask: &GrayImage) -> Option<Blob> {
    let mut best: Option<(Contour, f64)> = None;
    for contour in external_contours(mask) {
        let area = contour.area();
        match &best {
            Some((_, best_area)) if area <= *best_area => {}
            _ => best = Some((contour, area)),
        }
    }

    let (contour, area) = best?;
    let coarse_circle = contour.min_enclosing_circle()?;
    let centroid = contour.centroid();
    if centroid.is_none() {
        tracing::debug!(
            "largest contour ({} points) has zero area moment; no centroid",
            contour.points.len()
        );
    }

    Some(Blob {
        contour,
        area,
        centroid,
        coarse_circle,
    })
}

fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

fn circle_from_two(a: [f64; 2], b: [f64; 2]) -> ([f64; 2], f64) {
    let c = [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5];
    (c, dist2(a, c).sqrt())
}

fn circle_from_three(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> ([f64; 2], f64) {
    let bx = b[0] - a[0];
    let by = b[1] - a[1];
    let cx = c[0] - a[0];
    let cy = c[1] - a[1];
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < 1e-12 {
        // Collinear: the widest pair spans the others.
        let candidates = [circle_from_two(a, b), circle_from_two(a, c), circle_from_two(b, c)];
        return candidates
            .into_iter()
            .fold(([0.0, 0.0], -1.0), |acc, cand| if cand.1 > acc.1 { cand } else { acc });
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    let center = [a[0] + ux, a[1] + uy];
    (center, (ux * ux + uy * uy).sqrt())
}

/// Deterministic incremental Welzl over a small point set.
fn welzl_iterative(pts: &[[f64; 2]]) -> ([f64; 2], f64) {
    const EPS: f64 = 1e-7;
    let inside = |c: &([f64; 2], f64), p: [f64; 2]| dist2(c.0, p).sqrt() <= c.1 + EPS;

    let mut circle = (pts[0], 0.0);
    for i in 1..pts.len() {
        if inside(&circle, pts[i]) {
            continue;
        }
        circle = (pts[i], 0.0);
        for j in 0..i {
            if inside(&circle, pts[j]) {
                continue;
            }
            circle = circle_from_two(pts[i], pts[j]);
            for k in 0..j {
                if !inside(&circle, pts[k]) {
                    circle = circle_from_three(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    circle
}
