//! Adaptive crop box around the centroid.

use image::{GenericImageView, RgbImage};

use crate::blob::Centroid;
use crate::expected_size::PixelFootprint;

/// Margin added around the expected footprint.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    /// Margin on each side as a fraction of the expected width. The same
    /// margin is used for the vertical axis.
    pub buffer_factor: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self { buffer_factor: 0.5 }
    }
}

/// Crop box in frame pixels, `x1..x2` by `y1..y2` (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Roi {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Roi {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Copy the box out of `frame`.
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        frame
            .view(self.x1, self.y1, self.width(), self.height())
            .to_image()
    }

    /// Map a point from crop-local to frame coordinates.
    pub fn to_frame(&self, local: [f32; 2]) -> [f32; 2] {
        [local[0] + self.x1 as f32, local[1] + self.y1 as f32]
    }
}

/// Center a buffered box on `centroid`, or `None` when it leaves the frame.
///
/// Partially visible targets are skipped rather than clipped. A zero-area
/// box is also rejected.
pub fn extract_roi(
    centroid: Centroid,
    footprint: PixelFootprint,
    cfg: &RoiConfig,
    frame_size: [u32; 2],
) -> Option<Roi> {
    let w = footprint.width as f64;
    let h = footprint.height as f64;
    let buffer = w * cfg.buffer_factor;
    let half_w = w / 2.0 + buffer;
    let half_h = h / 2.0 + buffer;
    let (cx, cy) = (centroid.x as f64, centroid.y as f64);

    let x1 = (cx - half_w).ceil();
    let x2 = (cx + half_w).ceil();
    let y1 = (cy - half_h).ceil();
    let y2 = (cy + half_h).ceil();

    let [fw, fh] = frame_size;
    if !(x1 >= 0.0 && y1 >= 0.0 && x2 <= fw as f64 && y2 <= fh as f64) {
        tracing::debug!(
            "roi ({x1}, {y1})-({x2}, {y2}) leaves {fw}x{fh} frame; skipping refinement"
        );
        return None;
    }
    if x1 >= x2 || y1 >= y2 {
        return None;
    }
    Some(Roi {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn c(x: i32, y: i32) -> Centroid {
        Centroid { x, y }
    }

    #[test]
    fn box_is_footprint_plus_buffer() {
        let roi = extract_roi(
            c(200, 100),
            PixelFootprint::square(48),
            &RoiConfig::default(),
            [320, 240],
        )
        .expect("inside");
        assert_eq!(roi, Roi { x1: 152, y1: 52, x2: 248, y2: 148 });
        assert_eq!(roi.width(), 96);
    }

    #[test]
    fn vertical_margin_uses_width() {
        let fp = PixelFootprint {
            width: 20,
            height: 40,
        };
        let roi = extract_roi(c(100, 100), fp, &RoiConfig::default(), [400, 400]).expect("inside");
        assert_eq!((roi.x1, roi.x2), (80, 120));
        assert_eq!((roi.y1, roi.y2), (70, 130));
    }

    #[test]
    fn odd_footprint_rounds_up() {
        let roi = extract_roi(
            c(50, 50),
            PixelFootprint::square(11),
            &RoiConfig { buffer_factor: 0.0 },
            [100, 100],
        )
        .expect("inside");
        // 50 - 5.5 = 44.5 -> 45, 50 + 5.5 = 55.5 -> 56
        assert_eq!(roi, Roi { x1: 45, y1: 45, x2: 56, y2: 56 });
    }

    #[test]
    fn edge_touching_box_is_accepted() {
        let roi = extract_roi(
            c(24, 24),
            PixelFootprint::square(24),
            &RoiConfig::default(),
            [48, 48],
        );
        assert_eq!(roi, Some(Roi { x1: 0, y1: 0, x2: 48, y2: 48 }));
    }

    #[test]
    fn out_of_frame_box_is_rejected() {
        let fp = PixelFootprint::square(40);
        let cfg = RoiConfig::default();
        assert!(extract_roi(c(10, 100), fp, &cfg, [320, 240]).is_none());
        assert!(extract_roi(c(100, 10), fp, &cfg, [320, 240]).is_none());
        assert!(extract_roi(c(310, 100), fp, &cfg, [320, 240]).is_none());
        assert!(extract_roi(c(100, 230), fp, &cfg, [320, 240]).is_none());
    }

    #[test]
    fn empty_footprint_is_rejected() {
        let roi = extract_roi(
            c(50, 50),
            PixelFootprint::default(),
            &RoiConfig::default(),
            [100, 100],
        );
        assert!(roi.is_none());
    }

    #[test]
    fn accepted_boxes_are_always_inside_frame() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let cfg = RoiConfig::default();
        let mut accepted = 0;
        for _ in 0..2000 {
            let w = rng.gen_range(1..400u32);
            let h = rng.gen_range(1..400u32);
            let centroid = c(rng.gen_range(-20..420), rng.gen_range(-20..420));
            let fp = PixelFootprint {
                width: rng.gen_range(0..120),
                height: rng.gen_range(0..120),
            };
            if let Some(roi) = extract_roi(centroid, fp, &cfg, [w, h]) {
                accepted += 1;
                assert!(roi.x1 < roi.x2 && roi.y1 < roi.y2);
                assert!(roi.x2 <= w && roi.y2 <= h);
            }
        }
        assert!(accepted > 0);
    }

    #[test]
    fn crop_and_frame_mapping_agree() {
        let frame = RgbImage::from_fn(30, 20, |x, y| image::Rgb([x as u8, y as u8, 0]));
        let roi = Roi { x1: 5, y1: 4, x2: 15, y2: 10 };
        let crop = roi.crop(&frame);
        assert_eq!(crop.dimensions(), (10, 6));
        assert_eq!(crop.get_pixel(2, 3).0, [7, 7, 0]);
        assert_eq!(roi.to_frame([2.0, 3.0]), [7.0, 7.0]);
    }
}
