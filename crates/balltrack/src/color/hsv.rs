//! RGB to HSV conversion using the 8-bit OpenCV channel convention.
//!
//! Hue is halved to fit a byte (`0..=179`), saturation and value span
//! `0..=255`.

use image::{ImageBuffer, Rgb, RgbImage};

/// Image whose three channels hold `(hue, saturation, value)`.
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Convert one RGB pixel to `[hue, saturation, value]`.
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

    let h_deg = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    let mut h = (h_deg * 0.5).round() as u16;
    if h >= 180 {
        h -= 180;
    }

    [h as u8, s.round() as u8, v as u8]
}

/// Convert a full frame to HSV.
pub fn to_hsv(frame: &RgbImage) -> HsvImage {
    let (w, h) = frame.dimensions();
    let mut out = HsvImage::new(w, h);
    for (dst, src) in out.pixels_mut().zip(frame.pixels()) {
        *dst = Rgb(rgb_to_hsv(src.0));
    }
    out
}
