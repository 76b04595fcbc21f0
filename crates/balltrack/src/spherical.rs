//! Camera-frame XYZ to range/azimuth/elevation.

use nalgebra::Vector3;

/// Target position relative to the camera.
///
/// Azimuth is positive toward the right, elevation positive upward.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SphericalCoord {
    pub range_mm: f64,
    pub azimuth_rad: f64,
    pub elevation_rad: f64,
}

impl SphericalCoord {
    pub fn range_m(&self) -> f64 {
        self.range_mm / 1000.0
    }

    pub fn azimuth_deg(&self) -> f64 {
        self.azimuth_rad.to_degrees()
    }

    pub fn elevation_deg(&self) -> f64 {
        self.elevation_rad.to_degrees()
    }
}

impl std::fmt::Display for SphericalCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "distance: {:.2} m, rotate: {:.2} deg, elevate: {:.2} deg",
            self.range_m(),
            self.azimuth_deg(),
            self.elevation_deg()
        )
    }
}

/// Convert `(X, Y, Z)` with X right, Y down, Z forward.
///
/// The origin maps to all zeros.
pub fn camera_to_spherical(xyz_mm: [f64; 3]) -> SphericalCoord {
    let p = Vector3::from(xyz_mm);
    let horizontal = p.x.hypot(p.z);
    // Y points down; keep a level target at +0 rather than -0.
    let elevation_rad = if p.y == 0.0 {
        0.0
    } else {
        -p.y.atan2(horizontal)
    };
    SphericalCoord {
        range_mm: p.norm(),
        azimuth_rad: p.x.atan2(p.z),
        elevation_rad,
    }
}
