//! Depth lookup at the blob centroid.

use nalgebra::Vector3;

use crate::blob::Centroid;
use crate::camera::{DepthError, PointCloud};

/// A validated camera-frame point and its Euclidean distance.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthSample {
    /// `(X, Y, Z)` in millimetres. X right, Y down, Z forward.
    pub xyz_mm: [f64; 3],
    pub range_mm: f64,
}

/// Why a depth sample was discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidDepth {
    /// The accessor reported a failure status.
    Sensor(DepthError),
    /// The accessor reported success but returned NaN or infinite values.
    NonFinite,
}

impl std::fmt::Display for InvalidDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "{e}"),
            Self::NonFinite => write!(f, "depth sample is not finite"),
        }
    }
}

/// Read the point cloud at `at` and compute its range.
///
/// The returned values are checked for finiteness regardless of the
/// accessor status, because sensors report success with NaN depth.
pub fn sample_depth<C: PointCloud + ?Sized>(
    cloud: &C,
    at: Centroid,
) -> Result<DepthSample, InvalidDepth> {
    let raw = cloud.point_mm(at.x, at.y).map_err(InvalidDepth::Sensor)?;
    let p = Vector3::new(raw[0] as f64, raw[1] as f64, raw[2] as f64);
    let range_mm = p.norm();
    if !p.iter().all(|v| v.is_finite()) || !range_mm.is_finite() {
        return Err(InvalidDepth::NonFinite);
    }
    Ok(DepthSample {
        xyz_mm: [p.x, p.y, p.z],
        range_mm,
    })
}
