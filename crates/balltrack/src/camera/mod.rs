//! Stereo-camera collaborator contract and pinhole intrinsics.
//!
//! The detector never drives hardware itself. Anything that can grab a
//! frame, hand out the left view and answer point-cloud lookups in
//! millimetres implements [`StereoCamera`]. [`ReplayCamera`] is the built-in
//! implementation backed by image files and a synthetic or recorded depth
//! source.

mod replay;

pub use replay::{DepthMapMm, DepthSource, ReplayCamera};

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics of the left lens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length in x (pixels).
    pub fx: f64,
    /// Focal length in y (pixels).
    pub fy: f64,
    /// Principal point x (pixels).
    pub cx: f64,
    /// Principal point y (pixels).
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Returns `true` when all parameters are finite and focal lengths non-zero.
    pub fn is_valid(self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    pub fn focal_lengths(self) -> FocalLengths {
        FocalLengths {
            fx: self.fx,
            fy: self.fy,
        }
    }

    /// Back-project a pixel at depth `z_mm` into camera coordinates (mm).
    ///
    /// X points right, Y down, Z forward.
    pub fn back_project(self, pixel_xy: [f64; 2], z_mm: f64) -> Option<[f64; 3]> {
        if !self.is_valid() {
            return None;
        }
        let x = (pixel_xy[0] - self.cx) / self.fx * z_mm;
        let y = (pixel_xy[1] - self.cy) / self.fy * z_mm;
        Some([x, y, z_mm])
    }
}

/// Horizontal and vertical focal lengths in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FocalLengths {
    pub fx: f64,
    pub fy: f64,
}

impl FocalLengths {
    pub fn is_valid(self) -> bool {
        self.fx.is_finite() && self.fy.is_finite() && self.fx > 0.0 && self.fy > 0.0
    }
}

/// Which lens a frame is retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    Left,
    Right,
}

/// Monotonic identifier of a grabbed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

/// Non-error outcomes of [`StereoCamera::grab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabStatus {
    /// A new frame and its point cloud are ready.
    Frame(FrameId),
    /// The device had nothing new; try again on the next poll.
    Busy,
}

/// Static device description reported when the camera opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub resolution: [u32; 2],
    pub fps: f32,
    pub firmware: String,
    pub serial: String,
}

impl std::fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Resolution: {}, {}.", self.resolution[0], self.resolution[1])?;
        writeln!(f, "Camera FPS: {}.", self.fps)?;
        writeln!(f, "Firmware: {}.", self.firmware)?;
        write!(f, "Serial number: {}.", self.serial)
    }
}

/// Sensor-level failures. Any of these aborts the current session.
#[derive(Debug)]
pub enum CameraError {
    /// The device refused to open.
    OpenFailed { code: i32 },
    /// A grab reported an error status.
    GrabFailed { code: i32 },
    /// An operation was attempted before `open` or after `close`.
    NotOpen,
    /// The requested view has no frame.
    ViewUnavailable(View),
    /// Reading a replay source failed.
    Io(std::io::Error),
    /// Decoding a replay source failed.
    Decode(image::ImageError),
    /// A replay source is malformed.
    InvalidSource(String),
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenFailed { code } => write!(f, "camera open failed (status {code})"),
            Self::GrabFailed { code } => write!(f, "frame grab failed (status {code})"),
            Self::NotOpen => write!(f, "camera is not open"),
            Self::ViewUnavailable(view) => write!(f, "no frame available for {view:?} view"),
            Self::Io(e) => write!(f, "camera source i/o error: {e}"),
            Self::Decode(e) => write!(f, "camera source decode error: {e}"),
            Self::InvalidSource(msg) => write!(f, "invalid camera source: {msg}"),
        }
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CameraError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for CameraError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e)
    }
}

/// Status reported by a point-cloud lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthError {
    /// The sensor flagged the measurement as failed.
    SensorFailure { code: i32 },
    /// The pixel lies outside the point cloud.
    OutOfBounds { x: i32, y: i32 },
}

impl std::fmt::Display for DepthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SensorFailure { code } => write!(f, "depth sensor failure (status {code})"),
            Self::OutOfBounds { x, y } => write!(f, "pixel ({x}, {y}) outside point cloud"),
        }
    }
}

impl std::error::Error for DepthError {}

/// Dense XYZ lookup aligned with the left view.
///
/// A successful lookup may still carry NaN or infinite components; callers
/// must validate the values independently of the status.
pub trait PointCloud {
    /// Camera-frame point (mm) seen at pixel `(x, y)`.
    fn point_mm(&self, x: i32, y: i32) -> Result<[f32; 3], DepthError>;
}

/// Point cloud that never has a measurement (colour-only operation).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDepth;

impl PointCloud for NoDepth {
    fn point_mm(&self, _x: i32, _y: i32) -> Result<[f32; 3], DepthError> {
        Err(DepthError::SensorFailure { code: -1 })
    }
}

/// A stereo camera with an aligned point cloud.
///
/// Exactly one frame is in flight at a time: `frame` and the
/// [`PointCloud`] lookups refer to the most recent successful `grab`.
pub trait StereoCamera: PointCloud {
    fn open(&mut self) -> Result<CameraInfo, CameraError>;
    fn grab(&mut self) -> Result<GrabStatus, CameraError>;
    fn frame(&self, view: View) -> Result<&RgbImage, CameraError>;
    fn intrinsics(&self) -> CameraIntrinsics;
    fn resolution(&self) -> [u32; 2];
    fn close(&mut self);
}
