//! balltrack — colour-and-depth tennis ball tracker for stereo cameras.
//!
//! Each frame passes through these stages:
//!
//! 1. **Segment** – HSV threshold plus erosion/dilation cleanup.
//! 2. **Blob** – largest outer contour, polygon-moment centroid and minimum
//!    enclosing circle.
//! 3. **Range** – point-cloud lookup at the centroid, rejecting failed and
//!    non-finite samples.
//! 4. **Size** – pinhole projection of the known ball diameter at that range.
//! 5. **ROI** – buffered crop box, skipped when it leaves the frame.
//! 6. **Circle** – gradient Hough search in a radius band around the
//!    expected radius.
//! 7. **Spherical** – range/azimuth/elevation of the centroid's 3D point.
//!
//! [`DetectionPipeline`] runs them and reports the stage each frame reached.
//! [`HsvTuner`] is the live filter calibration state machine, and the
//! [`session`] drivers connect both to a [`StereoCamera`] and an operator.

mod blob;
mod camera;
mod color;
mod config;
mod expected_size;
mod hough;
pub mod overlay;
mod pipeline;
mod range;
mod roi;
pub mod session;
mod spherical;
mod tuner;

#[cfg(test)]
pub(crate) mod test_utils;

pub use blob::{
    detect_largest_blob, external_contours, Blob, Centroid, Contour, EnclosingCircle, Moments,
};
pub use camera::{
    CameraError, CameraInfo, CameraIntrinsics, DepthError, DepthMapMm, DepthSource, FocalLengths,
    FrameId, GrabStatus, NoDepth, PointCloud, ReplayCamera, StereoCamera, View,
};
pub use color::{
    rgb_to_hsv, segment, threshold_hsv, to_hsv, ColorRange, FilterParams, HsvChannel, HsvImage,
    MaskStages, MorphologyConfig,
};
pub use config::{ConfigError, PipelineMode, TrackerConfig};
pub use expected_size::{ExpectedSizeModel, PixelFootprint, TENNIS_BALL_DIAMETER_MM};
pub use hough::{find_circles, refine_in_roi, HoughCircle, HoughConfig};
pub use pipeline::{
    BlobObservation, Confidence, Detection, DetectionPipeline, FrameResult, PipelineStage,
};
pub use range::{sample_depth, DepthSample, InvalidDepth};
pub use roi::{extract_roi, Roi, RoiConfig};
pub use spherical::{camera_to_spherical, SphericalCoord};
pub use tuner::{
    ConfirmAnswer, DisplayMode, HsvTuner, MenuCommand, ParamSlot, TunerCommand, TunerNotice,
    TunerState, MENU_HELP, TUNER_HELP,
};
