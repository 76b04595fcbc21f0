use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma, RgbImage};

use super::{
    CameraError, CameraInfo, CameraIntrinsics, DepthError, FrameId, GrabStatus, PointCloud,
    StereoCamera, View,
};

/// 16-bit depth image in millimetres.
pub type DepthMapMm = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Where replayed depth comes from.
#[derive(Debug, Clone)]
pub enum DepthSource {
    /// Fronto-parallel plane at a fixed distance, back-projected per pixel.
    Plane { depth_mm: f32 },
    /// Per-pixel Z in millimetres. Zero reads back as NaN with a success
    /// status, the way stereo sensors report unmatched pixels.
    Map(DepthMapMm),
}

/// Camera replaying still frames with an associated depth source.
///
/// Frames cycle in order. Only the left view exists.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    frames: Vec<RgbImage>,
    depth: DepthSource,
    intrinsics: CameraIntrinsics,
    fps: f32,
    opened: bool,
    cursor: usize,
    current: Option<usize>,
    next_id: u64,
}

impl ReplayCamera {
    /// Build from in-memory frames. All frames must share one size.
    pub fn new(
        frames: Vec<RgbImage>,
        depth: DepthSource,
        intrinsics: CameraIntrinsics,
    ) -> Result<Self, CameraError> {
        let first = frames
            .first()
            .ok_or_else(|| CameraError::InvalidSource("no frames to replay".to_string()))?;
        let size = first.dimensions();
        if frames.iter().any(|f| f.dimensions() != size) {
            return Err(CameraError::InvalidSource(
                "replay frames differ in size".to_string(),
            ));
        }
        if let DepthSource::Map(map) = &depth {
            if map.dimensions() != size {
                return Err(CameraError::InvalidSource(format!(
                    "depth map is {}x{}, frames are {}x{}",
                    map.width(),
                    map.height(),
                    size.0,
                    size.1
                )));
            }
        }
        if !intrinsics.is_valid() {
            return Err(CameraError::InvalidSource(
                "intrinsics must be finite with non-zero focal lengths".to_string(),
            ));
        }
        Ok(Self {
            frames,
            depth,
            intrinsics,
            fps: 15.0,
            opened: false,
            cursor: 0,
            current: None,
            next_id: 0,
        })
    }

    /// Load frames from image files.
    pub fn from_files(
        paths: &[PathBuf],
        depth: DepthSource,
        intrinsics: CameraIntrinsics,
    ) -> Result<Self, CameraError> {
        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            tracing::debug!("loading replay frame {}", path.display());
            frames.push(image::open(path)?.to_rgb8());
        }
        Self::new(frames, depth, intrinsics)
    }

    /// Load a 16-bit millimetre depth PNG.
    pub fn load_depth_map(path: &Path) -> Result<DepthSource, CameraError> {
        Ok(DepthSource::Map(image::open(path)?.to_luma16()))
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }
}

impl PointCloud for ReplayCamera {
    fn point_mm(&self, x: i32, y: i32) -> Result<[f32; 3], DepthError> {
        if self.current.is_none() {
            return Err(DepthError::SensorFailure { code: -1 });
        }
        let [w, h] = self.resolution();
        if x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
            return Err(DepthError::OutOfBounds { x, y });
        }
        let z_mm = match &self.depth {
            DepthSource::Plane { depth_mm } => *depth_mm as f64,
            DepthSource::Map(map) => match map.get_pixel(x as u32, y as u32)[0] {
                0 => return Ok([f32::NAN; 3]),
                z => z as f64,
            },
        };
        let p = self
            .intrinsics
            .back_project([x as f64, y as f64], z_mm)
            .ok_or(DepthError::SensorFailure { code: -2 })?;
        Ok([p[0] as f32, p[1] as f32, p[2] as f32])
    }
}

impl StereoCamera for ReplayCamera {
    fn open(&mut self) -> Result<CameraInfo, CameraError> {
        self.opened = true;
        self.cursor = 0;
        self.current = None;
        Ok(CameraInfo {
            resolution: self.resolution(),
            fps: self.fps,
            firmware: "replay".to_string(),
            serial: format!("replay-{}", self.frames.len()),
        })
    }

    fn grab(&mut self) -> Result<GrabStatus, CameraError> {
        if !self.opened {
            return Err(CameraError::NotOpen);
        }
        self.current = Some(self.cursor);
        self.cursor = (self.cursor + 1) % self.frames.len();
        let id = FrameId(self.next_id);
        self.next_id += 1;
        Ok(GrabStatus::Frame(id))
    }

    fn frame(&self, view: View) -> Result<&RgbImage, CameraError> {
        match (view, self.current) {
            (View::Left, Some(i)) => Ok(&self.frames[i]),
            (View::Left, None) => Err(CameraError::NotOpen),
            (View::Right, _) => Err(CameraError::ViewUnavailable(View::Right)),
        }
    }

    fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    fn resolution(&self) -> [u32; 2] {
        let (w, h) = self.frames[0].dimensions();
        [w, h]
    }

    fn close(&mut self) {
        self.opened = false;
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics {
            fx: 700.0,
            fy: 700.0,
            cx: 32.0,
            cy: 24.0,
        }
    }

    fn frames(n: usize) -> Vec<RgbImage> {
        (0..n)
            .map(|i| RgbImage::from_pixel(64, 48, image::Rgb([i as u8, 0, 0])))
            .collect()
    }

    #[test]
    fn grab_requires_open() {
        let mut cam =
            ReplayCamera::new(frames(1), DepthSource::Plane { depth_mm: 1000.0 }, intrinsics())
                .expect("camera");
        assert!(matches!(cam.grab(), Err(CameraError::NotOpen)));
        cam.open().expect("open");
        assert_eq!(cam.grab().expect("grab"), GrabStatus::Frame(FrameId(0)));
        cam.close();
        assert!(matches!(cam.grab(), Err(CameraError::NotOpen)));
    }

    #[test]
    fn frames_cycle_in_order() {
        let mut cam =
            ReplayCamera::new(frames(2), DepthSource::Plane { depth_mm: 1000.0 }, intrinsics())
                .expect("camera");
        cam.open().expect("open");
        let mut seen = Vec::new();
        for _ in 0..3 {
            cam.grab().expect("grab");
            seen.push(cam.frame(View::Left).expect("frame").get_pixel(0, 0)[0]);
        }
        assert_eq!(seen, vec![0, 1, 0]);
        assert!(cam.frame(View::Right).is_err());
    }

    #[test]
    fn plane_depth_back_projects() {
        let mut cam =
            ReplayCamera::new(frames(1), DepthSource::Plane { depth_mm: 1400.0 }, intrinsics())
                .expect("camera");
        cam.open().expect("open");
        cam.grab().expect("grab");
        let p = cam.point_mm(32 + 70, 24).expect("point");
        assert_abs_diff_eq!(p[0], 140.0, epsilon = 1e-3);
        assert_abs_diff_eq!(p[1], 0.0);
        assert_abs_diff_eq!(p[2], 1400.0);
        assert_eq!(
            cam.point_mm(-1, 3),
            Err(DepthError::OutOfBounds { x: -1, y: 3 })
        );
    }

    #[test]
    fn zero_depth_reads_as_nan_with_success_status() {
        let mut map = DepthMapMm::from_pixel(64, 48, Luma([900]));
        map.put_pixel(5, 5, Luma([0]));
        let mut cam =
            ReplayCamera::new(frames(1), DepthSource::Map(map), intrinsics()).expect("camera");
        cam.open().expect("open");
        cam.grab().expect("grab");
        let bad = cam.point_mm(5, 5).expect("success status");
        assert!(bad.iter().all(|v| v.is_nan()));
        let good = cam.point_mm(6, 5).expect("point");
        assert_abs_diff_eq!(good[2], 900.0);
    }

    #[test]
    fn mismatched_sources_are_rejected() {
        let map = DepthMapMm::new(10, 10);
        assert!(ReplayCamera::new(frames(1), DepthSource::Map(map), intrinsics()).is_err());
        assert!(ReplayCamera::new(
            Vec::new(),
            DepthSource::Plane { depth_mm: 1.0 },
            intrinsics()
        )
        .is_err());
    }
}
