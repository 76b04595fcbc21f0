//! Shared builders for unit tests: synthetic frames, depth and scripted I/O.

use std::collections::VecDeque;

use image::{GrayImage, Rgb, RgbImage};

use crate::camera::{
    CameraError, CameraInfo, CameraIntrinsics, DepthError, DepthSource, GrabStatus, PointCloud,
    ReplayCamera, StereoCamera, View,
};
use crate::pipeline::{FrameResult, PipelineStage};
use crate::session::{Controls, FrameSink};
use crate::tuner::DisplayMode;

/// Tennis-ball yellow-green; HSV `[38, 209, 220]`.
pub(crate) const BALL_RGB: [u8; 3] = [170, 220, 40];
pub(crate) const BACKGROUND_RGB: [u8; 3] = [20, 20, 20];

/// Dark frame with one filled disc of `BALL_RGB`.
///
/// A pixel belongs to the disc when its distance to `center` is at most
/// `radius`, so integer centres give a symmetric disc.
pub(crate) fn render_ball_frame(w: u32, h: u32, center: [f32; 2], radius: f32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - center[0];
        let dy = y as f32 - center[1];
        if dx * dx + dy * dy <= radius * radius {
            Rgb(BALL_RGB)
        } else {
            Rgb(BACKGROUND_RGB)
        }
    })
}

pub(crate) fn test_intrinsics() -> CameraIntrinsics {
    CameraIntrinsics {
        fx: 700.0,
        fy: 700.0,
        cx: 160.0,
        cy: 120.0,
    }
}

/// Fronto-parallel plane at a fixed depth.
pub(crate) struct PlaneCloud {
    intrinsics: CameraIntrinsics,
    depth_mm: f64,
}

impl PlaneCloud {
    pub(crate) fn new(intrinsics: CameraIntrinsics, depth_mm: f64) -> Self {
        Self {
            intrinsics,
            depth_mm,
        }
    }
}

impl PointCloud for PlaneCloud {
    fn point_mm(&self, x: i32, y: i32) -> Result<[f32; 3], DepthError> {
        let p = self
            .intrinsics
            .back_project([x as f64, y as f64], self.depth_mm)
            .ok_or(DepthError::SensorFailure { code: -1 })?;
        Ok([p[0] as f32, p[1] as f32, p[2] as f32])
    }
}

/// 320x240 replay of a ball at (200, 100), radius 24, one metre away.
pub(crate) fn replay_ball_camera() -> ReplayCamera {
    let frame = render_ball_frame(320, 240, [200.0, 100.0], 24.0);
    ReplayCamera::new(
        vec![frame],
        DepthSource::Plane { depth_mm: 1000.0 },
        test_intrinsics(),
    )
    .expect("valid replay")
}

/// Scripted outcome of one grab.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StepOutcome {
    Pass,
    Busy,
    Fail(i32),
}

/// Replay camera whose grabs follow a script, then pass forever.
pub(crate) struct ScriptedCamera {
    inner: ReplayCamera,
    script: VecDeque<StepOutcome>,
    open_error: Option<i32>,
    open: bool,
}

impl ScriptedCamera {
    pub(crate) fn new(inner: ReplayCamera, script: Vec<StepOutcome>) -> Self {
        Self {
            inner,
            script: script.into(),
            open_error: None,
            open: false,
        }
    }

    pub(crate) fn failing_open(mut self, code: i32) -> Self {
        self.open_error = Some(code);
        self
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }
}

impl PointCloud for ScriptedCamera {
    fn point_mm(&self, x: i32, y: i32) -> Result<[f32; 3], DepthError> {
        self.inner.point_mm(x, y)
    }
}

impl StereoCamera for ScriptedCamera {
    fn open(&mut self) -> Result<CameraInfo, CameraError> {
        if let Some(code) = self.open_error {
            return Err(CameraError::OpenFailed { code });
        }
        self.open = true;
        self.inner.open()
    }

    fn grab(&mut self) -> Result<GrabStatus, CameraError> {
        match self.script.pop_front().unwrap_or(StepOutcome::Pass) {
            StepOutcome::Pass => self.inner.grab(),
            StepOutcome::Busy => Ok(GrabStatus::Busy),
            StepOutcome::Fail(code) => Err(CameraError::GrabFailed { code }),
        }
    }

    fn frame(&self, view: View) -> Result<&RgbImage, CameraError> {
        self.inner.frame(view)
    }

    fn intrinsics(&self) -> CameraIntrinsics {
        self.inner.intrinsics()
    }

    fn resolution(&self) -> [u32; 2] {
        self.inner.resolution()
    }

    fn close(&mut self) {
        self.open = false;
        self.inner.close();
    }
}

/// Pre-recorded key polls and prompt answers.
///
/// Exhausted key polls return `None`; exhausted prompts report closed input.
pub(crate) struct ScriptedControls {
    keys: VecDeque<Option<u32>>,
    lines: VecDeque<String>,
    prompts: usize,
}

impl ScriptedControls {
    pub(crate) fn new(keys: Vec<Option<u32>>, lines: Vec<&str>) -> Self {
        Self {
            keys: keys.into(),
            lines: lines.into_iter().map(str::to_string).collect(),
            prompts: 0,
        }
    }

    pub(crate) fn prompts_seen(&self) -> usize {
        self.prompts
    }
}

impl Controls for ScriptedControls {
    fn poll_key(&mut self) -> Option<u32> {
        self.keys.pop_front().flatten()
    }

    fn prompt(&mut self, _message: &str) -> Option<String> {
        self.prompts += 1;
        self.lines.pop_front()
    }
}

/// Sink that remembers what it was shown.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) messages: Vec<String>,
    /// Display mode and lit pixel count of every mask shown.
    pub(crate) masks: Vec<(DisplayMode, usize)>,
    pub(crate) stages: Vec<PipelineStage>,
}

impl FrameSink for RecordingSink {
    fn show_detection(&mut self, _frame: &RgbImage, result: &FrameResult) {
        self.stages.push(result.stage);
    }

    fn show_mask(&mut self, mask: &GrayImage, mode: DisplayMode) {
        let lit = mask.pixels().filter(|p| p[0] > 0).count();
        self.masks.push((mode, lit));
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}
