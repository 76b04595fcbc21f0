//! Interactive drivers: tracking loop, filter tuning loop and main menu.
//!
//! Input arrives through [`Controls`] (single key polls during a live loop,
//! whole-line prompts otherwise) and output leaves through a [`FrameSink`].
//! Exactly one frame is in flight at a time; the loops own the camera for
//! their duration and close it on exit.

use image::{GrayImage, RgbImage};

use crate::camera::{CameraError, GrabStatus, StereoCamera, View};
use crate::color::{segment, FilterParams};
use crate::pipeline::{DetectionPipeline, FrameResult};
use crate::tuner::{
    ConfirmAnswer, DisplayMode, HsvTuner, MenuCommand, TunerCommand, TunerNotice, MENU_HELP,
    TUNER_HELP,
};

const QUIT_KEY: u32 = 'q' as u32;

/// Operator input channel.
pub trait Controls {
    /// Key pressed since the last poll, if any. Must not block.
    fn poll_key(&mut self) -> Option<u32>;
    /// Show `message` and read one line. `None` means the input is closed.
    fn prompt(&mut self, message: &str) -> Option<String>;
}

/// Operator output channel.
pub trait FrameSink {
    /// A processed frame and what the pipeline found in it.
    fn show_detection(&mut self, _frame: &RgbImage, _result: &FrameResult) {}
    /// The mask stage currently selected in the tuner.
    fn show_mask(&mut self, _mask: &GrayImage, _mode: DisplayMode) {}
    /// Text for the operator.
    fn message(&mut self, text: &str);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn message(&mut self, _text: &str) {}
}

/// Counters and last result of one tracking run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct TrackingSummary {
    pub frames: u64,
    pub busy_polls: u64,
    pub confirmed: u64,
    pub color_only: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<FrameResult>,
}

/// Grab and process frames until `q` is pressed or `max_frames` have been
/// processed.
///
/// `Busy` grabs are skipped. Open and grab failures end the run with an
/// error; every per-frame detection failure is reported and skipped.
pub fn run_tracking<Cam: StereoCamera + ?Sized>(
    camera: &mut Cam,
    pipeline: &DetectionPipeline,
    controls: &mut dyn Controls,
    sink: &mut dyn FrameSink,
    max_frames: Option<u64>,
) -> Result<TrackingSummary, CameraError> {
    let info = camera.open()?;
    tracing::info!(
        "camera open: {}x{} @ {} fps, serial {}",
        info.resolution[0],
        info.resolution[1],
        info.fps,
        info.serial
    );
    sink.message(&info.to_string());

    let mut summary = TrackingSummary::default();
    loop {
        if max_frames.is_some_and(|max| summary.frames >= max) {
            break;
        }
        match camera.grab() {
            Ok(GrabStatus::Frame(id)) => {
                let result = process_current(&*camera, pipeline);
                let result = match result {
                    Ok(r) => r,
                    Err(e) => {
                        camera.close();
                        return Err(e);
                    }
                };
                summary.frames += 1;
                if result.is_confirmed() {
                    summary.confirmed += 1;
                } else if result.stage.has_detection() {
                    summary.color_only += 1;
                }
                tracing::trace!(
                    "frame {} -> {:?}, position {:?}",
                    id.0,
                    result.stage,
                    result.spherical()
                );
                if let Some(report) = result.detection.as_ref().and_then(|d| d.report()) {
                    sink.message(&report);
                }
                if let Ok(frame) = camera.frame(View::Left) {
                    sink.show_detection(frame, &result);
                }
                summary.last = Some(result);
            }
            Ok(GrabStatus::Busy) => summary.busy_polls += 1,
            Err(e) => {
                tracing::warn!("grab failed: {e}");
                camera.close();
                return Err(e);
            }
        }
        if controls.poll_key() == Some(QUIT_KEY) {
            break;
        }
    }

    camera.close();
    tracing::info!(
        "tracking stopped after {} frames ({} confirmed, {} colour-only)",
        summary.frames,
        summary.confirmed,
        summary.color_only
    );
    Ok(summary)
}

fn process_current<Cam: StereoCamera + ?Sized>(
    camera: &Cam,
    pipeline: &DetectionPipeline,
) -> Result<FrameResult, CameraError> {
    let frame = camera.frame(View::Left)?;
    let focal = camera.intrinsics().focal_lengths();
    Ok(pipeline.process(frame, camera, focal))
}

/// Live filter calibration against the camera feed.
///
/// Returns the tuned values when the operator confirms saving on quit,
/// otherwise `defaults` unchanged. Closed input discards.
pub fn run_tuner<Cam: StereoCamera + ?Sized>(
    camera: &mut Cam,
    defaults: FilterParams,
    median_blur_radius: u32,
    controls: &mut dyn Controls,
    sink: &mut dyn FrameSink,
) -> Result<FilterParams, CameraError> {
    let info = camera.open()?;
    sink.message(&info.to_string());
    sink.message(TUNER_HELP);
    let mut tuner = HsvTuner::new(defaults);

    loop {
        match camera.grab() {
            Ok(GrabStatus::Frame(_)) => {
                let state = *tuner.state();
                let masks = match camera.frame(View::Left) {
                    Ok(frame) => segment(frame, &state.params, median_blur_radius),
                    Err(e) => {
                        camera.close();
                        return Err(e);
                    }
                };
                sink.show_mask(masks.stage(state.display), state.display);
            }
            Ok(GrabStatus::Busy) => {}
            Err(e) => {
                camera.close();
                return Err(e);
            }
        }

        let Some(cmd) = controls.poll_key().and_then(TunerCommand::from_key_code) else {
            continue;
        };
        match tuner.handle(cmd) {
            TunerNotice::ConfirmSave => {
                camera.close();
                let persist = ask_to_save(controls, sink);
                return Ok(tuner.finish(persist));
            }
            notice => sink.message(&notice.to_string()),
        }
    }
}

fn ask_to_save(controls: &mut dyn Controls, sink: &mut dyn FrameSink) -> bool {
    let question = TunerNotice::ConfirmSave.to_string();
    loop {
        let Some(line) = controls.prompt(&question) else {
            return false;
        };
        match ConfirmAnswer::parse(&line) {
            Some(answer) => return answer == ConfirmAnswer::Persist,
            None => sink.message("Please answer Y or N."),
        }
    }
}

/// Outcome of a whole interactive session.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SessionSummary {
    /// Filter in effect at exit.
    pub filter: FilterParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<FrameResult>,
}

/// Main menu: `r` track, `v` tune, `h` help, `q` quit.
///
/// Confirmed tuner values replace the pipeline's filter for later runs.
pub fn run_menu<Cam: StereoCamera + ?Sized>(
    camera: &mut Cam,
    pipeline: &mut DetectionPipeline,
    controls: &mut dyn Controls,
    sink: &mut dyn FrameSink,
    max_frames: Option<u64>,
) -> Result<SessionSummary, CameraError> {
    sink.message(MENU_HELP);
    let mut last_result = None;
    loop {
        let Some(line) = controls.prompt("Enter command:") else {
            break;
        };
        match MenuCommand::parse(&line) {
            Some(MenuCommand::RunDetection) => {
                let summary = run_tracking(camera, pipeline, controls, sink, max_frames)?;
                if summary.last.is_some() {
                    last_result = summary.last;
                }
                sink.message(MENU_HELP);
            }
            Some(MenuCommand::AdjustFilter) => {
                let cfg = pipeline.config();
                let filter = run_tuner(
                    camera,
                    cfg.filter,
                    cfg.median_blur_radius,
                    controls,
                    sink,
                )?;
                sink.message(&filter.to_string());
                pipeline.set_filter(filter);
                sink.message(MENU_HELP);
            }
            Some(MenuCommand::Help) => sink.message(MENU_HELP),
            Some(MenuCommand::Quit) => break,
            None => sink.message("Unknown command."),
        }
    }
    tracing::info!("exiting");
    Ok(SessionSummary {
        filter: pipeline.config().filter,
        last_result,
    })
}
