//! balltrack CLI — interactive tennis ball tracking and HSV filter tuning.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use balltrack::session::{self, Controls, FrameSink};
use balltrack::{
    CameraIntrinsics, DepthSource, DetectionPipeline, DisplayMode, FrameResult, ReplayCamera,
    TrackerConfig,
};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, RgbImage};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "balltrack")]
#[command(about = "Locate a tennis ball in stereo frames and report range, azimuth and elevation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu: run detection (r), adjust the HSV filter (v), help (h), quit (q).
    Run(CliRunArgs),

    /// Process frames without interaction and write the results.
    Track(CliTrackArgs),

    /// Print the default tracker configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CliRunArgs {
    #[command(flatten)]
    camera: CliCameraArgs,

    #[command(flatten)]
    tracker: CliTrackerArgs,

    /// Stop each detection run after this many frames (default: until `q`).
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write the session summary (final filter, last frame result) as JSON.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliTrackArgs {
    #[command(flatten)]
    camera: CliCameraArgs,

    #[command(flatten)]
    tracker: CliTrackerArgs,

    /// Number of frames to process (default: one pass over the input frames).
    #[arg(long)]
    frames: Option<u64>,

    /// Path to write the tracking summary (JSON).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliCameraArgs {
    /// Replay frame image; repeat for several frames.
    #[arg(long = "frame", required = true)]
    frames: Vec<PathBuf>,

    /// Constant scene depth in millimetres (fronto-parallel plane).
    #[arg(long, conflicts_with = "depth_map", default_value = "1000.0")]
    depth_mm: f32,

    /// 16-bit depth PNG in millimetres, 0 = no measurement.
    #[arg(long)]
    depth_map: Option<PathBuf>,

    /// Focal length fx (pixels).
    #[arg(long, default_value = "700.0")]
    cam_fx: f64,
    /// Focal length fy (pixels).
    #[arg(long, default_value = "700.0")]
    cam_fy: f64,
    /// Principal point cx (pixels). Defaults to the image centre.
    #[arg(long)]
    cam_cx: Option<f64>,
    /// Principal point cy (pixels). Defaults to the image centre.
    #[arg(long)]
    cam_cy: Option<f64>,

    /// Reported replay frame rate.
    #[arg(long, default_value = "15.0")]
    fps: f32,
}

impl CliCameraArgs {
    fn open_replay(&self) -> CliResult<ReplayCamera> {
        let first = self
            .frames
            .first()
            .ok_or("at least one --frame is required")?;
        let (w, h) = image::image_dimensions(first).map_err(|e| -> CliError {
            format!("Failed to open frame {}: {}", first.display(), e).into()
        })?;
        tracing::info!("Replaying {} frame(s) of {}x{}", self.frames.len(), w, h);

        let intrinsics = CameraIntrinsics {
            fx: self.cam_fx,
            fy: self.cam_fy,
            cx: self.cam_cx.unwrap_or(w as f64 / 2.0),
            cy: self.cam_cy.unwrap_or(h as f64 / 2.0),
        };
        let depth = match &self.depth_map {
            Some(path) => ReplayCamera::load_depth_map(path)?,
            None => DepthSource::Plane {
                depth_mm: self.depth_mm,
            },
        };
        Ok(ReplayCamera::from_files(&self.frames, depth, intrinsics)?.with_fps(self.fps))
    }
}

#[derive(Debug, Clone, Args)]
struct CliTrackerArgs {
    /// Tracker configuration JSON; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Size the search region from the coarse circle instead of depth.
    #[arg(long)]
    no_depth_sizing: bool,

    /// Skip the Hough circle confirmation.
    #[arg(long)]
    no_circle_refinement: bool,

    /// Median pre-blur radius (0 disables).
    #[arg(long)]
    median_blur: Option<u32>,

    /// Region-of-interest margin as a fraction of the expected width.
    #[arg(long)]
    buffer_factor: Option<f64>,

    /// Directory for annotated frames and tuner masks (PNG).
    #[arg(long)]
    overlay_dir: Option<PathBuf>,
}

impl CliTrackerArgs {
    fn build_config(&self) -> CliResult<TrackerConfig> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_json_file(path)?,
            None => TrackerConfig::default(),
        };
        if self.no_depth_sizing {
            config.mode.depth_sizing = false;
        }
        if self.no_circle_refinement {
            config.mode.circle_refinement = false;
        }
        if let Some(r) = self.median_blur {
            config.median_blur_radius = r;
        }
        if let Some(b) = self.buffer_factor {
            config.roi.buffer_factor = b;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_interactive(&args),
        Commands::Track(args) => run_track(&args),
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&TrackerConfig::default())?);
            Ok(())
        }
    }
}

// ── run ────────────────────────────────────────────────────────────────

fn run_interactive(args: &CliRunArgs) -> CliResult<()> {
    let config = args.tracker.build_config()?;
    let mut camera = args.camera.open_replay()?;
    let mut pipeline = DetectionPipeline::new(config);
    let mut controls = StdinControls::spawn();
    let mut sink = PrintSink::new(args.tracker.overlay_dir.clone())?;

    let summary = session::run_menu(
        &mut camera,
        &mut pipeline,
        &mut controls,
        &mut sink,
        args.max_frames,
    )?;
    println!("Exiting program...");

    if let Some(out) = &args.out {
        write_json(out, &summary)?;
    }
    Ok(())
}

// ── track ──────────────────────────────────────────────────────────────

fn run_track(args: &CliTrackArgs) -> CliResult<()> {
    let config = args.tracker.build_config()?;
    let mut camera = args.camera.open_replay()?;
    let pipeline = DetectionPipeline::new(config);
    let mut sink = PrintSink::new(args.tracker.overlay_dir.clone())?;
    let frames = args.frames.unwrap_or(args.camera.frames.len() as u64);

    let summary = session::run_tracking(
        &mut camera,
        &pipeline,
        &mut NoKeys,
        &mut sink,
        Some(frames),
    )?;
    tracing::info!(
        "Processed {} frames: {} confirmed, {} colour-only",
        summary.frames,
        summary.confirmed,
        summary.color_only
    );

    if let Some(out) = &args.out {
        write_json(out, &summary)?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    tracing::info!("Results written to {}", path.display());
    Ok(())
}

// ── operator I/O ───────────────────────────────────────────────────────

/// Keyboard over stdin: a reader thread forwards lines, key polls consume
/// them one character at a time.
struct StdinControls {
    lines: Receiver<String>,
    pending: VecDeque<u32>,
}

impl StdinControls {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            lines: rx,
            pending: VecDeque::new(),
        }
    }
}

impl Controls for StdinControls {
    fn poll_key(&mut self) -> Option<u32> {
        if self.pending.is_empty() {
            match self.lines.try_recv() {
                Ok(line) => self.pending.extend(line.chars().map(u32::from)),
                Err(TryRecvError::Empty) => return None,
                // Closed input ends the live loop.
                Err(TryRecvError::Disconnected) => return Some('q' as u32),
            }
        }
        self.pending.pop_front()
    }

    fn prompt(&mut self, message: &str) -> Option<String> {
        self.pending.clear();
        if let Err(e) = write_prompt(&mut std::io::stdout(), message) {
            tracing::warn!("Failed to show prompt: {}", e);
        }
        self.lines.recv().ok()
    }
}

fn write_prompt<W: Write>(out: &mut W, message: &str) -> std::io::Result<()> {
    write!(out, "{message} ")?;
    out.flush()
}

/// Never presses anything.
struct NoKeys;

impl Controls for NoKeys {
    fn poll_key(&mut self) -> Option<u32> {
        None
    }

    fn prompt(&mut self, _message: &str) -> Option<String> {
        None
    }
}

/// Prints messages; optionally saves annotated frames and masks.
struct PrintSink {
    overlay_dir: Option<PathBuf>,
    frame_index: u64,
    mask_index: u64,
}

impl PrintSink {
    fn new(overlay_dir: Option<PathBuf>) -> CliResult<Self> {
        if let Some(dir) = &overlay_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            overlay_dir,
            frame_index: 0,
            mask_index: 0,
        })
    }
}

impl FrameSink for PrintSink {
    fn show_detection(&mut self, frame: &RgbImage, result: &FrameResult) {
        self.frame_index += 1;
        let Some(dir) = &self.overlay_dir else {
            return;
        };
        let path = dir.join(format!("frame_{:05}.png", self.frame_index));
        if let Err(e) = balltrack::overlay::annotate(frame, result).save(&path) {
            tracing::warn!("Failed to write {}: {}", path.display(), e);
        }
    }

    fn show_mask(&mut self, mask: &GrayImage, mode: DisplayMode) {
        self.mask_index += 1;
        let Some(dir) = &self.overlay_dir else {
            return;
        };
        let path = dir.join(format!("mask_{:05}_{:?}.png", self.mask_index, mode));
        if let Err(e) = mask.save(&path) {
            tracing::warn!("Failed to write {}: {}", path.display(), e);
        }
    }

    fn message(&mut self, text: &str) {
        println!("{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unflushable(Vec<u8>);

    impl Write for Unflushable {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn prompt_is_written_with_trailing_space() {
        let mut out = Vec::new();
        write_prompt(&mut out, "Enter command:").expect("write");
        assert_eq!(out, b"Enter command: ");
    }

    #[test]
    fn prompt_flush_failure_is_reported() {
        let mut out = Unflushable(Vec::new());
        let err = write_prompt(&mut out, "Save?").expect_err("flush fails");
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        assert_eq!(out.0, b"Save? ");
    }

    #[test]
    fn closed_stdin_channel_quits_live_loop() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(tx);
        let mut controls = StdinControls {
            lines: rx,
            pending: VecDeque::new(),
        };
        assert_eq!(controls.poll_key(), Some('q' as u32));
    }
}
