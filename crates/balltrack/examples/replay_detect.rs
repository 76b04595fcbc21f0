use balltrack::{
    CameraIntrinsics, DepthSource, DetectionPipeline, ReplayCamera, StereoCamera, TrackerConfig,
    View,
};
use std::error::Error;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: {} <image.png> <depth_mm> <focal_px> [config.json] [out.json]",
            args[0]
        );
        std::process::exit(2);
    }

    let frame_path = PathBuf::from(&args[1]);
    let depth_mm: f32 = args[2].parse()?;
    let focal_px: f64 = args[3].parse()?;
    let config = match args.get(4) {
        Some(path) => TrackerConfig::from_json_file(Path::new(path))?,
        None => TrackerConfig::default(),
    };

    let (w, h) = image::image_dimensions(&frame_path)?;
    let intrinsics = CameraIntrinsics {
        fx: focal_px,
        fy: focal_px,
        cx: w as f64 / 2.0,
        cy: h as f64 / 2.0,
    };
    let mut camera = ReplayCamera::from_files(
        &[frame_path],
        DepthSource::Plane { depth_mm },
        intrinsics,
    )?;
    camera.open()?;
    camera.grab()?;

    let pipeline = DetectionPipeline::new(config);
    let frame = camera.frame(View::Left)?;
    let result = pipeline.process(frame, &camera, intrinsics.focal_lengths());
    camera.close();

    println!("Reached stage {:?}.", result.stage);
    if let Some(report) = result.detection.as_ref().and_then(|d| d.report()) {
        println!("{report}");
    }

    if let Some(out_path) = args.get(5) {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
