use balltrack::{
    detect_largest_blob, refine_in_roi, segment, CameraIntrinsics, DepthSource, DetectionPipeline,
    FilterParams, HoughConfig, PointCloud, ReplayCamera, StereoCamera, View,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BALL: [u8; 3] = [170, 220, 40];

/// Noisy grey background with one ball, plus scattered yellow speckle.
fn make_frame(w: u32, h: u32, center: [f32; 2], radius: f32, seed: u64) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = RgbImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - center[0];
        let dy = y as f32 - center[1];
        if dx * dx + dy * dy <= radius * radius {
            Rgb(BALL)
        } else {
            let v = rng.gen_range(10..60u8);
            Rgb([v, v, v])
        }
    });
    for _ in 0..(w * h / 500) {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        img.put_pixel(x, y, Rgb(BALL));
    }
    img
}

fn intrinsics(w: u32, h: u32) -> CameraIntrinsics {
    CameraIntrinsics {
        fx: 700.0,
        fy: 700.0,
        cx: w as f64 / 2.0,
        cy: h as f64 / 2.0,
    }
}

fn bench_segment(c: &mut Criterion) {
    let frame = make_frame(1280, 720, [800.0, 300.0], 30.0, 7);
    let params = FilterParams::default();

    c.bench_function("segment_1280x720", |b| {
        b.iter(|| {
            let masks = segment(black_box(&frame), black_box(&params), 0);
            black_box(masks.cleaned.width())
        })
    });

    c.bench_function("segment_1280x720_median3", |b| {
        b.iter(|| {
            let masks = segment(black_box(&frame), black_box(&params), 3);
            black_box(masks.cleaned.width())
        })
    });
}

fn bench_blob(c: &mut Criterion) {
    let frame = make_frame(1280, 720, [800.0, 300.0], 30.0, 11);
    let mask = segment(&frame, &FilterParams::default(), 0).cleaned;

    c.bench_function("largest_blob_1280x720", |b| {
        b.iter(|| {
            let blob = detect_largest_blob(black_box(&mask));
            black_box(blob.map(|b| b.area))
        })
    });
}

fn bench_hough(c: &mut Criterion) {
    let crop = make_frame(96, 96, [48.0, 48.0], 24.0, 3);
    let cfg = HoughConfig::default();

    c.bench_function("hough_roi_96x96_r24", |b| {
        b.iter(|| {
            let circles = refine_in_roi(black_box(&crop), 24, black_box(&cfg));
            black_box(circles.len())
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let (w, h) = (1280, 720);
    let frame = make_frame(w, h, [800.0, 300.0], 33.0, 5);
    let mut camera = ReplayCamera::new(
        vec![frame],
        DepthSource::Plane { depth_mm: 1500.0 },
        intrinsics(w, h),
    )
    .expect("replay camera");
    let pipeline = DetectionPipeline::default();
    camera.open().expect("open");
    camera.grab().expect("grab");
    let focal = camera.intrinsics().focal_lengths();

    c.bench_function("pipeline_1280x720", |b| {
        b.iter(|| {
            let frame = camera.frame(View::Left).expect("frame");
            let cloud: &dyn PointCloud = &camera;
            let result = pipeline.process(black_box(frame), cloud, focal);
            black_box(result.stage)
        })
    });
}

criterion_group!(benches, bench_segment, bench_blob, bench_hough, bench_pipeline);
criterion_main!(benches);
