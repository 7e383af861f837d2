//! Performance benchmarks for densecrf-binary
//!
//! Measures the per-stage cost of the pipeline across image sizes so that
//! regressions in the reference engine are visible.

use criterion::*;
use densecrf_binary::{
    classify_intensity, AddBinaryNoise, ColorizeLabels, Image, InferenceEngine,
    MeanFieldEngine, PairwiseConfig,
};
use image::Rgb;
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hint::black_box;

/// Helper function to create a ground truth with a bright disc in the middle
fn create_ground_truth(width: u32, height: u32) -> Image<Rgb<u8>> {
    let mut image: Image<Rgb<u8>> = Image::new(width, height);
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let radius = width.min(height) as f32 / 3.0;

    iproduct!(0..height, 0..width).for_each(|(y, x)| {
        let inside = (x as f32 - center_x).hypot(y as f32 - center_y) <= radius;
        let v = if inside { 255 } else { 0 };
        image.put_pixel(x, y, Rgb([v, v, v]));
    });

    image
}

/// Benchmark noise synthesis across different image sizes
fn bench_add_noise(c: &mut Criterion) {
    let sizes = vec![(64, 64), (256, 256), (512, 512)];

    let mut group = c.benchmark_group("add_binary_noise");
    for (width, height) in sizes {
        let truth = create_ground_truth(width, height);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &truth,
            |b, truth| {
                let mut rng = StdRng::seed_from_u64(0);
                b.iter(|| truth.add_binary_noise(black_box(25.0), &mut rng).unwrap());
            },
        );
    }
    group.finish();
}

/// Benchmark classification and visualization together
fn bench_classify_and_colorize(c: &mut Criterion) {
    let truth = create_ground_truth(256, 256);
    let noisy = truth
        .add_binary_noise(25.0, &mut StdRng::seed_from_u64(1))
        .unwrap();

    c.bench_function("classify_intensity_256", |b| {
        b.iter(|| classify_intensity(black_box(&noisy), 2).unwrap());
    });

    let mut engine = MeanFieldEngine::new(256, 256, 2);
    engine
        .set_unary_energy(classify_intensity(&noisy, 2).unwrap())
        .unwrap();
    let labels = engine.map(0).unwrap();
    c.bench_function("colorize_error_256", |b| {
        b.iter(|| labels.colorize_error(black_box(&truth)).unwrap());
    });
}

/// Benchmark the reference engine with the stock pairwise terms
fn bench_mean_field(c: &mut Criterion) {
    let sizes = vec![(32, 32), (64, 64), (128, 128)];

    let mut group = c.benchmark_group("mean_field_map");
    group.sample_size(10);
    for (width, height) in sizes {
        let truth = create_ground_truth(width, height);
        let noisy = truth
            .add_binary_noise(25.0, &mut StdRng::seed_from_u64(2))
            .unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &noisy,
            |b, noisy| {
                b.iter(|| {
                    let mut engine = MeanFieldEngine::new(width, height, 2);
                    engine
                        .set_unary_energy(classify_intensity(noisy, 2).unwrap())
                        .unwrap();
                    PairwiseConfig::default().attach(&mut engine, noisy).unwrap();
                    engine.map(black_box(10)).unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_add_noise,
    bench_classify_and_colorize,
    bench_mean_field
);
criterion_main!(benches);
