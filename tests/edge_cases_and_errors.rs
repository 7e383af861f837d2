//! Edge case and error condition tests
//!
//! Boundary sizes, degenerate noise levels and the wording of diagnostics.

use densecrf_binary::{
    classify_intensity, AddBinaryNoise, ColorizeLabels, ErrorReport, Image, InferenceEngine,
    LabelMap, MeanFieldEngine, NoisySource, Pipeline, PipelineConfig, SegmentationError,
};
use image::Rgb;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Helper to create a minimal 1x1 "on" ground truth
fn create_minimal_ground_truth() -> Image<Rgb<u8>> {
    Image::from_pixel(1, 1, Rgb([255, 255, 255]))
}

#[test]
fn test_minimum_image_size_pipeline() {
    let config = PipelineConfig {
        noise_sigma: 0.0,
        seed: Some(0),
        ..PipelineConfig::default()
    };
    let mut pipeline = Pipeline::new(config);
    let output = pipeline
        .run(
            create_minimal_ground_truth(),
            NoisySource::Synthesize,
            MeanFieldEngine::new,
        )
        .unwrap();

    assert_eq!(output.labeling.dimensions(), (1, 1));
    assert_eq!(output.labeling.get_pixel(0, 0), &Rgb([255, 255, 255]));
    assert_eq!(output.report, ErrorReport::default());
}

#[test]
fn test_huge_sigma_only_produces_sentinels_or_valid_bytes() {
    let truth: Image<Rgb<u8>> = Image::from_pixel(32, 32, Rgb([255, 255, 255]));
    let mut rng = StdRng::seed_from_u64(9);
    let noisy = truth.add_binary_noise(10_000.0, &mut rng).unwrap();

    // nearly every sample leaves [0, 255], so the sentinels dominate
    let sentinels = noisy
        .pixels()
        .filter(|p| p[0] == 128 || p[0] == 127)
        .count();
    assert!(sentinels > 32 * 32 * 9 / 10);
}

#[test]
fn test_mid_gray_observation_prefers_label_zero_on_ties() {
    // avg 127 gives energies [127, 128]; avg 128 gives [128, 127]
    let mut image: Image<Rgb<u8>> = Image::new(2, 1);
    image.put_pixel(0, 0, Rgb([127, 127, 127]));
    image.put_pixel(1, 0, Rgb([128, 128, 128]));

    let energy = classify_intensity(&image, 2).unwrap();
    let mut engine = MeanFieldEngine::new(2, 1, 2);
    engine.set_unary_energy(energy).unwrap();
    let labels = engine.map(0).unwrap();

    assert_eq!(labels.data(), &[0, 1]);
}

#[test]
fn test_single_label_map_colorizes() {
    let labels = LabelMap::filled(1, 1, 2, 1).unwrap();
    assert_eq!(labels.colorize().get_pixel(0, 0), &Rgb([255, 255, 255]));
}

#[test]
fn test_error_messages_are_descriptive() {
    let mismatch = SegmentationError::DimensionMismatch {
        expected: (4, 4),
        actual: (5, 4),
    };
    assert_eq!(
        mismatch.to_string(),
        "Image dimensions mismatch: expected (4, 4), actual (5, 4)"
    );
    assert!(SegmentationError::UnsupportedLabelCount(3)
        .to_string()
        .contains("exactly 2 labels"));
    assert!(SegmentationError::NoiseGenerationFailure("empty".into())
        .to_string()
        .starts_with("Failed to add noise"));
}

#[test]
fn test_label_map_rejects_labels_beyond_count() {
    assert!(matches!(
        LabelMap::new(vec![0, 1, 2], 3, 1, 2),
        Err(SegmentationError::InvalidLabelMap(_))
    ));
}
