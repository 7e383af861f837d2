//! Sequential driver tying the segmentation stages together.
//!
//! A run walks `Start → ImageLoaded → (NoisyImageReady |
//! ExternalNoisyImageLoaded) → UnaryComputed → EngineConfigured → Inferred →
//! Visualized → Done`. Any error moves the driver to `Failed` and no output
//! file is written.

use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::engine::InferenceEngine;
use crate::error::{SegmentationError, SegmentationResult};
use crate::io::{load_rgb, prefixed_path, save_ppm, ERROR_PREFIX, NOISED_PREFIX};
use crate::segmentation::noise::AddBinaryNoise;
use crate::segmentation::unary::{classify_intensity, UnaryClassifier, UnaryEnergy};
use crate::segmentation::visualize::{ColorizeLabels, ErrorReport};
use crate::utils::validate_matching_dimensions;
use crate::Image;
use image::Rgb;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Signature of the stock intensity classifier
pub type ClassifierFn = fn(&Image<Rgb<u8>>, usize) -> SegmentationResult<UnaryEnergy>;

/// Stage reached by a [`Pipeline`] run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    ImageLoaded,
    NoisyImageReady,
    ExternalNoisyImageLoaded,
    UnaryComputed,
    EngineConfigured,
    Inferred,
    Visualized,
    Done,
    Failed,
}

/// Where the observation fed to the classifier comes from
#[derive(Debug, Clone)]
pub enum NoisySource {
    /// Add Gaussian noise to the ground truth
    Synthesize,
    /// Use an image already in memory
    Provided(Image<Rgb<u8>>),
    /// Load the image from disk during the run
    Load(PathBuf),
}

/// Everything a successful run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The MAP labeling, black for label 0 and white otherwise
    pub labeling: Image<Rgb<u8>>,
    /// The observation the labeling was inferred from
    pub noisy: Image<Rgb<u8>>,
    /// Per-pixel disagreement with the ground truth
    pub error_map: Image<Rgb<u8>>,
    pub report: ErrorReport,
}

/// Paths of the labeling, the `noised_` copy and the `err_` map, in write order
fn output_paths(output_path: &Path) -> SegmentationResult<[PathBuf; 3]> {
    Ok([
        output_path.to_path_buf(),
        prefixed_path(output_path, NOISED_PREFIX)?,
        prefixed_path(output_path, ERROR_PREFIX)?,
    ])
}

impl PipelineOutput {
    /// Writes the labeling to `output_path`, plus `noised_` and `err_`
    /// siblings holding the observation and the error map.
    ///
    /// Either all three files are written or none is: when a write fails the
    /// files already written by this call are removed again.
    ///
    /// # Errors
    ///
    /// * `SegmentationError::InvalidOutputPath` - `output_path` has no file name
    /// * `SegmentationError::ImageSaveFailure` - one of the writes failed
    pub fn save(&self, output_path: impl AsRef<Path>) -> SegmentationResult<()> {
        let paths = output_paths(output_path.as_ref())?;
        let images = [&self.labeling, &self.noisy, &self.error_map];

        for (written, (image, path)) in images.iter().zip(&paths).enumerate() {
            if let Err(e) = save_ppm(image, path) {
                for stale in &paths[..written] {
                    if let Err(remove) = std::fs::remove_file(stale) {
                        warn!("could not remove partial output {stale:?}: {remove}");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Sequential driver from ground truth to labeling, error map and report
pub struct Pipeline<C = ClassifierFn> {
    config: PipelineConfig,
    classifier: C,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl Pipeline {
    /// Driver using the naive intensity classifier.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_classifier(config, classify_intensity as ClassifierFn)
    }
}

impl<C: UnaryClassifier> Pipeline<C> {
    pub fn with_classifier(config: PipelineConfig, classifier: C) -> Self {
        Self {
            config,
            classifier,
            state: PipelineState::Start,
            history: vec![PipelineState::Start],
        }
    }

    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// States visited by the latest run, starting with `Start`.
    #[must_use]
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage in memory on an already loaded ground truth.
    ///
    /// `engine_factory` receives `(width, height, num_labels)` once the
    /// unary energy is ready.
    ///
    /// # Errors
    ///
    /// Whatever the first failing stage reports; the driver is left in
    /// `PipelineState::Failed`.
    pub fn run<E, F>(
        &mut self,
        ground_truth: Image<Rgb<u8>>,
        noisy: NoisySource,
        engine_factory: F,
    ) -> SegmentationResult<PipelineOutput>
    where
        E: InferenceEngine,
        F: FnOnce(u32, u32, usize) -> E,
    {
        self.reset();
        self.transition(PipelineState::ImageLoaded);
        let result = self.execute(ground_truth, noisy, engine_factory);
        self.finish(result)
    }

    /// Loads the ground truth, runs every stage and writes the three outputs.
    ///
    /// Nothing is written unless every stage succeeded. An `output_path`
    /// without a file name is rejected before the ground truth is loaded.
    pub fn run_files<E, F>(
        &mut self,
        ground_truth_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        noisy: NoisySource,
        engine_factory: F,
    ) -> SegmentationResult<PipelineOutput>
    where
        E: InferenceEngine,
        F: FnOnce(u32, u32, usize) -> E,
    {
        self.reset();
        let output_path = output_path.as_ref();
        let result = output_paths(output_path)
            .and_then(|_| load_rgb(ground_truth_path))
            .and_then(|ground_truth| {
                self.transition(PipelineState::ImageLoaded);
                self.execute(ground_truth, noisy, engine_factory)
            })
            .and_then(|output| {
                output.save(output_path)?;
                Ok(output)
            });
        self.finish(result)
    }

    fn execute<E, F>(
        &mut self,
        ground_truth: Image<Rgb<u8>>,
        noisy: NoisySource,
        engine_factory: F,
    ) -> SegmentationResult<PipelineOutput>
    where
        E: InferenceEngine,
        F: FnOnce(u32, u32, usize) -> E,
    {
        let (width, height) = ground_truth.dimensions();
        let num_labels = self.config.num_labels;

        let noisy = match noisy {
            NoisySource::Synthesize => {
                let mut rng = match self.config.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let image = ground_truth.add_binary_noise(self.config.noise_sigma, &mut rng)?;
                self.transition(PipelineState::NoisyImageReady);
                image
            }
            NoisySource::Provided(image) => {
                validate_matching_dimensions((width, height), image.dimensions())?;
                self.transition(PipelineState::ExternalNoisyImageLoaded);
                image
            }
            NoisySource::Load(path) => {
                let image = load_rgb(&path)?;
                validate_matching_dimensions((width, height), image.dimensions())?;
                self.transition(PipelineState::ExternalNoisyImageLoaded);
                image
            }
        };

        let unary = self.classifier.classify(&noisy, num_labels)?;
        self.transition(PipelineState::UnaryComputed);

        let mut engine = engine_factory(width, height, num_labels);
        engine.set_unary_energy(unary)?;
        self.config.pairwise.attach(&mut engine, &noisy)?;
        self.transition(PipelineState::EngineConfigured);

        let labels = engine.map(self.config.iterations)?;
        if labels.dimensions() != (width, height) {
            return Err(SegmentationError::EngineFailure(format!(
                "engine returned a {:?} labeling for a {:?} image",
                labels.dimensions(),
                (width, height)
            )));
        }
        self.transition(PipelineState::Inferred);

        let labeling = labels.colorize();
        let (error_map, report) = labels.colorize_error(&ground_truth)?;
        self.transition(PipelineState::Visualized);

        info!(
            "segmented {width}x{height} image: {} errors ({} red, {} green)",
            report.total(),
            report.red,
            report.green
        );
        self.transition(PipelineState::Done);

        Ok(PipelineOutput {
            labeling,
            noisy,
            error_map,
            report,
        })
    }

    fn reset(&mut self) {
        self.state = PipelineState::Start;
        self.history.clear();
        self.history.push(PipelineState::Start);
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn finish(
        &mut self,
        result: SegmentationResult<PipelineOutput>,
    ) -> SegmentationResult<PipelineOutput> {
        if let Err(e) = &result {
            error!("pipeline failed after {:?}: {e}", self.state);
            self.transition(PipelineState::Failed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MeanFieldEngine;
    use crate::test_utils::{create_ground_truth, scratch_dir};
    use image::ImageBuffer;

    fn quiet_config() -> PipelineConfig {
        PipelineConfig {
            noise_sigma: 0.0,
            seed: Some(5),
            iterations: 0,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_synthesized_run_visits_every_state() {
        let mut pipeline = Pipeline::new(quiet_config());
        let output = pipeline
            .run(create_ground_truth(), NoisySource::Synthesize, MeanFieldEngine::new)
            .unwrap();

        assert_eq!(
            pipeline.history(),
            &[
                PipelineState::Start,
                PipelineState::ImageLoaded,
                PipelineState::NoisyImageReady,
                PipelineState::UnaryComputed,
                PipelineState::EngineConfigured,
                PipelineState::Inferred,
                PipelineState::Visualized,
                PipelineState::Done,
            ]
        );
        assert_eq!(output.report.total(), 0);
        assert_eq!(output.noisy.get_pixel(0, 0), &Rgb([191, 191, 191]));
    }

    #[test]
    fn test_provided_image_takes_external_branch() {
        let noisy: Image<Rgb<u8>> = ImageBuffer::from_pixel(2, 2, Rgb([200, 200, 200]));
        let mut pipeline = Pipeline::new(quiet_config());
        let output = pipeline
            .run(
                create_ground_truth(),
                NoisySource::Provided(noisy),
                MeanFieldEngine::new,
            )
            .unwrap();

        assert!(pipeline
            .history()
            .contains(&PipelineState::ExternalNoisyImageLoaded));
        assert!(!pipeline.history().contains(&PipelineState::NoisyImageReady));
        // everything labeled 1, so the two "off" pixels are false positives
        assert_eq!(output.report.red, 2);
        assert_eq!(output.report.green, 0);
    }

    #[test]
    fn test_mismatched_image_fails_before_classification() {
        let noisy: Image<Rgb<u8>> = ImageBuffer::new(3, 2);
        let mut pipeline = Pipeline::new(quiet_config());
        let result = pipeline.run(
            create_ground_truth(),
            NoisySource::Provided(noisy),
            MeanFieldEngine::new,
        );

        assert!(matches!(
            result,
            Err(SegmentationError::DimensionMismatch {
                expected: (2, 2),
                actual: (3, 2)
            })
        ));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert_eq!(
            pipeline.history(),
            &[
                PipelineState::Start,
                PipelineState::ImageLoaded,
                PipelineState::Failed
            ]
        );
    }

    #[test]
    fn test_classifier_failure_is_fatal() {
        let config = PipelineConfig {
            num_labels: 3,
            ..quiet_config()
        };
        let mut pipeline = Pipeline::new(config);
        let result = pipeline.run(
            create_ground_truth(),
            NoisySource::Synthesize,
            MeanFieldEngine::new,
        );

        assert!(matches!(
            result,
            Err(SegmentationError::UnsupportedLabelCount(3))
        ));
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn test_run_files_writes_three_outputs() {
        let dir = scratch_dir("pipeline_files");
        let truth_path = dir.join("truth.ppm");
        let output_path = dir.join("result.ppm");
        save_ppm(&create_ground_truth(), &truth_path).unwrap();

        let mut pipeline = Pipeline::new(quiet_config());
        pipeline
            .run_files(
                &truth_path,
                &output_path,
                NoisySource::Synthesize,
                MeanFieldEngine::new,
            )
            .unwrap();

        assert!(output_path.exists());
        assert!(dir.join("noised_result.ppm").exists());
        assert!(dir.join("err_result.ppm").exists());
        assert_eq!(pipeline.state(), PipelineState::Done);
    }

    #[test]
    fn test_failed_write_leaves_no_outputs() {
        let dir = scratch_dir("pipeline_partial_write");
        let truth_path = dir.join("truth.ppm");
        let output_path = dir.join("result.ppm");
        save_ppm(&create_ground_truth(), &truth_path).unwrap();
        // a directory in the way of the last output makes that write fail
        std::fs::create_dir(dir.join("err_result.ppm")).unwrap();

        let mut pipeline = Pipeline::new(quiet_config());
        let result = pipeline.run_files(
            &truth_path,
            &output_path,
            NoisySource::Synthesize,
            MeanFieldEngine::new,
        );

        assert!(matches!(
            result,
            Err(SegmentationError::ImageSaveFailure { .. })
        ));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(!output_path.exists());
        assert!(!dir.join("noised_result.ppm").exists());
        assert!(dir.join("err_result.ppm").is_dir());
    }

    #[test]
    fn test_output_path_without_file_name_is_rejected() {
        let dir = scratch_dir("pipeline_no_file_name");
        let truth_path = dir.join("truth.ppm");
        save_ppm(&create_ground_truth(), &truth_path).unwrap();

        let mut pipeline = Pipeline::new(quiet_config());
        let result = pipeline.run_files(
            &truth_path,
            dir.join(".."),
            NoisySource::Synthesize,
            MeanFieldEngine::new,
        );

        assert!(matches!(
            result,
            Err(SegmentationError::InvalidOutputPath(_))
        ));
        assert_eq!(
            pipeline.history(),
            &[PipelineState::Start, PipelineState::Failed]
        );
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[test]
    fn test_run_files_missing_ground_truth_fails() {
        let dir = scratch_dir("pipeline_missing");
        let output_path = dir.join("result.ppm");
        let mut pipeline = Pipeline::new(quiet_config());
        let result = pipeline.run_files(
            dir.join("absent.ppm"),
            &output_path,
            NoisySource::Synthesize,
            MeanFieldEngine::new,
        );

        assert!(matches!(
            result,
            Err(SegmentationError::ImageLoadFailure { .. })
        ));
        assert_eq!(
            pipeline.history(),
            &[PipelineState::Start, PipelineState::Failed]
        );
        assert!(!output_path.exists());
    }
}
