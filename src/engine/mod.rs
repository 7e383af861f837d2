//! Boundary to the dense pairwise inference engine.
//!
//! The pipeline only talks to [`InferenceEngine`]. [`MeanFieldEngine`] is a
//! small brute-force implementation of that contract so the pipeline can run
//! without an external solver.

mod filters;
mod mean_field;

pub use mean_field::MeanFieldEngine;

use crate::error::SegmentationResult;
use crate::segmentation::labels::LabelMap;
use crate::segmentation::unary::UnaryEnergy;
use crate::Image;
use image::Rgb;

/// Dense CRF solver as seen from the pipeline
///
/// Calls are made in order: one `set_unary_energy`, any number of pairwise
/// terms, then a single `map`. Any error is fatal for the run.
pub trait InferenceEngine {
    /// Hands the unary energy field over to the engine.
    fn set_unary_energy(&mut self, unary: UnaryEnergy) -> SegmentationResult<()>;

    /// Adds a color-independent smoothness term over pixel positions.
    fn add_pairwise_gaussian(&mut self, x_std: f32, y_std: f32, weight: f32)
        -> SegmentationResult<()>;

    /// Adds an appearance term over pixel positions and colors of `image`.
    fn add_pairwise_global_color(
        &mut self,
        x_std: f32,
        y_std: f32,
        color_std: f32,
        image: &Image<Rgb<u8>>,
        weight: f32,
    ) -> SegmentationResult<()>;

    /// Runs `iterations` rounds of inference and returns the MAP labeling.
    fn map(&mut self, iterations: usize) -> SegmentationResult<LabelMap>;
}

/// Position-only smoothness term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianTerm {
    pub x_std: f32,
    pub y_std: f32,
    pub weight: f32,
}

/// Position and color appearance term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTerm {
    pub x_std: f32,
    pub y_std: f32,
    /// Shared standard deviation of the three color channels
    pub color_std: f32,
    pub weight: f32,
}

/// The pair of pairwise terms attached to every inference run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseConfig {
    pub gaussian: GaussianTerm,
    pub color: ColorTerm,
}

impl Default for PairwiseConfig {
    fn default() -> Self {
        Self {
            gaussian: GaussianTerm {
                x_std: 7.0,
                y_std: 7.0,
                weight: 300.0,
            },
            color: ColorTerm {
                x_std: 3.0,
                y_std: 3.0,
                color_std: 3.0,
                weight: 10.0,
            },
        }
    }
}

impl PairwiseConfig {
    /// Registers both terms with `engine`, the color term guided by `image`.
    pub fn attach<E>(&self, engine: &mut E, image: &Image<Rgb<u8>>) -> SegmentationResult<()>
    where
        E: InferenceEngine + ?Sized,
    {
        let GaussianTerm {
            x_std,
            y_std,
            weight,
        } = self.gaussian;
        engine.add_pairwise_gaussian(x_std, y_std, weight)?;

        let ColorTerm {
            x_std,
            y_std,
            color_std,
            weight,
        } = self.color;
        engine.add_pairwise_global_color(x_std, y_std, color_std, image, weight)
    }
}
