use crate::engine::filters::{ColorKernel, SpatialKernel};
use crate::engine::InferenceEngine;
use crate::error::{SegmentationError, SegmentationResult};
use crate::segmentation::labels::LabelMap;
use crate::segmentation::unary::UnaryEnergy;
use crate::utils::{argmax, softmax_neg_in_place, validate_non_empty_image};
use crate::Image;
use image::Rgb;
use log::debug;

enum Kernel {
    Spatial(SpatialKernel),
    Color(ColorKernel),
}

struct PairwiseTerm {
    kernel: Kernel,
    weight: f32,
}

impl PairwiseTerm {
    /// Adds `weight * (Σ_j k(i,j) Q_j − Q_i) / Σ_j k(i,j)` to `messages`.
    fn accumulate(&self, q: &[f32], num_labels: usize, messages: &mut [f32]) {
        let (filtered, norm) = match &self.kernel {
            Kernel::Spatial(kernel) => (kernel.filter(q, num_labels), kernel.norm()),
            Kernel::Color(kernel) => (kernel.filter(q, num_labels), kernel.norm()),
        };

        for (k, &mass) in norm.iter().enumerate() {
            let span = k * num_labels..(k + 1) * num_labels;
            for l in span {
                messages[l] += self.weight * (filtered[l] - q[l]) / mass;
            }
        }
    }
}

/// Fixed-iteration mean-field inference with a Potts model
///
/// Kernels are evaluated directly rather than through a permutohedral
/// lattice, so the color term costs `O(pixels * window)` per iteration.
/// Suitable for the small images this pipeline works with.
pub struct MeanFieldEngine {
    width: u32,
    height: u32,
    num_labels: usize,
    unary: Option<UnaryEnergy>,
    terms: Vec<PairwiseTerm>,
}

impl MeanFieldEngine {
    #[must_use]
    pub fn new(width: u32, height: u32, num_labels: usize) -> Self {
        Self {
            width,
            height,
            num_labels,
            unary: None,
            terms: Vec::new(),
        }
    }

    fn check_term(&self, stds: &[f32], weight: f32) -> SegmentationResult<()> {
        validate_non_empty_image(self.width, self.height, "pairwise term")
            .map_err(SegmentationError::EngineFailure)?;
        if stds.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(SegmentationError::EngineFailure(format!(
                "standard deviations must be positive, got {stds:?}"
            )));
        }
        if !weight.is_finite() {
            return Err(SegmentationError::EngineFailure(format!(
                "pairwise weight must be finite, got {weight}"
            )));
        }
        Ok(())
    }
}

impl InferenceEngine for MeanFieldEngine {
    fn set_unary_energy(&mut self, unary: UnaryEnergy) -> SegmentationResult<()> {
        if unary.dimensions() != (self.width, self.height) || unary.num_labels() != self.num_labels
        {
            return Err(SegmentationError::EngineFailure(format!(
                "unary energy is {}x{}x{}, engine expects {}x{}x{}",
                unary.width(),
                unary.height(),
                unary.num_labels(),
                self.width,
                self.height,
                self.num_labels
            )));
        }
        self.unary = Some(unary);
        Ok(())
    }

    fn add_pairwise_gaussian(
        &mut self,
        x_std: f32,
        y_std: f32,
        weight: f32,
    ) -> SegmentationResult<()> {
        self.check_term(&[x_std, y_std], weight)?;
        self.terms.push(PairwiseTerm {
            kernel: Kernel::Spatial(SpatialKernel::new(self.width, self.height, x_std, y_std)),
            weight,
        });
        Ok(())
    }

    fn add_pairwise_global_color(
        &mut self,
        x_std: f32,
        y_std: f32,
        color_std: f32,
        image: &Image<Rgb<u8>>,
        weight: f32,
    ) -> SegmentationResult<()> {
        self.check_term(&[x_std, y_std, color_std], weight)?;
        if image.dimensions() != (self.width, self.height) {
            return Err(SegmentationError::EngineFailure(format!(
                "guide image is {:?}, engine expects {:?}",
                image.dimensions(),
                (self.width, self.height)
            )));
        }
        self.terms.push(PairwiseTerm {
            kernel: Kernel::Color(ColorKernel::new(image, x_std, y_std, color_std)),
            weight,
        });
        Ok(())
    }

    fn map(&mut self, iterations: usize) -> SegmentationResult<LabelMap> {
        let unary = self.unary.as_ref().ok_or_else(|| {
            SegmentationError::EngineFailure("map requested before set_unary_energy".into())
        })?;
        let m = self.num_labels;
        if m == 0 {
            return Err(SegmentationError::EngineFailure(
                "engine needs at least one label".into(),
            ));
        }

        let mut q = unary.data().to_vec();
        q.chunks_mut(m).for_each(softmax_neg_in_place);

        let mut messages = vec![0.0; q.len()];
        for iteration in 0..iterations {
            messages.fill(0.0);
            for term in &self.terms {
                term.accumulate(&q, m, &mut messages);
            }

            for ((qi, &u), &msg) in q.iter_mut().zip(unary.data()).zip(&messages) {
                *qi = u - msg;
            }
            q.chunks_mut(m).for_each(softmax_neg_in_place);

            debug!("mean-field iteration {} of {iterations} done", iteration + 1);
        }

        let labels = q.chunks(m).map(|p| argmax(p) as i16).collect();
        LabelMap::new(labels, self.width, self.height, m)
            .map_err(|e| SegmentationError::EngineFailure(e.to_string()))
    }
}
