use crate::error::{SegmentationError, SegmentationResult};
use crate::Image;
use image::{Luma, Rgb};
use imageproc::map::map_colors;
use itertools::Itertools;

/// Number of labels the intensity classifier supports
pub const BINARY_LABELS: usize = 2;

/// Per-pixel, per-label energies consumed by an inference engine
///
/// Values are packed row-major and label-minor: the energy of label `j` at
/// pixel `k` lives at `k * num_labels + j`. Lower energy means a more
/// preferred label.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryEnergy {
    /// Packed energies
    data: Vec<f32>,
    /// Width of the source image
    width: u32,
    /// Height of the source image
    height: u32,
    /// Stride of the label axis
    num_labels: usize,
}

impl UnaryEnergy {
    /// Wraps packed energies, checking that the stride matches.
    ///
    /// # Errors
    ///
    /// * `SegmentationError::EngineFailure` - `data` does not hold
    ///   `width * height * num_labels` values
    pub fn from_data(
        data: Vec<f32>,
        width: u32,
        height: u32,
        num_labels: usize,
    ) -> SegmentationResult<Self> {
        let expected = width as usize * height as usize * num_labels;
        if data.len() != expected {
            return Err(SegmentationError::EngineFailure(format!(
                "unary energy for {width}x{height}x{num_labels} needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            num_labels,
        })
    }

    /// Energies of every label at pixel index `k`.
    #[must_use]
    pub fn pixel(&self, k: usize) -> &[f32] {
        &self.data[k * self.num_labels..(k + 1) * self.num_labels]
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub const fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Packed energies in label-minor order.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// The point where a real per-pixel classifier plugs into the pipeline
///
/// Any `Fn(&Image<Rgb<u8>>, usize) -> SegmentationResult<UnaryEnergy>`
/// already implements this trait, so a replacement classifier is just a
/// function or closure.
pub trait UnaryClassifier {
    /// Computes the energy field of `image` for `num_labels` labels.
    fn classify(&self, image: &Image<Rgb<u8>>, num_labels: usize)
        -> SegmentationResult<UnaryEnergy>;
}

impl<F> UnaryClassifier for F
where
    F: Fn(&Image<Rgb<u8>>, usize) -> SegmentationResult<UnaryEnergy>,
{
    fn classify(
        &self,
        image: &Image<Rgb<u8>>,
        num_labels: usize,
    ) -> SegmentationResult<UnaryEnergy> {
        self(image, num_labels)
    }
}

/// Naive two-label classifier driven by average channel intensity.
///
/// With `avg = (r + g + b) / 3` (truncated), label 0 costs `avg` and label 1
/// costs `255 - avg`: bright pixels lean towards label 1, dark ones towards
/// label 0, and the two energies of a pixel always sum to 255.
///
/// # Errors
///
/// * `SegmentationError::UnsupportedLabelCount` - `num_labels` is not 2
pub fn classify_intensity(
    image: &Image<Rgb<u8>>,
    num_labels: usize,
) -> SegmentationResult<UnaryEnergy> {
    if num_labels != BINARY_LABELS {
        return Err(SegmentationError::UnsupportedLabelCount(num_labels));
    }

    let intensity: Image<Luma<u8>> = map_colors(image, |Rgb([red, green, blue])| {
        let sum = u32::from(red) + u32::from(green) + u32::from(blue);
        Luma([(sum / 3) as u8])
    });

    let data = intensity
        .pixels()
        .flat_map(|&Luma([average])| {
            let average = f32::from(average);
            [average, 255.0 - average]
        })
        .collect_vec();

    UnaryEnergy::from_data(data, image.width(), image.height(), num_labels)
}
