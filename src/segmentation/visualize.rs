use std::fmt;

use crate::error::SegmentationResult;
use crate::segmentation::labels::LabelMap;
use crate::utils::validate_matching_dimensions;
use crate::Image;
use image::{ImageBuffer, Rgb};
use log::info;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
/// Ground truth is "on" but the pixel was labeled 0
const MISSED: Rgb<u8> = Rgb([0, 255, 0]);
/// Ground truth is "off" but the pixel was labeled 1
const SPURIOUS: Rgb<u8> = Rgb([255, 0, 0]);

/// Pixel-level disagreement between a labeling and its ground truth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorReport {
    /// False positives, rendered red
    pub red: usize,
    /// False negatives, rendered green
    pub green: usize,
}

impl ErrorReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.red + self.green
    }

    /// Share of errors that are false positives; 0.0 when there are no errors.
    #[must_use]
    pub fn red_fraction(&self) -> f64 {
        self.fraction(self.red)
    }

    /// Share of errors that are false negatives; 0.0 when there are no errors.
    #[must_use]
    pub fn green_fraction(&self) -> f64 {
        self.fraction(self.green)
    }

    fn fraction(&self, count: usize) -> f64 {
        match self.total() {
            0 => 0.0,
            total => count as f64 / total as f64,
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total errors: {}", self.total())?;
        writeln!(f, "\tred points:   {}, {}", self.red, self.red_fraction())?;
        write!(f, "\tgreen points: {}, {}", self.green, self.green_fraction())
    }
}

/// Rendering of label maps for inspection
pub trait ColorizeLabels {
    /// Paints label 0 black and every other label white.
    fn colorize(&self) -> Image<Rgb<u8>>;

    /// Paints agreement with `ground_truth` black and disagreement in color.
    ///
    /// A pixel agrees when `label * 255` equals the ground truth's red
    /// channel. Disagreement over a 255 ground truth is a false negative
    /// (green); any other disagreement is a false positive (red).
    ///
    /// # Returns
    ///
    /// The diagnostic image together with the error counts
    ///
    /// # Errors
    ///
    /// * `SegmentationError::DimensionMismatch` - the ground truth is not the
    ///   size of the label map
    fn colorize_error(
        &self,
        ground_truth: &Image<Rgb<u8>>,
    ) -> SegmentationResult<(Image<Rgb<u8>>, ErrorReport)>;
}

impl ColorizeLabels for LabelMap {
    fn colorize(&self) -> Image<Rgb<u8>> {
        ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            if self.get(x, y) == 0 {
                BLACK
            } else {
                WHITE
            }
        })
    }

    fn colorize_error(
        &self,
        ground_truth: &Image<Rgb<u8>>,
    ) -> SegmentationResult<(Image<Rgb<u8>>, ErrorReport)> {
        validate_matching_dimensions(self.dimensions(), ground_truth.dimensions())?;

        let mut report = ErrorReport::default();
        let diagnostic = ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            let predicted = i32::from(self.get(x, y)) * 255;
            let truth = i32::from(ground_truth.get_pixel(x, y)[0]);
            if predicted == truth {
                BLACK
            } else if truth == 255 {
                report.green += 1;
                MISSED
            } else {
                report.red += 1;
                SPURIOUS
            }
        });

        info!(
            "labeling disagrees with ground truth on {} of {} pixels",
            report.total(),
            self.data().len()
        );

        Ok((diagnostic, report))
    }
}
