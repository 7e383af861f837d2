//! Internal utility functions for densecrf-binary.
//!
//! This module contains checks and small numeric helpers shared by the
//! segmentation stages and the inference engine.

use crate::error::SegmentationError;

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
/// * `context` - A description of the context for error messages
///
/// # Returns
///
/// `Ok(())` if the dimensions are valid, otherwise a description of the problem
pub fn validate_non_empty_image(width: u32, height: u32, context: &str) -> Result<(), String> {
    if width == 0 || height == 0 {
        Err(format!("{context}: Image dimensions must be non-zero"))
    } else {
        Ok(())
    }
}

/// Validates that two sizes agree.
///
/// # Arguments
///
/// * `expected` - The reference dimensions (width, height)
/// * `actual` - The dimensions being checked (width, height)
///
/// # Returns
///
/// `Ok(())` if the dimensions match, otherwise `DimensionMismatch`
pub fn validate_matching_dimensions(
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<(), SegmentationError> {
    if expected != actual {
        Err(SegmentationError::DimensionMismatch { expected, actual })
    } else {
        Ok(())
    }
}

/// Turns negated energies into a normalized distribution, in place.
///
/// The maximum is subtracted before exponentiation so energies in the
/// hundreds do not underflow every entry to zero.
#[inline]
pub fn softmax_neg_in_place(values: &mut [f32]) {
    let min_energy = values.iter().copied().fold(f32::INFINITY, f32::min);
    let mut total = 0.0;
    for v in values.iter_mut() {
        *v = (min_energy - *v).exp();
        total += *v;
    }
    for v in values.iter_mut() {
        *v /= total;
    }
}

/// Index of the largest value; ties resolve to the lowest index.
#[inline]
pub fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value {
                (i, v)
            } else {
                (best, best_value)
            }
        })
        .0
}
