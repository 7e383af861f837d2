use crate::error::{SegmentationError, SegmentationResult};

/// Dense per-pixel label assignment produced by an inference engine
///
/// Labels are stored row-major, one `i16` per pixel, and are always valid
/// indices into `[0, num_labels)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    /// Label of each pixel
    data: Vec<i16>,
    /// Width of the labeled image
    width: u32,
    /// Height of the labeled image
    height: u32,
    /// Number of classes the labels are drawn from
    num_labels: usize,
}

impl LabelMap {
    /// Builds a label map, checking its length and every label.
    ///
    /// # Errors
    ///
    /// * `SegmentationError::InvalidLabelMap` - `data` does not hold exactly
    ///   `width * height` values, or some value falls outside `[0, num_labels)`
    pub fn new(
        data: Vec<i16>,
        width: u32,
        height: u32,
        num_labels: usize,
    ) -> SegmentationResult<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(SegmentationError::InvalidLabelMap(format!(
                "expected {expected} labels for {width}x{height}, got {}",
                data.len()
            )));
        }

        if let Some((index, &label)) = data
            .iter()
            .enumerate()
            .find(|&(_, &label)| label < 0 || label as usize >= num_labels)
        {
            return Err(SegmentationError::InvalidLabelMap(format!(
                "label {label} at pixel {index} is outside [0, {num_labels})"
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            num_labels,
        })
    }

    /// Builds a map with every pixel set to `label`.
    pub fn filled(width: u32, height: u32, num_labels: usize, label: i16) -> SegmentationResult<Self> {
        Self::new(
            vec![label; width as usize * height as usize],
            width,
            height,
            num_labels,
        )
    }

    /// Label at pixel `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> i16 {
        self.data[(y * self.width + x) as usize]
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

    /// Raw labels in row-major order.
    #[must_use]
    pub fn data(&self) -> &[i16] {
        &self.data
    }
}
