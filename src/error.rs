use std::path::PathBuf;

use thiserror::Error;

/// Error type for every stage of the segmentation pipeline
///
/// All variants are fatal for a run: the driver never retries and never
/// writes partial outputs once one of these is returned.
#[derive(Debug, Error)]
pub enum SegmentationError {
    /// An input image could not be opened or decoded
    #[error("Failed to load image {path:?}: {source}")]
    ImageLoadFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An output image could not be encoded or written
    #[error("Failed to write image {path:?}: {source}")]
    ImageSaveFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An output path has no file name to derive the sibling outputs from
    #[error("Invalid output path {0:?}: it must name a file")]
    InvalidOutputPath(PathBuf),

    /// Two images (or an image and a label map) that must align do not
    ///
    /// Raised when a provided comparison image differs in size from the
    /// ground truth, before any classification or inference happens.
    #[error("Image dimensions mismatch: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// The noise synthesis step could not produce an image
    #[error("Failed to add noise: {0}")]
    NoiseGenerationFailure(String),

    /// The intensity classifier only understands two labels
    #[error("Unsupported label count {0}: the intensity classifier requires exactly 2 labels")]
    UnsupportedLabelCount(usize),

    /// A label map was built from data that breaks its invariants
    #[error("Invalid label map: {0}")]
    InvalidLabelMap(String),

    /// Opaque failure surfaced from the inference engine
    #[error("Inference engine failure: {0}")]
    EngineFailure(String),
}

/// Result alias used throughout the crate
pub type SegmentationResult<T> = Result<T, SegmentationError>;
