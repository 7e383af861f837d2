pub mod config;
pub mod engine;
mod error;
pub mod io;
pub mod pipeline;
pub mod segmentation;
mod test_utils;
mod utils;

use image::{ImageBuffer, Pixel};

pub use config::{PipelineConfig, DEFAULT_ITERATIONS, DEFAULT_NOISE_SIGMA};
pub use engine::{ColorTerm, GaussianTerm, InferenceEngine, MeanFieldEngine, PairwiseConfig};
pub use error::{SegmentationError, SegmentationResult};
pub use io::{load_rgb, prefixed_path, save_ppm};
pub use pipeline::{NoisySource, Pipeline, PipelineOutput, PipelineState};
pub use segmentation::labels::LabelMap;
pub use segmentation::noise::{standard_normal, AddBinaryNoise};
pub use segmentation::unary::{classify_intensity, UnaryClassifier, UnaryEnergy};
pub use segmentation::visualize::{ColorizeLabels, ErrorReport};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
