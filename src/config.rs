use crate::engine::PairwiseConfig;
use crate::segmentation::unary::BINARY_LABELS;

/// Noise level used when the pipeline synthesizes its own input
pub const DEFAULT_NOISE_SIGMA: f64 = 25.0;
/// Mean-field rounds requested from the engine
pub const DEFAULT_ITERATIONS: usize = 10;

/// Settings of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of labels; the stock classifier only accepts 2
    pub num_labels: usize,
    /// Standard deviation of the synthetic noise
    pub noise_sigma: f64,
    /// Seed for the noise generator; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Pairwise terms handed to the engine
    pub pairwise: PairwiseConfig,
    /// Inference iterations
    pub iterations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_labels: BINARY_LABELS,
            noise_sigma: DEFAULT_NOISE_SIGMA,
            seed: None,
            pairwise: PairwiseConfig::default(),
            iterations: DEFAULT_ITERATIONS,
        }
    }
}
