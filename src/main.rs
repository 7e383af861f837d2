// CLI entry for densecrf-binary
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use densecrf_binary::{MeanFieldEngine, NoisySource, Pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "densecrf-binary",
    version,
    about = "Binary segmentation of a noisy two-tone image with a dense CRF"
)]
struct Cli {
    /// Standard deviation of the synthesized noise
    #[arg(long = "sigma")]
    sigma: Option<f64>,
    /// Seed for the noise generator (random when omitted)
    #[arg(long = "seed")]
    seed: Option<u64>,
    /// Number of inference iterations
    #[arg(long = "iterations")]
    iterations: Option<usize>,

    /// Binary ground-truth image (PPM)
    #[arg(value_hint = ValueHint::FilePath)]
    ground_truth: PathBuf,
    /// Output image path; noised_ and err_ variants are written next to it
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,
    /// Pre-noised observation to use instead of synthesizing one
    #[arg(value_hint = ValueHint::FilePath)]
    comparison: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> PipelineConfig {
    let mut cfg = PipelineConfig::default();
    if let Some(v) = cli.sigma { cfg.noise_sigma = v; }
    if let Some(v) = cli.seed { cfg.seed = Some(v); }
    if let Some(v) = cli.iterations { cfg.iterations = v; }
    cfg
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli);
    let noisy = match &cli.comparison {
        Some(path) => NoisySource::Load(path.clone()),
        None => NoisySource::Synthesize,
    };

    let output = Pipeline::new(config)
        .run_files(&cli.ground_truth, &cli.output, noisy, MeanFieldEngine::new)
        .with_context(|| format!("segmenting {}", cli.ground_truth.display()))?;

    println!("{}", output.report);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
