//! Command-line argument parsing for the `lumen` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, Tonemapper};

/// Lumen command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "lumen", about = "HDR bloom and tonemapping compositor")]
pub struct CliArgs {
    /// Source image (EXR, HDR, PNG or JPEG).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output image. Defaults to `<input stem>_bloom.<ext>` next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Bloom threshold (gamma space).
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Bloom intensity (0 disables bloom).
    #[arg(long)]
    pub intensity: Option<f32>,

    /// Bloom scatter (0.0 - 1.0).
    #[arg(long)]
    pub scatter: Option<f32>,

    /// Maximum pixel intensity fed into the bloom.
    #[arg(long)]
    pub clamp: Option<f32>,

    /// Maximum pyramid depth.
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Bicubic upsampling of the low mips.
    #[arg(long)]
    pub high_quality: bool,

    /// Tonemapping curve.
    #[arg(long, value_enum)]
    pub tonemapping: Option<Tonemapper>,

    /// Exposure adjustment (-100 - 100).
    #[arg(long, allow_hyphen_values = true)]
    pub exposure: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(threshold) = args.threshold {
            self.bloom.threshold = threshold;
        }
        if let Some(intensity) = args.intensity {
            self.bloom.intensity = intensity;
        }
        if let Some(scatter) = args.scatter {
            self.bloom.scatter = scatter;
        }
        if let Some(clamp) = args.clamp {
            self.bloom.clamp = clamp;
        }
        if let Some(iterations) = args.max_iterations {
            self.bloom.max_iterations = iterations;
        }
        if args.high_quality {
            self.bloom.high_quality_filtering = true;
        }
        if let Some(tonemapping) = args.tonemapping {
            self.color.tonemapping = tonemapping;
        }
        if let Some(exposure) = args.exposure {
            self.color.exposure = exposure;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
