//! Configuration for the Lumen compositor.
//!
//! Bloom, color grading, render and debug settings persist to disk as a RON
//! file. Command-line flags override individual values.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BloomSettings, ColorAdjustmentSettings, Config, DebugConfig, PyramidFormat, RenderSettings,
    Tonemapper,
};
pub use error::ConfigError;
