//! The `lumen` application: load an image, composite bloom, write the result.

pub mod io;
pub mod platform;
pub mod settings;

use std::path::Path;

use anyhow::{Context, Result, bail};
use lumen_config::{CliArgs, Config};
use lumen_render::{CompositeReport, HdrImage};

use crate::platform::PlatformDirs;

/// Run one composite as described by `args`.
pub fn run(args: CliArgs) -> Result<()> {
    let Some(input) = args.input.clone() else {
        bail!("no input image given (use --input)");
    };

    let dirs = match &args.config {
        Some(dir) => PlatformDirs::with_config_dir(dir),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(&args);

    let log_file = lumen_log::init_logging(
        Some(&dirs.log_dir),
        cfg!(debug_assertions),
        Some(&config),
    )?;
    if let Some(path) = log_file {
        tracing::debug!("writing JSON log to {}", path.display());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| io::default_output_path(&input));

    let threads = config.render.threads;
    if threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("failed to build worker thread pool")?;
        pool.install(|| process(&config, &input, &output))
    } else {
        process(&config, &input, &output)
    }
}

/// Load, composite and save one image.
pub fn process(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let mut image = {
        let _span = tracing::info_span!("load", path = %input.display()).entered();
        io::load_image(input)?
    };

    let report = composite(config, &mut image)
        .with_context(|| format!("failed to composite {}", input.display()))?;
    tracing::info!(
        bloom = report.bloom_active,
        depth = report.pyramid_depth,
        grading = report.grading_active,
        "composited {}x{}",
        image.width(),
        image.height()
    );

    let _span = tracing::info_span!("save", path = %output.display()).entered();
    io::save_image(&image, output)?;
    tracing::info!("wrote {}", output.display());
    Ok(())
}

/// Composite bloom and grading into `image` with a compositor built from `config`.
pub fn composite(config: &Config, image: &mut HdrImage) -> Result<CompositeReport> {
    let _span = tracing::info_span!("composite").entered();
    let mut compositor = settings::build_compositor(&config.render);
    let report = compositor.composite_in_place(image, &settings::composite_settings(config))?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_missing_input_is_an_error() {
        let err = run(CliArgs::default()).unwrap_err();
        assert!(err.to_string().contains("--input"));
    }

    #[test]
    fn test_composite_adds_glow() {
        let config = Config::default();
        let mut image = HdrImage::filled(64, 64, Vec3::ZERO).unwrap();
        image.set_pixel(32, 32, Vec3::splat(50.0));

        let report = composite(&config, &mut image).unwrap();
        assert!(report.bloom_active);
        assert!(image.pixel(34, 32).x > 0.0);
    }

    #[test]
    fn test_process_round_trips_through_exr() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.exr");
        let output = io::default_output_path(&input);

        let mut scene = HdrImage::filled(32, 16, Vec3::splat(0.05)).unwrap();
        scene.set_pixel(16, 8, Vec3::new(40.0, 20.0, 10.0));
        io::save_image(&scene, &input).unwrap();

        process(&Config::default(), &input, &output).unwrap();
        let result = io::load_image(&output).unwrap();
        assert_eq!(result.dimensions(), (32, 16));
        assert!(result.pixel(18, 8).x > scene.pixel(18, 8).x);
    }

    #[test]
    fn test_pool_budget_error_is_reported() {
        let mut config = Config::default();
        config.render.pool_budget_mb = 1;
        let mut image = HdrImage::filled(2048, 2048, Vec3::ONE).unwrap();
        let err = composite(&config, &mut image).unwrap_err();
        assert!(format!("{err:#}").contains("pool exhausted"));
    }
}
