//! Conversion from persisted config to compositor settings.

use glam::Vec3;
use lumen_config::{
    BloomSettings, ColorAdjustmentSettings, Config, PyramidFormat, RenderSettings, Tonemapper,
};
use lumen_render::{
    BloomCompositor, BloomParameters, ColorAdjustments, CompositeSettings, TextureFormat,
    TonemappingMode,
};

pub fn bloom_parameters(bloom: &BloomSettings) -> BloomParameters {
    BloomParameters {
        threshold: bloom.threshold,
        intensity: bloom.intensity,
        scatter: bloom.scatter,
        clamp: bloom.clamp,
        tint: Vec3::from_array(bloom.tint),
        max_iterations: bloom.max_iterations,
        high_quality_filtering: bloom.high_quality_filtering,
    }
}

/// `None` when grading is disabled.
pub fn color_adjustments(color: &ColorAdjustmentSettings) -> Option<ColorAdjustments> {
    color.enabled.then(|| ColorAdjustments {
        exposure: color.exposure,
        contrast: color.contrast,
        saturation: color.saturation,
        color_filter: Vec3::from_array(color.color_filter),
        temperature: color.temperature,
        tint: color.tint,
        tonemapping: tonemapping_mode(color.tonemapping),
    })
}

pub fn tonemapping_mode(tonemapper: Tonemapper) -> TonemappingMode {
    match tonemapper {
        Tonemapper::None => TonemappingMode::None,
        Tonemapper::Neutral => TonemappingMode::Neutral,
        Tonemapper::Aces => TonemappingMode::Aces,
    }
}

pub fn texture_format(format: PyramidFormat) -> TextureFormat {
    match format {
        PyramidFormat::Rgb32Float => TextureFormat::Rgb32Float,
        PyramidFormat::Rg11b10Float => TextureFormat::Rg11b10Float,
    }
}

pub fn composite_settings(config: &Config) -> CompositeSettings {
    CompositeSettings {
        bloom: bloom_parameters(&config.bloom),
        color: color_adjustments(&config.color),
    }
}

/// Compositor with the configured pyramid format and pool budget.
pub fn build_compositor(render: &RenderSettings) -> BloomCompositor {
    let compositor = BloomCompositor::new().with_format(texture_format(render.pyramid_format));
    match render.pool_budget_bytes() {
        Some(budget) => compositor.with_pool_budget(budget),
        None => compositor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_maps_to_active_bloom() {
        let settings = composite_settings(&Config::default());
        assert!(settings.bloom.is_active());
        assert_eq!(settings.bloom.threshold, 0.9);
        assert_eq!(settings.bloom.tint, Vec3::ONE);
        assert!(settings.color.as_ref().is_some_and(ColorAdjustments::is_identity));
    }

    #[test]
    fn test_disabled_grading_maps_to_none() {
        let mut config = Config::default();
        config.color.enabled = false;
        config.color.tonemapping = Tonemapper::Aces;
        assert!(composite_settings(&config).color.is_none());
    }

    #[test]
    fn test_tonemapper_mapping() {
        assert_eq!(tonemapping_mode(Tonemapper::Neutral), TonemappingMode::Neutral);
        assert_eq!(tonemapping_mode(Tonemapper::Aces), TonemappingMode::Aces);
    }

    #[test]
    fn test_build_compositor_applies_render_settings() {
        let render = RenderSettings {
            pyramid_format: PyramidFormat::Rgb32Float,
            pool_budget_mb: 2,
            threads: 0,
        };
        let compositor = build_compositor(&render);
        assert_eq!(compositor.format(), TextureFormat::Rgb32Float);
        assert_eq!(compositor.pool().budget(), Some(2 * 1024 * 1024));
    }
}
