//! Mip-pyramid bloom for HDR images.
//!
//! Extracts overbright pixels with a soft-knee threshold at half resolution,
//! progressively blurs them down a mip chain (two separable Gaussian passes
//! per level), then walks back up blending each level with the one below it
//! by `scatter`. The top of the chain is the bloom texture the compositor adds
//! onto the base image.

use glam::Vec3;
use rayon::prelude::*;

use crate::color::{gamma_to_linear, lerp};
use crate::image::HdrImage;
use crate::sampling::{Filter, sample, sample_bilinear, texel_center_uv};

/// Upper bound on pyramid levels regardless of configuration.
pub const MAX_PYRAMID_SIZE: u32 = 16;

/// Epsilon in the soft-knee denominator and brightness divisor.
pub const KNEE_EPSILON: f32 = 1e-4;

/// 9-tap Gaussian weights for sigma ≈ 1.5 (normalized). Index 0 is the center tap.
pub const GAUSSIAN_WEIGHTS: [f32; 5] = [
    0.227_027_03,
    0.194_594_6,
    0.121_621_62,
    0.054_054_055,
    0.016_216_216,
];

/// Tunable bloom parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomParameters {
    /// Brightness cutoff in gamma space. Pixels below it do not bloom. Default: 0.9.
    pub threshold: f32,
    /// Composite strength. Zero disables bloom entirely. Default: 0.0.
    pub intensity: f32,
    /// Spread of the glow, range \[0, 1\]. Default: 0.7.
    pub scatter: f32,
    /// Maximum pixel intensity considered by the prefilter. Default: 65472.
    pub clamp: f32,
    /// Linear RGB tint multiplied into the glow.
    pub tint: Vec3,
    /// Maximum pyramid depth, range \[1, 16\]. Default: 6.
    pub max_iterations: u32,
    /// Upsample the low mips with a bicubic B-spline instead of bilinear.
    pub high_quality_filtering: bool,
}

impl Default for BloomParameters {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            intensity: 0.0,
            scatter: 0.7,
            clamp: 65472.0,
            tint: Vec3::ONE,
            max_iterations: 6,
            high_quality_filtering: false,
        }
    }
}

impl BloomParameters {
    /// Bloom contributes nothing unless intensity is positive.
    pub fn is_active(&self) -> bool {
        self.intensity > 0.0
    }

    /// Copy with every field pulled into its valid range.
    ///
    /// Interactive tuning routinely passes through out-of-range values, so
    /// these are clamped rather than rejected. NaNs fall back to defaults.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |v: f32, fallback: f32| if v.is_nan() { fallback } else { v };
        Self {
            threshold: finite_or(self.threshold, defaults.threshold).max(0.0),
            intensity: finite_or(self.intensity, 0.0).max(0.0),
            scatter: finite_or(self.scatter, defaults.scatter).clamp(0.0, 1.0),
            clamp: finite_or(self.clamp, defaults.clamp).max(0.0),
            tint: if self.tint.is_nan() {
                Vec3::ONE
            } else {
                self.tint.max(Vec3::ZERO)
            },
            max_iterations: self.max_iterations.clamp(1, MAX_PYRAMID_SIZE),
            high_quality_filtering: self.high_quality_filtering,
        }
    }

    /// Derived prefilter constants.
    pub fn prefilter(&self) -> Prefilter {
        let threshold = gamma_to_linear(self.threshold);
        Prefilter {
            threshold,
            knee: threshold * 0.5,
            clamp: self.clamp,
        }
    }

    /// Upsample blend factor: scatter remapped into \[0.05, 0.95\].
    pub fn scatter_blend(&self) -> f32 {
        lerp(0.05, 0.95, self.scatter)
    }

    /// Filter used to read lower mips and the final bloom texture.
    pub fn upsample_filter(&self) -> Filter {
        if self.high_quality_filtering {
            Filter::Bicubic
        } else {
            Filter::Bilinear
        }
    }
}

/// Linear-space prefilter constants derived from [`BloomParameters`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prefilter {
    /// Threshold in linear space.
    pub threshold: f32,
    /// Half-width of the soft transition around the threshold.
    pub knee: f32,
    /// Maximum channel value fed into the bloom.
    pub clamp: f32,
}

impl Prefilter {
    /// Soft-knee response for a brightness value.
    ///
    /// Zero below `threshold - knee`, quadratic inside the knee, and
    /// `brightness - threshold` above `threshold + knee`.
    pub fn response(&self, brightness: f32) -> f32 {
        let soft = (brightness - self.threshold + self.knee).clamp(0.0, 2.0 * self.knee);
        let soft = soft * soft / (4.0 * self.knee + KNEE_EPSILON);
        (brightness - self.threshold).max(soft)
    }

    /// Isolate the overbright part of a color.
    pub fn apply(&self, color: Vec3) -> Vec3 {
        let color = color.min(Vec3::splat(self.clamp));
        let brightness = color.max_element();
        let weight = self.response(brightness) / brightness.max(KNEE_EPSILON);
        (color * weight).max(Vec3::ZERO)
    }
}

/// Run `shade(x, y)` for every texel of `dst`, one row per rayon task.
fn run_pass(dst: &mut HdrImage, shade: impl Fn(u32, u32) -> Vec3 + Sync) {
    let width = dst.width() as usize;
    let format = dst.format();
    dst.pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, texel) in row.iter_mut().enumerate() {
                *texel = format.quantize(shade(x as u32, y as u32));
            }
        });
}

/// Prefilter `source` into `dst` (normally half its resolution).
pub fn prefilter_pass(source: &HdrImage, dst: &mut HdrImage, prefilter: &Prefilter) {
    let (w, h) = dst.dimensions();
    run_pass(dst, |x, y| {
        let (u, v) = texel_center_uv(x, y, w, h);
        prefilter.apply(sample_bilinear(source, u, v))
    });
}

/// Horizontal 9-tap Gaussian that also halves resolution: `src` → `dst`.
///
/// Taps are two source texels apart, so each one averages a texel pair.
pub fn blur_horizontal_downsample(src: &HdrImage, dst: &mut HdrImage) {
    let (w, h) = dst.dimensions();
    let step = 2.0 / src.width() as f32;
    run_pass(dst, |x, y| {
        let (u, v) = texel_center_uv(x, y, w, h);
        let mut sum = sample_bilinear(src, u, v) * GAUSSIAN_WEIGHTS[0];
        for (k, weight) in GAUSSIAN_WEIGHTS.iter().enumerate().skip(1) {
            let offset = step * k as f32;
            sum += (sample_bilinear(src, u - offset, v) + sample_bilinear(src, u + offset, v))
                * *weight;
        }
        sum
    });
}

/// Vertical 9-tap Gaussian at the same resolution: `src` → `dst`.
pub fn blur_vertical(src: &HdrImage, dst: &mut HdrImage) {
    run_pass(dst, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let mut sum = src.fetch(x, y) * GAUSSIAN_WEIGHTS[0];
        for (k, weight) in GAUSSIAN_WEIGHTS.iter().enumerate().skip(1) {
            let k = k as i64;
            sum += (src.fetch(x, y - k) + src.fetch(x, y + k)) * *weight;
        }
        sum
    });
}

/// Blend `high` with the upsampled `low` mip by `scatter`: result → `dst`.
pub fn upsample_blend(
    high: &HdrImage,
    low: &HdrImage,
    dst: &mut HdrImage,
    scatter: f32,
    filter: Filter,
) {
    let (w, h) = dst.dimensions();
    run_pass(dst, |x, y| {
        let (u, v) = texel_center_uv(x, y, w, h);
        high.pixel(x, y).lerp(sample(low, u, v, filter), scatter)
    });
}
