//! Scalar color helpers shared by the bloom and grading passes.

use glam::Vec3;

/// Rec. 709 luma coefficients.
pub const LUMA_REC709: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

/// Converts a gamma-space (sRGB) value to linear space.
pub fn gamma_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Converts a linear value to gamma space (sRGB).
pub fn linear_to_gamma(value: f32) -> f32 {
    if value <= 0.0 {
        0.0
    } else if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Per-channel [`gamma_to_linear`].
pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    Vec3::new(
        gamma_to_linear(color.x),
        gamma_to_linear(color.y),
        gamma_to_linear(color.z),
    )
}

/// Per-channel [`linear_to_gamma`].
pub fn linear_to_srgb(color: Vec3) -> Vec3 {
    Vec3::new(
        linear_to_gamma(color.x),
        linear_to_gamma(color.y),
        linear_to_gamma(color.z),
    )
}

/// Relative luminance of a linear RGB color.
pub fn luminance(color: Vec3) -> f32 {
    color.dot(LUMA_REC709)
}

/// Scalar linear interpolation.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
