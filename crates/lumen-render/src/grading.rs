//! Color adjustments and tonemapping applied in the final composite.
//!
//! Order per pixel: exposure, white balance, contrast, color filter,
//! saturation, tonemapping. Every slider is in `[-100, 100]` with 0 meaning
//! "no change".

use glam::{Mat3, Vec3};

use crate::color::luminance;

/// LogC encoding of 18% grey, the pivot for contrast.
const LOGC_MIDGRAY: f32 = 0.391_007;

// LogC (ALEXA EI 1000) curve parameters.
const LOGC_CUT: f32 = 0.011_361;
const LOGC_A: f32 = 5.555_556;
const LOGC_B: f32 = 0.047_996;
const LOGC_C: f32 = 0.244_161;
const LOGC_D: f32 = 0.386_036;
const LOGC_E: f32 = 5.301_883;
const LOGC_F: f32 = 0.092_819;

/// Linear sRGB → LMS cone response. Columns as glam expects.
const LIN_TO_LMS: Mat3 = Mat3::from_cols_array(&[
    3.904_05e-1, 7.084_16e-2, 2.310_82e-2,
    5.499_41e-1, 9.631_72e-1, 1.280_21e-1,
    8.926_32e-3, 1.357_75e-3, 9.362_45e-1,
]);

/// LMS → linear sRGB.
const LMS_TO_LIN: Mat3 = Mat3::from_cols_array(&[
    2.858_47, -2.101_82e-1, -4.181_20e-2,
    -1.628_79, 1.158_20, -1.181_69e-1,
    -2.489_10e-2, 3.242_81e-4, 1.068_67,
]);

/// Tonemapping curve applied last.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TonemappingMode {
    /// Leave HDR values untouched.
    #[default]
    None,
    /// Neutral filmic curve with minimal hue and saturation shift.
    Neutral,
    /// ACES filmic approximation.
    Aces,
}

/// Color adjustment settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorAdjustments {
    /// Brightness scale: `exposure / 100 + 1`. Range \[-100, 100\].
    pub exposure: f32,
    /// Expands or shrinks the tonal range around mid grey. Range \[-100, 100\].
    pub contrast: f32,
    /// Pushes color intensity. -100 is greyscale. Range \[-100, 100\].
    pub saturation: f32,
    /// Multiplied into the image (linear RGB).
    pub color_filter: Vec3,
    /// White balance color temperature. Range \[-100, 100\].
    pub temperature: f32,
    /// White balance green/magenta compensation. Range \[-100, 100\].
    pub tint: f32,
    pub tonemapping: TonemappingMode,
}

impl Default for ColorAdjustments {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            color_filter: Vec3::ONE,
            temperature: 0.0,
            tint: 0.0,
            tonemapping: TonemappingMode::None,
        }
    }
}

impl ColorAdjustments {
    /// True when applying these settings cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Copy with every slider clamped to its range.
    pub fn sanitized(&self) -> Self {
        let slider = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-100.0, 100.0) };
        Self {
            exposure: slider(self.exposure),
            contrast: slider(self.contrast),
            saturation: slider(self.saturation),
            color_filter: if self.color_filter.is_nan() {
                Vec3::ONE
            } else {
                self.color_filter.max(Vec3::ZERO)
            },
            temperature: slider(self.temperature),
            tint: slider(self.tint),
            tonemapping: self.tonemapping,
        }
    }

    /// Precompute the per-pixel constants.
    pub fn prepare(&self) -> ColorGrading {
        let s = self.sanitized();
        ColorGrading {
            exposure: s.exposure / 100.0 + 1.0,
            contrast: s.contrast / 100.0 + 1.0,
            saturation: s.saturation / 100.0 + 1.0,
            color_filter: s.color_filter,
            white_balance: (s.temperature != 0.0 || s.tint != 0.0)
                .then(|| white_balance_coefficients(s.temperature, s.tint)),
            tonemapping: s.tonemapping,
        }
    }
}

/// Prepared color grading constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorGrading {
    exposure: f32,
    contrast: f32,
    saturation: f32,
    color_filter: Vec3,
    white_balance: Option<Vec3>,
    tonemapping: TonemappingMode,
}

impl ColorGrading {
    /// Grade one linear HDR color.
    pub fn apply(&self, color: Vec3) -> Vec3 {
        let mut color = color * self.exposure;

        if let Some(balance) = self.white_balance {
            color = LMS_TO_LIN * (LIN_TO_LMS * color * balance);
        }

        if self.contrast != 1.0 {
            let log = linear_to_logc(color);
            color = logc_to_linear((log - LOGC_MIDGRAY) * self.contrast + LOGC_MIDGRAY);
        }

        color *= self.color_filter;

        if self.saturation != 1.0 {
            let luma = luminance(color);
            color = Vec3::splat(luma) + (color - luma) * self.saturation;
        }

        let color = color.max(Vec3::ZERO);
        match self.tonemapping {
            TonemappingMode::None => color,
            TonemappingMode::Neutral => neutral_tonemap(color),
            TonemappingMode::Aces => aces_tonemap(color),
        }
    }
}

/// LMS scale factors that move the D65 white point by `temperature`/`tint`.
pub fn white_balance_coefficients(temperature: f32, tint: f32) -> Vec3 {
    let t1 = temperature / 65.0;
    let t2 = tint / 65.0;

    // CIE xy chromaticity of the target white.
    let x = 0.31271 - t1 * if t1 < 0.0 { 0.1 } else { 0.05 };
    let y = standard_illuminant_y(x) + t2 * 0.05;

    // D65 white point in LMS.
    let w1 = Vec3::new(0.949_237, 1.035_42, 1.087_28);
    let w2 = cie_xy_to_lms(x, y);
    w1 / w2
}

fn standard_illuminant_y(x: f32) -> f32 {
    2.87 * x - 3.0 * x * x - 0.275_095_07
}

fn cie_xy_to_lms(x: f32, y: f32) -> Vec3 {
    let big_y = 1.0_f32;
    let big_x = big_y * x / y;
    let big_z = big_y * (1.0 - x - y) / y;
    Vec3::new(
        0.7328 * big_x + 0.4296 * big_y - 0.1624 * big_z,
        -0.7036 * big_x + 1.6975 * big_y + 0.0061 * big_z,
        0.0030 * big_x + 0.0136 * big_y + 0.9834 * big_z,
    )
}

fn per_channel(color: Vec3, f: impl Fn(f32) -> f32) -> Vec3 {
    Vec3::new(f(color.x), f(color.y), f(color.z))
}

fn linear_to_logc(color: Vec3) -> Vec3 {
    per_channel(color, |x| {
        if x > LOGC_CUT {
            LOGC_C * (LOGC_A * x + LOGC_B).log10() + LOGC_D
        } else {
            LOGC_E * x + LOGC_F
        }
    })
}

fn logc_to_linear(color: Vec3) -> Vec3 {
    per_channel(color, |x| {
        if x > LOGC_E * LOGC_CUT + LOGC_F {
            (10f32.powf((x - LOGC_D) / LOGC_C) - LOGC_B) / LOGC_A
        } else {
            (x - LOGC_F) / LOGC_E
        }
    })
}

fn neutral_curve(x: Vec3, a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Vec3 {
    ((x * (a * x + c * b) + d * e) / (x * (a * x + b) + d * f)) - e / f
}

/// Neutral filmic tonemapper.
pub fn neutral_tonemap(color: Vec3) -> Vec3 {
    let (a, b, c, d, e, f) = (0.2_f32, 0.29, 0.24, 0.272, 0.02, 0.3);
    let white_level = 5.3_f32;
    let white_clip = 1.0_f32;

    let white_scale = Vec3::ONE / neutral_curve(Vec3::splat(white_level), a, b, c, d, e, f);
    let mapped = neutral_curve(color * white_scale, a, b, c, d, e, f) * white_scale;
    (mapped / white_clip).clamp(Vec3::ZERO, Vec3::ONE)
}

/// ACES filmic curve fit.
pub fn aces_tonemap(hdr: Vec3) -> Vec3 {
    let a = 2.51_f32;
    let b = 0.03_f32;
    let c = 2.43_f32;
    let d = 0.59_f32;
    let e = 0.14_f32;
    ((hdr * (a * hdr + b)) / (hdr * (c * hdr + d) + e)).clamp(Vec3::ZERO, Vec3::ONE)
}
