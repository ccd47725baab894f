//! HDR image buffers and their storage formats.
//!
//! [`HdrImage`] is the unit every pass reads and writes: a row-major grid of
//! linear RGB `f32` texels tagged with a [`TextureFormat`]. The format decides
//! how values are quantized when a pass stores them, so a pyramid allocated as
//! [`TextureFormat::Rg11b10Float`] loses precision the same way a packed GPU
//! render target would.

use glam::Vec3;

use crate::error::RenderError;

/// Largest value representable by an 11-bit unsigned float (6-bit mantissa).
const UFLOAT11_MAX: f32 = 65024.0;
/// Largest value representable by a 10-bit unsigned float (5-bit mantissa).
const UFLOAT10_MAX: f32 = 64512.0;
/// Smallest normal value of the packed unsigned float formats (2^-14).
const UFLOAT_MIN_NORMAL: f32 = 6.103_515_6e-5;

/// Storage format of an [`HdrImage`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Full 32-bit float per channel. Values are stored unchanged.
    #[default]
    Rgb32Float,
    /// Packed unsigned float, 11/11/10 bits. Negative values clamp to zero.
    Rg11b10Float,
}

impl TextureFormat {
    /// Nominal size of one texel in bytes, used for pool accounting.
    pub fn bytes_per_pixel(self) -> u64 {
        match self {
            Self::Rgb32Float => 12,
            Self::Rg11b10Float => 4,
        }
    }

    /// Round a color to the precision this format can hold.
    pub fn quantize(self, color: Vec3) -> Vec3 {
        match self {
            Self::Rgb32Float => color,
            Self::Rg11b10Float => Vec3::new(
                quantize_ufloat(color.x, 6, UFLOAT11_MAX),
                quantize_ufloat(color.y, 6, UFLOAT11_MAX),
                quantize_ufloat(color.z, 5, UFLOAT10_MAX),
            ),
        }
    }
}

/// Round `value` to an unsigned float with `mantissa_bits` of mantissa.
fn quantize_ufloat(value: f32, mantissa_bits: u32, max: f32) -> f32 {
    if value.is_nan() || value <= 0.0 {
        return 0.0;
    }
    if value >= max {
        return max;
    }
    if value < UFLOAT_MIN_NORMAL {
        let step = UFLOAT_MIN_NORMAL / (1u32 << mantissa_bits) as f32;
        return (value / step).round() * step;
    }
    let drop = 23 - mantissa_bits;
    let half = 1u32 << (drop - 1);
    let rounded = (value.to_bits() + half) & !((1u32 << drop) - 1);
    f32::from_bits(rounded).min(max)
}

/// A 2D high-dynamic-range image in linear RGB.
#[derive(Clone, Debug, PartialEq)]
pub struct HdrImage {
    width: u32,
    height: u32,
    format: TextureFormat,
    pixels: Vec<Vec3>,
}

impl HdrImage {
    /// Create a black image.
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            format,
            pixels: vec![Vec3::ZERO; width as usize * height as usize],
        })
    }

    /// Create an `Rgb32Float` image filled with one color.
    pub fn filled(width: u32, height: u32, color: Vec3) -> Result<Self, RenderError> {
        let mut image = Self::new(width, height, TextureFormat::Rgb32Float)?;
        image.pixels.fill(color);
        Ok(image)
    }

    /// Wrap existing row-major pixels as an `Rgb32Float` image.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RenderError::DataSizeMismatch {
                actual: pixels.len(),
                expected,
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            format: TextureFormat::Rgb32Float,
            pixels,
        })
    }

    /// Build an image from interleaved `[r, g, b, r, g, b, ...]` floats.
    pub fn from_rgb_f32(width: u32, height: u32, data: &[f32]) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(RenderError::DataSizeMismatch {
                actual: data.len(),
                expected,
                width,
                height,
            });
        }
        let pixels = data.chunks_exact(3).map(Vec3::from_slice).collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Interleaved `[r, g, b, ...]` copy of the pixels.
    pub fn to_rgb_f32(&self) -> Vec<f32> {
        self.pixels.iter().flat_map(|p| p.to_array()).collect()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Nominal memory footprint in bytes for this size and format.
    pub fn byte_size(&self) -> u64 {
        image_byte_size(self.width, self.height, self.format)
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec3] {
        &mut self.pixels
    }

    /// Texel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Store a texel, quantized to the image format. Panics when out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Vec3) {
        let index = y as usize * self.width as usize + x as usize;
        self.pixels[index] = self.format.quantize(color);
    }

    /// Texel fetch with clamp-to-edge addressing.
    pub fn fetch(&self, x: i64, y: i64) -> Vec3 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Copy `other` into `self`, quantizing to this image's format.
    pub fn copy_from(&mut self, other: &HdrImage) -> Result<(), RenderError> {
        if self.dimensions() != other.dimensions() {
            return Err(RenderError::SizeMismatch {
                src_width: other.width,
                src_height: other.height,
                dst_width: self.width,
                dst_height: self.height,
            });
        }
        let format = self.format;
        for (dst, src) in self.pixels.iter_mut().zip(&other.pixels) {
            *dst = format.quantize(*src);
        }
        Ok(())
    }
}

/// Nominal byte size of a `width` x `height` image in `format`.
pub fn image_byte_size(width: u32, height: u32, format: TextureFormat) -> u64 {
    width as u64 * height as u64 * format.bytes_per_pixel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            HdrImage::new(0, 4, TextureFormat::Rgb32Float),
            Err(RenderError::ZeroDimensions { width: 0, height: 4 })
        ));
        assert!(HdrImage::filled(4, 0, Vec3::ONE).is_err());
    }

    #[test]
    fn test_data_size_mismatch() {
        let result = HdrImage::from_rgb_f32(2, 2, &[0.0; 11]);
        assert!(matches!(
            result,
            Err(RenderError::DataSizeMismatch {
                actual: 11,
                expected: 12,
                ..
            })
        ));
    }

    #[test]
    fn test_interleaved_roundtrip() {
        let data: Vec<f32> = (0..12).map(|i| i as f32 * 0.5).collect();
        let image = HdrImage::from_rgb_f32(2, 2, &data).unwrap();
        assert_eq!(image.pixel(1, 0), Vec3::new(1.5, 2.0, 2.5));
        assert_eq!(image.to_rgb_f32(), data);
    }

    #[test]
    fn test_fetch_clamps_to_edge() {
        let mut image = HdrImage::new(3, 2, TextureFormat::Rgb32Float).unwrap();
        image.set_pixel(2, 1, Vec3::splat(7.0));
        assert_eq!(image.fetch(10, 10), Vec3::splat(7.0));
        assert_eq!(image.fetch(-5, -5), Vec3::ZERO);
    }

    #[test]
    fn test_packed_format_precision() {
        let q = TextureFormat::Rg11b10Float.quantize(Vec3::new(1.0, -2.0, 1e9));
        assert_eq!(q, Vec3::new(1.0, 0.0, UFLOAT10_MAX));

        let value = 0.123_456_7;
        let packed = TextureFormat::Rg11b10Float.quantize(Vec3::splat(value));
        // 6-bit mantissa: relative error below 2^-7.
        assert!((packed.x - value).abs() / value < 1.0 / 128.0);
        assert!((packed.z - value).abs() / value < 1.0 / 64.0);
        assert_eq!(TextureFormat::Rg11b10Float.quantize(packed), packed);
    }

    #[test]
    fn test_byte_size_tracks_format() {
        let a = HdrImage::new(4, 4, TextureFormat::Rgb32Float).unwrap();
        let b = HdrImage::new(4, 4, TextureFormat::Rg11b10Float).unwrap();
        assert_eq!(a.byte_size(), 192);
        assert_eq!(b.byte_size(), 64);
    }
}
