//! Image file I/O.
//!
//! Float formats (EXR, Radiance HDR) are read and written as linear RGB.
//! 8-bit formats are treated as sRGB: decoded to linear on load, encoded and
//! clamped to `[0, 1]` on save.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, Rgb32FImage, RgbImage};
use lumen_render::HdrImage;
use lumen_render::color::{linear_to_srgb, srgb_to_linear};

/// Extensions written as linear float data.
const FLOAT_EXTENSIONS: [&str; 2] = ["exr", "hdr"];

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// True when `path` names a linear float format.
pub fn is_float_format(path: &Path) -> bool {
    extension(path).is_some_and(|ext| FLOAT_EXTENSIONS.contains(&ext.as_str()))
}

/// Load `path` as a linear HDR image.
pub fn load_image(path: &Path) -> Result<HdrImage> {
    let decoded =
        image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let linear = matches!(
        decoded,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)
    );
    let rgb = decoded.into_rgb32f();
    let (width, height) = rgb.dimensions();
    let mut image = HdrImage::from_rgb_f32(width, height, rgb.as_raw())
        .with_context(|| format!("{} has no pixels", path.display()))?;
    if !linear {
        for pixel in image.pixels_mut() {
            *pixel = srgb_to_linear(*pixel);
        }
    }
    tracing::debug!(linear, "decoded {}x{} image", width, height);
    Ok(image)
}

/// Write `image` to `path`, picking the encoding from the extension.
pub fn save_image(image: &HdrImage, path: &Path) -> Result<()> {
    let (width, height) = image.dimensions();
    let encoded = if is_float_format(path) {
        let buffer = Rgb32FImage::from_raw(width, height, image.to_rgb_f32())
            .context("pixel buffer does not match image size")?;
        DynamicImage::ImageRgb32F(buffer)
    } else {
        let bytes = image
            .pixels()
            .iter()
            .flat_map(|p| linear_to_srgb(p.clamp(glam::Vec3::ZERO, glam::Vec3::ONE)).to_array())
            .map(|c| (c * 255.0 + 0.5) as u8)
            .collect();
        let buffer = RgbImage::from_raw(width, height, bytes)
            .context("pixel buffer does not match image size")?;
        DynamicImage::ImageRgb8(buffer)
    };
    encoded
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// `<stem>_bloom.<ext>` next to `input`, keeping its extension (EXR if none).
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = extension(input).unwrap_or_else(|| "exr".to_string());
    input.with_file_name(format!("{stem}_bloom.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("shots/sunset.exr")),
            PathBuf::from("shots/sunset_bloom.exr")
        );
        assert_eq!(
            default_output_path(Path::new("frame.PNG")),
            PathBuf::from("frame_bloom.png")
        );
        assert_eq!(
            default_output_path(Path::new("raw")),
            PathBuf::from("raw_bloom.exr")
        );
    }

    #[test]
    fn test_float_format_detection() {
        assert!(is_float_format(Path::new("a.exr")));
        assert!(is_float_format(Path::new("a.HDR")));
        assert!(!is_float_format(Path::new("a.png")));
        assert!(!is_float_format(Path::new("a")));
    }

    #[test]
    fn test_exr_keeps_linear_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bright.exr");
        let mut image = HdrImage::filled(4, 2, Vec3::new(0.25, 1.0, 8.0)).unwrap();
        image.set_pixel(3, 1, Vec3::splat(100.0));

        save_image(&image, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.dimensions(), (4, 2));
        assert_eq!(loaded.pixel(0, 0), Vec3::new(0.25, 1.0, 8.0));
        assert_eq!(loaded.pixel(3, 1), Vec3::splat(100.0));
    }

    #[test]
    fn test_png_is_srgb_encoded_and_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldr.png");
        let mut image = HdrImage::filled(2, 2, Vec3::splat(0.214_041)).unwrap();
        image.set_pixel(1, 1, Vec3::splat(5.0));

        save_image(&image, &path).unwrap();
        let raw = image::open(&path).unwrap().into_rgb8();
        // Linear 0.214 is sRGB 0.5.
        let mid = raw.get_pixel(0, 0).0[0];
        assert!((127..=128).contains(&mid), "{mid}");
        assert_eq!(raw.get_pixel(1, 1).0, [255, 255, 255]);

        let loaded = load_image(&path).unwrap();
        assert!((loaded.pixel(0, 0).x - 0.214).abs() < 3e-3);
        assert!((loaded.pixel(1, 1) - Vec3::ONE).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_image(Path::new("does/not/exist.exr")).unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.exr"));
    }
}
