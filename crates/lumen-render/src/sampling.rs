//! Texture filtering on [`HdrImage`]s with clamp-to-edge addressing.
//!
//! Coordinates are normalized UVs: `(0, 0)` is the top-left corner of the
//! image and texel centers sit at `(i + 0.5) / size`.

use glam::Vec3;

use crate::image::HdrImage;

/// Reconstruction filter used when reading a lower-resolution image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    /// 2x2 bilinear.
    #[default]
    Bilinear,
    /// 4x4 cubic B-spline. Smoother, removes the blocky look of small mips.
    Bicubic,
}

/// Normalized UV of the center of texel `(x, y)` in a `width` x `height` grid.
#[inline]
pub fn texel_center_uv(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    (
        (x as f32 + 0.5) / width as f32,
        (y as f32 + 0.5) / height as f32,
    )
}

/// Sample `image` at `(u, v)` with `filter`.
#[inline]
pub fn sample(image: &HdrImage, u: f32, v: f32, filter: Filter) -> Vec3 {
    match filter {
        Filter::Bilinear => sample_bilinear(image, u, v),
        Filter::Bicubic => sample_bicubic(image, u, v),
    }
}

/// Bilinear sample at `(u, v)`.
pub fn sample_bilinear(image: &HdrImage, u: f32, v: f32) -> Vec3 {
    let px = u * image.width() as f32 - 0.5;
    let py = v * image.height() as f32 - 0.5;
    let x0 = px.floor();
    let y0 = py.floor();
    let fx = px - x0;
    let fy = py - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let top = image.fetch(x0, y0).lerp(image.fetch(x0 + 1, y0), fx);
    let bottom = image.fetch(x0, y0 + 1).lerp(image.fetch(x0 + 1, y0 + 1), fx);
    top.lerp(bottom, fy)
}

/// Cubic B-spline weights for the four taps around fractional offset `t`.
#[inline]
fn bspline_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        (1.0 - 3.0 * t + 3.0 * t2 - t3) / 6.0,
        (4.0 - 6.0 * t2 + 3.0 * t3) / 6.0,
        (1.0 + 3.0 * t + 3.0 * t2 - 3.0 * t3) / 6.0,
        t3 / 6.0,
    ]
}

/// Bicubic B-spline sample at `(u, v)`.
pub fn sample_bicubic(image: &HdrImage, u: f32, v: f32) -> Vec3 {
    let px = u * image.width() as f32 - 0.5;
    let py = v * image.height() as f32 - 0.5;
    let ix = px.floor();
    let iy = py.floor();
    let wx = bspline_weights(px - ix);
    let wy = bspline_weights(py - iy);
    let (ix, iy) = (ix as i64, iy as i64);

    let mut sum = Vec3::ZERO;
    for (j, wy) in wy.iter().enumerate() {
        let y = iy - 1 + j as i64;
        let mut row = Vec3::ZERO;
        for (i, wx) in wx.iter().enumerate() {
            row += image.fetch(ix - 1 + i as i64, y) * *wx;
        }
        sum += row * *wy;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::TextureFormat;

    fn checker() -> HdrImage {
        let mut image = HdrImage::new(2, 2, TextureFormat::Rgb32Float).unwrap();
        image.set_pixel(0, 0, Vec3::splat(1.0));
        image.set_pixel(1, 1, Vec3::splat(1.0));
        image
    }

    #[test]
    fn test_bilinear_hits_texel_centers_exactly() {
        let image = checker();
        let (u, v) = texel_center_uv(0, 0, 2, 2);
        assert_eq!(sample_bilinear(&image, u, v), Vec3::splat(1.0));
        let (u, v) = texel_center_uv(1, 0, 2, 2);
        assert_eq!(sample_bilinear(&image, u, v), Vec3::ZERO);
    }

    #[test]
    fn test_bilinear_averages_at_corner() {
        let image = checker();
        assert_eq!(sample_bilinear(&image, 0.5, 0.5), Vec3::splat(0.5));
    }

    #[test]
    fn test_bspline_weights_partition_unity() {
        for i in 0..=10 {
            let sum: f32 = bspline_weights(i as f32 / 10.0).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_filters_preserve_constant_images() {
        let image = HdrImage::filled(5, 3, Vec3::new(0.25, 2.0, 8.0)).unwrap();
        for filter in [Filter::Bilinear, Filter::Bicubic] {
            let s = sample(&image, 0.37, 0.81, filter);
            assert!((s - Vec3::new(0.25, 2.0, 8.0)).abs().max_element() < 1e-5);
        }
    }
}
