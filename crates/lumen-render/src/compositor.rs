//! The bloom compositor: runs the pyramid and the final composite pass.
//!
//! A [`BloomCompositor`] owns its [`ImagePool`], so each instance has its own
//! set of pyramid images. Frames in flight concurrently need one compositor
//! each. When the pyramid shape changes between frames, pooled images of the
//! old shape are dropped so the pool holds at most one frame's worth.

use glam::Vec3;
use rayon::prelude::*;

use crate::bloom::{
    BloomParameters, blur_horizontal_downsample, blur_vertical, prefilter_pass, upsample_blend,
};
use crate::error::RenderError;
use crate::grading::{ColorAdjustments, ColorGrading};
use crate::image::{HdrImage, TextureFormat};
use crate::pool::ImagePool;
use crate::pyramid::{PooledPyramid, mip_dimensions, pyramid_depth};
use crate::sampling::{Filter, sample};

/// Everything the final composite pass needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeSettings {
    pub bloom: BloomParameters,
    /// Color adjustments and tonemapping. `None` skips grading.
    pub color: Option<ColorAdjustments>,
}

/// Summary of one composite call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeReport {
    /// Whether bloom was computed and added.
    pub bloom_active: bool,
    /// Pyramid depth used, 0 when bloom was inactive.
    pub pyramid_depth: u32,
    /// Size of the bloom texture, when bloom was active.
    pub bloom_size: Option<(u32, u32)>,
    /// Whether color grading changed the image.
    pub grading_active: bool,
}

/// A finished bloom texture handed to the caller by [`BloomCompositor::render`].
#[derive(Clone, Debug, PartialEq)]
pub struct BloomTexture {
    image: HdrImage,
    depth: u32,
}

impl BloomTexture {
    /// The bloom image, at half the source resolution.
    pub fn image(&self) -> &HdrImage {
        &self.image
    }

    /// Pyramid depth that produced this texture.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Take the bloom image out of the texture.
    pub fn into_image(self) -> HdrImage {
        self.image
    }
}

/// Stateless-per-frame bloom compositor with an owned image pool.
#[derive(Debug)]
pub struct BloomCompositor {
    pool: ImagePool,
    format: TextureFormat,
    /// `(width, height, depth)` of the last pyramid built.
    last_shape: Option<(u32, u32, u32)>,
}

impl Default for BloomCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl BloomCompositor {
    /// Compositor with packed-float pyramid images and an unbounded pool.
    pub fn new() -> Self {
        Self {
            pool: ImagePool::new(),
            format: TextureFormat::Rg11b10Float,
            last_shape: None,
        }
    }

    /// Use `format` for pyramid images.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    /// Cap the pool at `bytes`. Exceeding it fails the frame.
    pub fn with_pool_budget(mut self, bytes: u64) -> Self {
        self.pool = ImagePool::with_budget(bytes);
        self
    }

    /// Format of the pyramid images.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The image pool, for inspecting memory use.
    pub fn pool(&self) -> &ImagePool {
        &self.pool
    }

    /// Drop every pooled image that is not in use.
    pub fn trim(&mut self) {
        self.pool.trim();
    }

    /// Compute the bloom texture for `source`.
    ///
    /// Returns `Ok(None)` when `params` leave bloom inactive. Out-of-range
    /// parameters are clamped.
    pub fn render(
        &mut self,
        source: &HdrImage,
        params: &BloomParameters,
    ) -> Result<Option<BloomTexture>, RenderError> {
        let params = params.sanitized();
        if !params.is_active() {
            return Ok(None);
        }
        let pyramid = self.build_pyramid(source, &params)?;
        let depth = pyramid.depth();
        Ok(Some(BloomTexture {
            image: pyramid.take_bloom(),
            depth,
        }))
    }

    /// Hand a bloom texture back so its image can be reused.
    pub fn recycle(&mut self, texture: BloomTexture) {
        self.pool.adopt(texture.image);
    }

    /// Write `source` plus bloom, graded, into `destination`.
    ///
    /// With bloom inactive and no grading this is a plain copy. Nothing is
    /// written to `destination` unless the whole frame succeeds.
    pub fn composite(
        &mut self,
        source: &HdrImage,
        destination: &mut HdrImage,
        settings: &CompositeSettings,
    ) -> Result<CompositeReport, RenderError> {
        if source.dimensions() != destination.dimensions() {
            return Err(RenderError::SizeMismatch {
                src_width: source.width(),
                src_height: source.height(),
                dst_width: destination.width(),
                dst_height: destination.height(),
            });
        }

        let params = settings.bloom.sanitized();
        let grading = settings
            .color
            .as_ref()
            .filter(|c| !c.is_identity())
            .map(ColorAdjustments::prepare);

        if !params.is_active() {
            log::trace!("bloom inactive, pass-through composite");
            match &grading {
                Some(grading) => composite_pass(source, None, destination, grading),
                None => destination.copy_from(source)?,
            }
            return Ok(CompositeReport {
                bloom_active: false,
                pyramid_depth: 0,
                bloom_size: None,
                grading_active: grading.is_some(),
            });
        }

        let pyramid = self.build_pyramid(source, &params)?;
        let bloom = BloomInput {
            image: pyramid.bloom(),
            scale: params.tint * params.intensity,
            filter: params.upsample_filter(),
        };
        let identity = ColorAdjustments::default().prepare();
        composite_pass(
            source,
            Some(&bloom),
            destination,
            grading.as_ref().unwrap_or(&identity),
        );

        Ok(CompositeReport {
            bloom_active: true,
            pyramid_depth: pyramid.depth(),
            bloom_size: Some(pyramid.bloom().dimensions()),
            grading_active: grading.is_some(),
        })
    }

    /// [`composite`](Self::composite) with the destination aliasing the source.
    pub fn composite_in_place(
        &mut self,
        image: &mut HdrImage,
        settings: &CompositeSettings,
    ) -> Result<CompositeReport, RenderError> {
        let source = image.clone();
        self.composite(&source, image, settings)
    }

    /// Prefilter, downsample and upsample `source` into a pooled pyramid.
    fn build_pyramid(
        &mut self,
        source: &HdrImage,
        params: &BloomParameters,
    ) -> Result<PooledPyramid<'_>, RenderError> {
        let (width, height) = source.dimensions();
        let depth = pyramid_depth(width, height, params.max_iterations);
        self.evict_stale_levels(width, height, depth);

        let mut pyramid =
            PooledPyramid::acquire(&mut self.pool, width, height, depth, self.format)?;
        log::debug!("bloom: {width}x{height} source, {depth} levels");
        let depth = depth as usize;

        prefilter_pass(source, &mut pyramid.down[0], &params.prefilter());

        // Two-pass Gaussian per level, using `up[i]` as the intermediate.
        for i in 1..depth {
            blur_horizontal_downsample(&pyramid.down[i - 1], &mut pyramid.up[i]);
            blur_vertical(&pyramid.up[i], &mut pyramid.down[i]);
        }

        let scatter = params.scatter_blend();
        let filter = params.upsample_filter();
        for i in (0..depth.saturating_sub(1)).rev() {
            let (up_head, up_tail) = pyramid.up.split_at_mut(i + 1);
            let low = if i + 2 == depth {
                &pyramid.down[i + 1]
            } else {
                &up_tail[0]
            };
            upsample_blend(&pyramid.down[i], low, &mut up_head[i], scatter, filter);
        }

        Ok(pyramid)
    }

    /// Drop free pool images that the pyramid for this shape will not use.
    fn evict_stale_levels(&mut self, width: u32, height: u32, depth: u32) {
        let shape = (width, height, depth);
        if self.last_shape == Some(shape) {
            return;
        }
        if let Some((old_width, old_height, _)) = self.last_shape {
            log::debug!("bloom: source resized {old_width}x{old_height} -> {width}x{height}");
        }
        let levels = mip_dimensions(width, height, depth);
        let format = self.format;
        self.pool
            .retain(|key| key.format == format && levels.contains(&(key.width, key.height)));
        self.last_shape = Some(shape);
    }
}

/// Bloom texture plus the factors it is composited with.
struct BloomInput<'a> {
    image: &'a HdrImage,
    /// Tint times intensity.
    scale: Vec3,
    filter: Filter,
}

/// Final pass: add bloom, grade, store into `destination`.
fn composite_pass(
    source: &HdrImage,
    bloom: Option<&BloomInput<'_>>,
    destination: &mut HdrImage,
    grading: &ColorGrading,
) {
    let (width, height) = source.dimensions();
    let format = destination.format();
    destination
        .pixels_mut()
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            for (x, texel) in row.iter_mut().enumerate() {
                let x = x as u32;
                let mut color = source.pixel(x, y);
                if let Some(bloom) = bloom {
                    let u = (x as f32 + 0.5) / width as f32;
                    let v = (y as f32 + 0.5) / height as f32;
                    color += sample(bloom.image, u, v, bloom.filter) * bloom.scale;
                }
                *texel = format.quantize(grading.apply(color));
            }
        });
}

#[cfg(test)]
#[path = "compositor_tests.rs"]
mod tests;
