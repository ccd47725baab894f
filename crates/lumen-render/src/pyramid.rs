//! Mip pyramid sizing and the per-frame set of pooled pyramid images.

use crate::error::RenderError;
use crate::image::{HdrImage, TextureFormat};
use crate::pool::ImagePool;

/// Number of pyramid levels for a source of `width` x `height`.
///
/// `floor(log2(max(width, height)) - 1)`, clamped to `[1, max_iterations]`.
pub fn pyramid_depth(width: u32, height: u32, max_iterations: u32) -> u32 {
    let max_size = width.max(height).max(1);
    // ilog2 is the exact floor(log2(n)) for integers.
    let iterations = max_size.ilog2() as i64 - 1;
    iterations.clamp(1, max_iterations.max(1) as i64) as u32
}

/// Dimensions of one level below a parent of `width` x `height`.
pub fn half_size(width: u32, height: u32) -> (u32, u32) {
    ((width >> 1).max(1), (height >> 1).max(1))
}

/// Dimensions of every pyramid level, level 0 being half the source size.
pub fn mip_dimensions(width: u32, height: u32, depth: u32) -> Vec<(u32, u32)> {
    let mut dims = Vec::with_capacity(depth as usize);
    let mut size = half_size(width, height);
    for i in 0..depth {
        dims.push(size);
        log::trace!("Bloom mip {i}: {}x{}", size.0, size.1);
        size = half_size(size.0, size.1);
    }
    dims
}

/// Pyramid images borrowed from an [`ImagePool`] for one frame.
///
/// Every level has a `down` image; `up` images exist only when the pyramid
/// is deeper than one level. All images go back to the pool on drop, so early
/// returns and errors cannot leak them.
pub struct PooledPyramid<'a> {
    pool: &'a mut ImagePool,
    pub(crate) down: Vec<HdrImage>,
    pub(crate) up: Vec<HdrImage>,
}

impl<'a> PooledPyramid<'a> {
    /// Acquire all levels for a source of `width` x `height`.
    pub fn acquire(
        pool: &'a mut ImagePool,
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
    ) -> Result<Self, RenderError> {
        let mut pyramid = Self {
            pool,
            down: Vec::with_capacity(depth as usize),
            up: Vec::with_capacity(depth as usize),
        };
        for (w, h) in mip_dimensions(width, height, depth) {
            let down = pyramid.pool.acquire(w, h, format)?;
            pyramid.down.push(down);
            if depth > 1 {
                let up = pyramid.pool.acquire(w, h, format)?;
                pyramid.up.push(up);
            }
        }
        Ok(pyramid)
    }

    pub fn depth(&self) -> u32 {
        self.down.len() as u32
    }

    /// The final bloom image: `up[0]`, or `down[0]` for a single-level pyramid.
    pub fn bloom(&self) -> &HdrImage {
        self.up.first().unwrap_or(&self.down[0])
    }

    /// Remove the final bloom image from the pyramid, detaching it from the pool.
    pub fn take_bloom(mut self) -> HdrImage {
        let image = if self.up.is_empty() {
            self.down.swap_remove(0)
        } else {
            self.up.swap_remove(0)
        };
        self.pool.detach(&image);
        image
    }
}

impl Drop for PooledPyramid<'_> {
    fn drop(&mut self) {
        for image in self.down.drain(..).chain(self.up.drain(..)) {
            self.pool.release(image);
        }
    }
}
