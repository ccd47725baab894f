//! Image pool for reusing intermediate bloom targets across frames.
//!
//! Instead of allocating a fresh mip pyramid every frame, the [`ImagePool`]
//! keeps released images bucketed by `(width, height, format)`. A frame at an
//! unchanged resolution reuses last frame's images. After a resolution change
//! the old buckets are dead weight; [`ImagePool::retain`] drops them and
//! [`ImagePool::trim`] drops everything free.

use rustc_hash::FxHashMap;

use crate::error::RenderError;
use crate::image::{HdrImage, TextureFormat, image_byte_size};

/// Bucket key for pooled images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl PoolKey {
    fn of(image: &HdrImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            format: image.format(),
        }
    }

    fn byte_size(&self) -> u64 {
        image_byte_size(self.width, self.height, self.format)
    }
}

/// A pool of HDR images bucketed by size and format.
///
/// Tracks total allocated and in-use bytes. An optional byte budget turns
/// runaway allocation into [`RenderError::PoolExhausted`].
#[derive(Debug, Default)]
pub struct ImagePool {
    free: FxHashMap<PoolKey, Vec<HdrImage>>,
    /// Total bytes currently allocated (in-use + pooled).
    total_allocated: u64,
    /// Total bytes currently handed out.
    in_use: u64,
    budget: Option<u64>,
}

impl ImagePool {
    /// Create an empty pool with no budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty pool that refuses to grow beyond `budget` bytes.
    pub fn with_budget(budget: u64) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    /// Acquire an image of the given size and format.
    ///
    /// Returns a pooled image if one is free (its contents are stale), or
    /// allocates a new black one. When the budget would be exceeded, free
    /// images of other sizes are dropped first.
    pub fn acquire(
        &mut self,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<HdrImage, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroDimensions { width, height });
        }
        let key = PoolKey {
            width,
            height,
            format,
        };
        let size = key.byte_size();

        if let Some(image) = self.free.get_mut(&key).and_then(Vec::pop) {
            self.in_use += size;
            return Ok(image);
        }

        if let Some(budget) = self.budget {
            if self.total_allocated + size > budget {
                self.trim();
            }
            if self.total_allocated + size > budget {
                return Err(RenderError::PoolExhausted {
                    requested: size,
                    allocated: self.total_allocated,
                    budget,
                });
            }
        }

        let image = HdrImage::new(width, height, format)?;
        log::trace!("image pool: allocated {width}x{height} {format:?}");
        self.total_allocated += size;
        self.in_use += size;
        Ok(image)
    }

    /// Return an image to the pool for reuse.
    pub fn release(&mut self, image: HdrImage) {
        let key = PoolKey::of(&image);
        self.in_use = self.in_use.saturating_sub(key.byte_size());
        self.free.entry(key).or_default().push(image);
    }

    /// Stop tracking an in-use image that is handed to the caller for good.
    pub fn detach(&mut self, image: &HdrImage) {
        let size = image.byte_size();
        self.in_use = self.in_use.saturating_sub(size);
        self.total_allocated = self.total_allocated.saturating_sub(size);
    }

    /// Take ownership of an image created elsewhere as a free pool entry.
    pub fn adopt(&mut self, image: HdrImage) {
        self.total_allocated += image.byte_size();
        self.free.entry(PoolKey::of(&image)).or_default().push(image);
    }

    /// Drop free images whose key fails `keep`. In-use images are untouched.
    pub fn retain(&mut self, mut keep: impl FnMut(&PoolKey) -> bool) {
        let mut freed = 0u64;
        self.free.retain(|key, images| {
            let kept = keep(key);
            if !kept {
                freed += key.byte_size() * images.len() as u64;
            }
            kept
        });
        if freed > 0 {
            log::debug!("image pool: trimmed {freed} bytes");
        }
        self.total_allocated = self.total_allocated.saturating_sub(freed);
    }

    /// Drop every free image.
    pub fn trim(&mut self) {
        self.retain(|_| false);
    }

    /// Bytes currently handed out.
    pub fn bytes_in_use(&self) -> u64 {
        self.in_use
    }

    /// Total bytes allocated, including free pooled images.
    pub fn bytes_allocated(&self) -> u64 {
        self.total_allocated
    }

    /// Number of free images across all buckets.
    pub fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }
}
