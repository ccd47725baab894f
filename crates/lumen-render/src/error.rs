//! Render error types.

/// Errors produced while allocating images or running the compositor.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Width or height is zero.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// Raw pixel data length doesn't match the given dimensions.
    #[error("image data length ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// Destination and source images have different sizes.
    #[error(
        "destination is {dst_width}x{dst_height} but source is {src_width}x{src_height}"
    )]
    SizeMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    /// The image pool would exceed its byte budget.
    #[error("image pool exhausted: requested {requested} bytes with {allocated} of {budget} bytes allocated")]
    PoolExhausted {
        requested: u64,
        allocated: u64,
        budget: u64,
    },
}
