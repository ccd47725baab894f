//! CPU bloom pyramid and final composite: soft-knee prefilter, Gaussian mip chain, scatter upsampling, color grading and tonemapping.

pub mod bloom;
pub mod color;
pub mod compositor;
pub mod error;
pub mod grading;
pub mod image;
pub mod pool;
pub mod pyramid;
pub mod sampling;

pub use bloom::{BloomParameters, GAUSSIAN_WEIGHTS, KNEE_EPSILON, MAX_PYRAMID_SIZE, Prefilter};
pub use compositor::{BloomCompositor, BloomTexture, CompositeReport, CompositeSettings};
pub use error::RenderError;
pub use grading::{ColorAdjustments, ColorGrading, TonemappingMode};
pub use image::{HdrImage, TextureFormat};
pub use pool::{ImagePool, PoolKey};
pub use pyramid::{mip_dimensions, pyramid_depth};
pub use sampling::Filter;
