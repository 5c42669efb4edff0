//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize** | Lanczos3, shrink-to-fit or forced exact box |
//! | **Filters** | 3x3 sharpen / detail kernels |
//! | **Encode** | JPEG (quality), PNG, GIF, BMP, TIFF, WebP, AVIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageProcessor`] trait + [`RustProcessor`]
//! - **Operations**: Option resolution combined with processor calls

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, ImageProcessor, ImagingError, Processed};
pub use operations::{get_dimensions, plan_request, process_image};
pub use params::{OutputFormat, ProcessRequest, Quality};
pub use rust_backend::RustProcessor;
