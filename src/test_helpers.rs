//! Shared test utilities for the thumbnail-works test suite.
//!
//! Provides in-memory image fixtures, a pre-configured field wired to the
//! recording collaborators, and pixel assertions on encoded output.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let field = mock_field(storage.clone(), Arc::new(MockProcessor::new()), false);
//!
//! let mut image = field.new_image();
//! image.save("photos/cat.jpeg", &png_bytes(256, 256, [200, 0, 0])).unwrap();
//! assert_eq!(storage.paths().len(), 3);
//! ```

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::config::ThumbnailSettings;
use crate::field::ImageField;
use crate::imaging::backend::tests::MockProcessor;
use crate::options::ProcessingOptions;
use crate::storage::MemoryStorage;

// =========================================================================
// Image fixtures
// =========================================================================

/// A solid-color PNG.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A half-transparent PNG, for checking alpha handling.
pub fn rgba_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([40, 160, 80, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

// =========================================================================
// Fields
// =========================================================================

/// A JPEG field with `small` (32x32) and `big` (128x128) thumbnails.
pub fn mock_field(
    storage: Arc<MemoryStorage>,
    processor: Arc<MockProcessor>,
    delayed_generation: bool,
) -> Arc<ImageField> {
    ImageField::builder(storage, processor)
        .settings(ThumbnailSettings {
            delayed_generation,
            ..ThumbnailSettings::default()
        })
        .thumbnail("small", ProcessingOptions::new().with_size(32, 32))
        .thumbnail("big", ProcessingOptions::new().with_size(128, 128))
        .build()
        .unwrap()
}

// =========================================================================
// Pixel assertions
// =========================================================================

/// Index (0 = red, 1 = green, 2 = blue) of the channel with the highest
/// average over the decoded image.
pub fn dominant_channel(bytes: &[u8]) -> usize {
    let img = image::load_from_memory(bytes).unwrap().to_rgb8();
    let mut totals = [0u64; 3];
    for pixel in img.pixels() {
        for (total, value) in totals.iter_mut().zip(pixel.0) {
            *total += u64::from(value);
        }
    }
    (0..3).max_by_key(|&i| totals[i]).unwrap()
}
