//! # Thumbnail Works
//!
//! Thumbnail lifecycle management for stored source images. A field declares
//! a set of named thumbnail definitions; every source image saved through
//! that field gets its thumbnails generated, stored next to it, exposed by
//! identifier, and deleted together with it.
//!
//! # Lifecycle
//!
//! ```text
//! ImageField::open(name)      probe storage, attach thumbnails already present
//! SourceImage::save(..)       [process source] → store → eager thumbnails | nothing (delayed)
//! SourceImage::get("small")   attached? → return it : generate, store, attach
//! SourceImage::delete()       delete thumbnails → delete source
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`options`] | Processing options and the `WIDTHxHEIGHT` size parser |
//! | [`naming`] | Deterministic storage names for sources and thumbnails |
//! | [`imaging`] | The [`imaging::ImageProcessor`] seam and its pure-Rust implementation |
//! | [`storage`] | The [`storage::Storage`] seam, filesystem and in-memory backends |
//! | [`config`] | `thumbnails.toml` loading, merging, and validation |
//! | [`field`] | [`ImageField`]: validated definitions plus injected collaborators |
//! | [`thumbnail`] | [`ThumbnailRecord`]: one derived image on storage |
//! | [`source`] | [`SourceImage`]: the source record and its thumbnail orchestration |
//! | [`types`] | Serializable summaries used by the CLI |
//!
//! # Design Decisions
//!
//! ## Names Are Derived, Never Chosen
//!
//! A thumbnail's storage name is a pure function of the committed source
//! name, the identifier, and the output format:
//!
//! ```text
//! photos/cat.jpg  +  "small"  +  PNG   →   photos/thumbs/cat.jpg.small.png
//! ```
//!
//! Regenerating a thumbnail therefore overwrites the previous file in place.
//! The source extension stays in the name, so `cat.jpg` and `cat.png` in the
//! same directory get distinct thumbnails. Identifiers may not contain `.` or
//! `/`, which keeps the name parseable back into its parts.
//!
//! ## Composition Over Inheritance
//!
//! Records hold an [`ImageField`], which holds the storage backend and the
//! image processor as trait objects. Tests swap in
//! [`storage::MemoryStorage`] and a recording processor without touching the
//! lifecycle code.
//!
//! ## Explicit Accessor Instead of Attribute Hooks
//!
//! Lazy thumbnails are reached through [`SourceImage::get`], which is
//! single-flight per identifier: concurrent callers on the same record wait
//! for one generation and share its result.

pub mod config;
pub mod error;
pub mod field;
pub mod imaging;
pub mod naming;
pub mod options;
pub mod source;
pub mod storage;
pub mod thumbnail;
pub mod types;

pub use error::{Result, ThumbnailError};
pub use field::{ImageField, ImageFieldBuilder};
pub use options::ProcessingOptions;
pub use source::SourceImage;
pub use thumbnail::{ThumbnailDefinition, ThumbnailRecord};

#[cfg(test)]
pub(crate) mod test_helpers;
