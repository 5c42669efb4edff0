//! Thumbnail definitions and records.
//!
//! A [`ThumbnailDefinition`] is configuration: an identifier plus processing
//! options, fixed when the field is built. A [`ThumbnailRecord`] is one
//! thumbnail of one source image: its derived storage name, its committed
//! state, and lazily cached size and dimensions.
//!
//! Records are transient. Only their bytes persist on storage; a record is
//! rebuilt from the definition whenever the source needs one (probing at
//! construction, eager generation, first access, deletion).
//!
//! Records hold no pointer to their source. Operations that change the
//! source's attached map take the source as an argument and call
//! [`SourceImage::attach`] / [`SourceImage::detach`] explicitly.

use crate::config::ThumbnailSettings;
use crate::error::{Result, ThumbnailError};
use crate::field::ImageField;
use crate::imaging::{Dimensions, OutputFormat, Processed, get_dimensions, process_image};
use crate::naming::normalize_identifier;
use crate::options::ProcessingOptions;
use crate::source::SourceImage;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// A named thumbnail declared on a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailDefinition {
    identifier: String,
    options: ProcessingOptions,
}

impl ThumbnailDefinition {
    /// Spaces in `identifier` become underscores. Fails with
    /// [`ThumbnailError::ThumbnailOption`] if the identifier is unusable.
    pub fn new(identifier: &str, options: ProcessingOptions) -> Result<Self> {
        let identifier = normalize_identifier(identifier)
            .map_err(|e| ThumbnailError::ThumbnailOption(e.to_string()))?;
        Ok(Self {
            identifier,
            options,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }
}

/// One thumbnail of one source image.
#[derive(Debug, Clone)]
pub struct ThumbnailRecord {
    field: Arc<ImageField>,
    settings: ThumbnailSettings,
    identifier: String,
    options: ProcessingOptions,
    format: OutputFormat,
    name: Option<String>,
    committed: bool,
    size: OnceLock<u64>,
    dimensions: OnceLock<Dimensions>,
}

impl ThumbnailRecord {
    /// Build the record for `definition` against the committed name of `source`.
    ///
    /// Fails with [`ThumbnailError::Configuration`] if the source has no
    /// committed name: callers must check
    /// [`SourceImage::thumbnail_requirements_met`] first.
    pub fn new(source: &SourceImage, definition: &ThumbnailDefinition) -> Result<Self> {
        let source_name = source
            .name()
            .filter(|name| source.is_committed() && !name.is_empty())
            .ok_or_else(|| {
                ThumbnailError::Configuration(format!(
                    "thumbnail `{}` requested for a source without a committed name",
                    definition.identifier()
                ))
            })?;

        let identifier = normalize_identifier(definition.identifier())
            .map_err(|e| ThumbnailError::ThumbnailOption(e.to_string()))?;
        let settings = source.settings().clone();
        let format = definition.options().resolve_format(settings.format);
        let name = source
            .namer()
            .generate(source_name, Some(&identifier), format)?;

        Ok(Self {
            field: Arc::clone(source.field()),
            settings,
            identifier,
            options: definition.options().clone(),
            format,
            name: Some(name),
            committed: false,
            size: OnceLock::new(),
            dimensions: OnceLock::new(),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Storage name, or `None` once deleted.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Storage path. Same as [`name`](Self::name).
    pub fn path(&self) -> Option<&str> {
        self.name()
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Resolved output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub(crate) fn mark_committed(&mut self) {
        self.committed = true;
    }

    pub fn exists(&self) -> Result<bool> {
        match self.name.as_deref() {
            Some(name) => Ok(self.field.storage().exists(name)?),
            None => Ok(false),
        }
    }

    /// Run the processor over `content` without touching storage.
    pub fn render(&self, content: &[u8]) -> Result<Processed> {
        Ok(process_image(
            self.field.processor(),
            content,
            &self.options,
            &self.settings,
        )?)
    }

    /// Generate, store, and attach this thumbnail.
    ///
    /// `content` is the source image; when `None`, the committed source is
    /// read back from storage. Returns the attached record.
    pub fn save(self, source: &SourceImage, content: Option<&[u8]>) -> Result<Arc<Self>> {
        let content = match content {
            Some(bytes) => Cow::Borrowed(bytes),
            None => Cow::Owned(source.read()?),
        };
        let processed = self.render(&content)?;
        self.store(source, processed)
    }

    /// Store an already rendered thumbnail and attach it to `source`.
    pub(crate) fn store(mut self, source: &SourceImage, processed: Processed) -> Result<Arc<Self>> {
        let name = self.require_name()?;
        let committed_name = self.field.storage().save(name, &processed.bytes)?;
        info!(
            thumbnail = %committed_name,
            identifier = %self.identifier,
            bytes = processed.bytes.len(),
            "Saved thumbnail"
        );

        self.name = Some(committed_name);
        self.size = OnceLock::from(processed.bytes.len() as u64);
        self.dimensions = OnceLock::from(processed.dimensions);
        self.committed = true;

        let record = Arc::new(self);
        source.attach(Arc::clone(&record))?;
        Ok(record)
    }

    /// Delete the stored thumbnail and detach it from `source`.
    ///
    /// A thumbnail already missing from storage is not an error.
    pub fn delete(&mut self, source: &SourceImage) -> Result<()> {
        if let Some(name) = self.name.as_deref() {
            match self.field.storage().delete(name) {
                Ok(()) => info!(thumbnail = %name, "Deleted thumbnail"),
                Err(err) if err.is_not_found() => {
                    debug!(thumbnail = %name, "Thumbnail already absent")
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.name = None;
        self.size.take();
        self.dimensions.take();
        source.detach(&self.identifier);
        self.committed = false;
        Ok(())
    }

    /// Stored size in bytes. Cached after the first read.
    pub fn size_bytes(&self) -> Result<u64> {
        if let Some(size) = self.size.get() {
            return Ok(*size);
        }
        let size = self.field.storage().size(self.require_name()?)?;
        Ok(*self.size.get_or_init(|| size))
    }

    /// Pixel dimensions. Cached after the first read.
    pub fn dimensions(&self) -> Result<Dimensions> {
        if let Some(dimensions) = self.dimensions.get() {
            return Ok(*dimensions);
        }
        let content = self.field.storage().open(self.require_name()?)?;
        let dimensions = get_dimensions(self.field.processor(), &content)?;
        Ok(*self.dimensions.get_or_init(|| dimensions))
    }

    pub fn width(&self) -> Result<u32> {
        Ok(self.dimensions()?.width)
    }

    pub fn height(&self) -> Result<u32> {
        Ok(self.dimensions()?.height)
    }

    fn require_name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .ok_or_else(|| ThumbnailError::NoFile(self.identifier.clone()))
    }
}
