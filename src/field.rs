//! Field configuration: thumbnail definitions plus the injected collaborators.
//!
//! An [`ImageField`] is built once and shared (`Arc`) by every
//! [`SourceImage`] it opens. Definitions are validated when the field is
//! built, so an unusable identifier or a pair of identifiers that collide
//! after normalization is reported before any image is touched.
//!
//! ```text
//! ImageField::builder(storage, processor)
//!     .settings(..)                  optional, defaults otherwise
//!     .process_source(..)            optional
//!     .thumbnail("small", ..)        repeatable
//!     .build()?                      → Arc<ImageField>
//! ```

use crate::config::{FieldConfig, ThumbnailSettings};
use crate::error::{Result, ThumbnailError};
use crate::imaging::ImageProcessor;
use crate::options::ProcessingOptions;
use crate::source::SourceImage;
use crate::storage::Storage;
use crate::thumbnail::ThumbnailDefinition;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::sync::Arc;

pub struct ImageField {
    storage: Arc<dyn Storage>,
    processor: Arc<dyn ImageProcessor>,
    settings: ThumbnailSettings,
    process_source: Option<ProcessingOptions>,
    thumbnails: BTreeMap<String, ThumbnailDefinition>,
}

impl ImageField {
    pub fn builder(
        storage: Arc<dyn Storage>,
        processor: Arc<dyn ImageProcessor>,
    ) -> ImageFieldBuilder {
        ImageFieldBuilder {
            storage,
            processor,
            settings: ThumbnailSettings::default(),
            process_source: None,
            thumbnails: Vec::new(),
        }
    }

    /// Build a field from a loaded `thumbnails.toml`.
    pub fn from_config(
        config: &FieldConfig,
        storage: Arc<dyn Storage>,
        processor: Arc<dyn ImageProcessor>,
    ) -> Result<Arc<Self>> {
        let mut builder = Self::builder(storage, processor).settings(config.settings.clone());
        if let Some(spec) = &config.process_source {
            builder = builder.process_source(spec.resolve()?);
        }
        for (identifier, spec) in &config.thumbnails {
            builder = builder.thumbnail(identifier.as_str(), spec.resolve()?);
        }
        builder.build()
    }

    /// Open the stored image `name`, attaching thumbnails already on storage.
    pub fn open(self: &Arc<Self>, name: impl Into<String>) -> Result<SourceImage> {
        SourceImage::construct(Arc::clone(self), name.into())
    }

    /// An empty record, ready for [`SourceImage::save`].
    pub fn new_image(self: &Arc<Self>) -> SourceImage {
        SourceImage::unsaved(Arc::clone(self))
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn processor(&self) -> &dyn ImageProcessor {
        self.processor.as_ref()
    }

    pub fn settings(&self) -> &ThumbnailSettings {
        &self.settings
    }

    pub fn process_source(&self) -> Option<&ProcessingOptions> {
        self.process_source.as_ref()
    }

    /// Declared thumbnails keyed by normalized identifier.
    pub fn thumbnails(&self) -> &BTreeMap<String, ThumbnailDefinition> {
        &self.thumbnails
    }
}

impl fmt::Debug for ImageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageField")
            .field("settings", &self.settings)
            .field("process_source", &self.process_source)
            .field("thumbnails", &self.thumbnails.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

pub struct ImageFieldBuilder {
    storage: Arc<dyn Storage>,
    processor: Arc<dyn ImageProcessor>,
    settings: ThumbnailSettings,
    process_source: Option<ProcessingOptions>,
    thumbnails: Vec<(String, ProcessingOptions)>,
}

impl ImageFieldBuilder {
    pub fn settings(mut self, settings: ThumbnailSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Process the source image itself before it is stored.
    pub fn process_source(mut self, options: ProcessingOptions) -> Self {
        self.process_source = Some(options);
        self
    }

    pub fn thumbnail(mut self, identifier: impl Into<String>, options: ProcessingOptions) -> Self {
        self.thumbnails.push((identifier.into(), options));
        self
    }

    pub fn build(self) -> Result<Arc<ImageField>> {
        self.settings.validate()?;

        let mut thumbnails = BTreeMap::new();
        let mut declared_as: BTreeMap<String, String> = BTreeMap::new();
        for (identifier, options) in self.thumbnails {
            let definition = ThumbnailDefinition::new(&identifier, options)?;
            match thumbnails.entry(definition.identifier().to_string()) {
                Entry::Occupied(e) => {
                    let first = declared_as.get(e.key()).map_or("", String::as_str);
                    return Err(ThumbnailError::ThumbnailOption(format!(
                        "thumbnail identifiers \"{first}\" and \"{identifier}\" both normalize to \"{}\"",
                        e.key()
                    )));
                }
                Entry::Vacant(e) => {
                    declared_as.insert(e.key().clone(), identifier);
                    e.insert(definition);
                }
            }
        }

        Ok(Arc::new(ImageField {
            storage: self.storage,
            processor: self.processor,
            settings: self.settings,
            process_source: self.process_source,
            thumbnails,
        }))
    }
}
