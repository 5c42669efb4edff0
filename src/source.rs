//! The source image record and its thumbnail orchestration.
//!
//! A [`SourceImage`] owns the map of thumbnails currently attached to it.
//! Only records whose bytes are on storage are ever attached.
//!
//! ## Generation modes
//!
//! | `delayed_generation` | On `save` | On `get(id)` |
//! |----------------------|-----------|--------------|
//! | `false` | every thumbnail is rendered from the in-memory source bytes and stored | returns the attached record |
//! | `true` | nothing | generates from the stored source, once |
//!
//! Eager mode renders every definition in parallel on rayon's pool, then
//! stores the results in identifier order. The first failure is returned
//! after the thumbnails before it have been stored and attached.
//!
//! ## Concurrency
//!
//! `get`, `regenerate` and `delete_thumbnail` take `&self` and may be called
//! from several threads. Each declared identifier has its own lock, so
//! concurrent first accesses to one thumbnail generate it once; different
//! identifiers do not wait on each other. `save` and `delete` take
//! `&mut self`.

use crate::config::ThumbnailSettings;
use crate::error::{Result, ThumbnailError};
use crate::field::ImageField;
use crate::imaging::{Dimensions, get_dimensions, process_image};
use crate::naming::{NameError, NameGenerator, normalize_identifier};
use crate::thumbnail::{ThumbnailDefinition, ThumbnailRecord};
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, info};

pub struct SourceImage {
    field: Arc<ImageField>,
    settings: ThumbnailSettings,
    namer: NameGenerator,
    name: Option<String>,
    committed: bool,
    size: OnceLock<u64>,
    dimensions: OnceLock<Dimensions>,
    attached: Mutex<BTreeMap<String, Arc<ThumbnailRecord>>>,
    in_flight: BTreeMap<String, Mutex<()>>,
}

impl SourceImage {
    pub(crate) fn unsaved(field: Arc<ImageField>) -> Self {
        let settings = field.settings().clone();
        let namer = NameGenerator::new(settings.dirname.as_str());
        let in_flight = field
            .thumbnails()
            .keys()
            .map(|id| (id.clone(), Mutex::new(())))
            .collect();
        Self {
            field,
            settings,
            namer,
            name: None,
            committed: false,
            size: OnceLock::new(),
            dimensions: OnceLock::new(),
            attached: Mutex::new(BTreeMap::new()),
            in_flight,
        }
    }

    /// Record for an image already on storage. Every declared thumbnail
    /// whose file exists is attached; missing ones are left for `get`.
    pub(crate) fn construct(field: Arc<ImageField>, name: String) -> Result<Self> {
        let mut image = Self::unsaved(field);
        if !name.is_empty() {
            image.name = Some(name);
            image.committed = true;
        }

        if image.thumbnail_requirements_met() {
            for definition in image.field.thumbnails().values() {
                let mut record = ThumbnailRecord::new(&image, definition)?;
                if record.exists()? {
                    debug!(thumbnail = ?record.name(), "Found existing thumbnail");
                    record.mark_committed();
                    image.attach(Arc::new(record))?;
                }
            }
        }
        Ok(image)
    }

    pub fn field(&self) -> &Arc<ImageField> {
        &self.field
    }

    /// Settings snapshot taken when this record was created.
    pub fn settings(&self) -> &ThumbnailSettings {
        &self.settings
    }

    pub(crate) fn namer(&self) -> &NameGenerator {
        &self.namer
    }

    /// Committed storage name, or `None` before the first save.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Storage path. Same as [`name`](Self::name).
    pub fn path(&self) -> Option<&str> {
        self.name()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Thumbnails are declared, and the source is committed under a name.
    pub fn thumbnail_requirements_met(&self) -> bool {
        self.committed
            && !self.field.thumbnails().is_empty()
            && self.name.as_deref().is_some_and(|name| !name.is_empty())
    }

    /// The attached record for `identifier`, without generating anything.
    pub fn attached(&self, identifier: &str) -> Option<Arc<ThumbnailRecord>> {
        self.attached_map().get(identifier).cloned()
    }

    pub fn attached_identifiers(&self) -> Vec<String> {
        self.attached_map().keys().cloned().collect()
    }

    /// Attach `record` under its identifier, replacing any previous one.
    pub(crate) fn attach(&self, record: Arc<ThumbnailRecord>) -> Result<()> {
        let identifier = record.identifier().to_string();
        if !self.field.thumbnails().contains_key(&identifier) {
            return Err(ThumbnailError::Configuration(format!(
                "cannot attach undeclared thumbnail \"{identifier}\""
            )));
        }
        self.attached_map().insert(identifier, record);
        Ok(())
    }

    pub(crate) fn detach(&self, identifier: &str) {
        self.attached_map().remove(identifier);
    }

    fn attached_map(&self) -> MutexGuard<'_, BTreeMap<String, Arc<ThumbnailRecord>>> {
        self.attached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full content of the committed source.
    pub fn read(&self) -> Result<Vec<u8>> {
        let name = self.require_name()?;
        Ok(self.field.storage().open(name)?)
    }

    // =========================================================================
    // Save / delete
    // =========================================================================

    /// Store `content` under `name` and handle thumbnails per the field's mode.
    ///
    /// With `process_source` set, the content is processed first and the
    /// name's extension follows the output format. Thumbnails derived from
    /// the previous content are deleted before the new source is stored.
    pub fn save(&mut self, name: &str, content: &[u8]) -> Result<()> {
        if name.is_empty() {
            return Err(NameError::InvalidName(name.to_string()).into());
        }

        if self.thumbnail_requirements_met() {
            self.delete_thumbnails()?;
        }
        self.attached_map().clear();

        let (name, content, dimensions) = match self.field.process_source() {
            Some(options) => {
                let processed =
                    process_image(self.field.processor(), content, options, &self.settings)?;
                let name = self.namer.generate(name, None, processed.format)?;
                debug!(source = %name, format = %processed.format, "Processed source image");
                (name, Cow::Owned(processed.bytes), Some(processed.dimensions))
            }
            None => (name.to_string(), Cow::Borrowed(content), None),
        };

        let committed_name = self.field.storage().save(&name, &content)?;
        info!(source = %committed_name, bytes = content.len(), "Saved source image");
        self.name = Some(committed_name);
        self.committed = true;
        self.size = OnceLock::from(content.len() as u64);
        self.dimensions = dimensions.map(OnceLock::from).unwrap_or_default();

        if self.settings.delayed_generation {
            debug!("Thumbnail generation delayed until first access");
            return Ok(());
        }
        if self.thumbnail_requirements_met() {
            self.generate_thumbnails(&content)?;
        }
        Ok(())
    }

    /// Render every declared thumbnail from `content`, then store them in order.
    fn generate_thumbnails(&self, content: &[u8]) -> Result<()> {
        let records = self
            .field
            .thumbnails()
            .values()
            .map(|definition| ThumbnailRecord::new(self, definition))
            .collect::<Result<Vec<_>>>()?;

        let rendered: Vec<_> = records
            .par_iter()
            .map(|record| record.render(content))
            .collect();

        for (record, processed) in records.into_iter().zip(rendered) {
            record.store(self, processed?)?;
        }
        Ok(())
    }

    /// Delete every declared thumbnail, then the source.
    ///
    /// Files already missing from storage are skipped.
    pub fn delete(&mut self) -> Result<()> {
        if self.thumbnail_requirements_met() {
            self.delete_thumbnails()?;
        }

        if let Some(name) = self.name.as_deref() {
            match self.field.storage().delete(name) {
                Ok(()) => info!(source = %name, "Deleted source image"),
                Err(err) if err.is_not_found() => debug!(source = %name, "Source already absent"),
                Err(err) => return Err(err.into()),
            }
        }

        self.name = None;
        self.committed = false;
        self.size.take();
        self.dimensions.take();
        self.attached_map().clear();
        Ok(())
    }

    /// Delete by derived name, so thumbnails that were never attached to
    /// this record are removed too.
    fn delete_thumbnails(&self) -> Result<()> {
        for definition in self.field.thumbnails().values() {
            ThumbnailRecord::new(self, definition)?.delete(self)?;
        }
        Ok(())
    }

    // =========================================================================
    // Thumbnail access
    // =========================================================================

    /// The thumbnail `identifier`, generated on first access if needed.
    ///
    /// Fails with [`ThumbnailError::AttributeNotFound`] when the identifier
    /// is not declared, or when the source has not been saved yet.
    pub fn get(&self, identifier: &str) -> Result<Arc<ThumbnailRecord>> {
        let (key, definition) = self.declared(identifier)?;
        if let Some(record) = self.attached(key) {
            return Ok(record);
        }
        if !self.thumbnail_requirements_met() {
            debug!(identifier = %key, "Thumbnail requested before the source was saved");
            return Err(ThumbnailError::AttributeNotFound(identifier.to_string()));
        }

        let _guard = self.lock_identifier(key);
        if let Some(record) = self.attached(key) {
            return Ok(record);
        }
        debug!(identifier = %key, "Generating thumbnail on first access");
        ThumbnailRecord::new(self, definition)?.save(self, None)
    }

    /// Render the thumbnail again from the stored source, replacing the
    /// attached record.
    pub fn regenerate(&self, identifier: &str) -> Result<Arc<ThumbnailRecord>> {
        let (key, definition) = self.declared(identifier)?;
        if !self.thumbnail_requirements_met() {
            return Err(ThumbnailError::AttributeNotFound(identifier.to_string()));
        }

        let _guard = self.lock_identifier(key);
        info!(identifier = %key, "Regenerating thumbnail");
        ThumbnailRecord::new(self, definition)?.save(self, None)
    }

    /// Delete one thumbnail and detach it. A no-op before the source is saved.
    pub fn delete_thumbnail(&self, identifier: &str) -> Result<()> {
        let (key, definition) = self.declared(identifier)?;
        if !self.thumbnail_requirements_met() {
            return Ok(());
        }

        let _guard = self.lock_identifier(key);
        ThumbnailRecord::new(self, definition)?.delete(self)
    }

    fn declared(&self, identifier: &str) -> Result<(&str, &ThumbnailDefinition)> {
        let not_found = || ThumbnailError::AttributeNotFound(identifier.to_string());
        let key = normalize_identifier(identifier).map_err(|_| not_found())?;
        self.field
            .thumbnails()
            .get_key_value(&key)
            .map(|(key, definition)| (key.as_str(), definition))
            .ok_or_else(not_found)
    }

    fn lock_identifier(&self, key: &str) -> Option<MutexGuard<'_, ()>> {
        self.in_flight
            .get(key)
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
    }

    // =========================================================================
    // Lazy properties
    // =========================================================================

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
        let content = self.read()?;
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
            .ok_or_else(|| ThumbnailError::NoFile("source".to_string()))
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("committed", &self.committed)
            .field("attached", &self.attached_identifiers())
            .finish_non_exhaustive()
    }
}
