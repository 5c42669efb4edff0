//! Serializable summaries of stored images.
//!
//! The CLI prints these as JSON. They are snapshots: building one reads the
//! lazy size and dimension properties, which may touch storage.

use crate::error::Result;
use crate::source::SourceImage;
use crate::thumbnail::ThumbnailRecord;
use serde::{Deserialize, Serialize};

/// A stored source image and the thumbnails attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    /// Attached thumbnails in identifier order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thumbnails: Vec<ThumbnailSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSummary {
    pub identifier: String,
    pub path: String,
    /// Lowercase format name, same as the file extension.
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

impl ImageSummary {
    /// Summarize a committed source. Thumbnails not yet generated are left out.
    pub fn from_source(source: &SourceImage) -> Result<Self> {
        let thumbnails = source
            .attached_identifiers()
            .iter()
            .filter_map(|id| source.attached(id))
            .map(|record| ThumbnailSummary::from_record(&record))
            .collect::<Result<Vec<_>>>()?;
        let dimensions = source.dimensions()?;
        Ok(Self {
            path: source.path().unwrap_or_default().to_string(),
            width: dimensions.width,
            height: dimensions.height,
            size_bytes: source.size_bytes()?,
            thumbnails,
        })
    }
}

impl ThumbnailSummary {
    pub fn from_record(record: &ThumbnailRecord) -> Result<Self> {
        let dimensions = record.dimensions()?;
        Ok(Self {
            identifier: record.identifier().to_string(),
            path: record.path().unwrap_or_default().to_string(),
            format: record.format().extension().to_string(),
            width: dimensions.width,
            height: dimensions.height,
            size_bytes: record.size_bytes()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockProcessor;
    use crate::storage::MemoryStorage;
    use crate::test_helpers::mock_field;
    use std::sync::Arc;

    #[test]
    fn summary_lists_attached_thumbnails() {
        let storage = Arc::new(MemoryStorage::new());
        let field = mock_field(storage, Arc::new(MockProcessor::new()), false);
        let mut image = field.new_image();
        image.save("photos/cat.jpeg", b"cat").unwrap();

        let summary = ImageSummary::from_source(&image).unwrap();

        assert_eq!(summary.path, "photos/cat.jpeg");
        assert_eq!((summary.width, summary.height), (640, 480));
        assert_eq!(summary.size_bytes, 3);
        let ids: Vec<_> = summary.thumbnails.iter().map(|t| t.identifier.as_str()).collect();
        assert_eq!(ids, vec!["big", "small"]);
        assert_eq!(summary.thumbnails[1].path, "photos/thumbs/cat.jpeg.small.jpeg");
        assert_eq!(summary.thumbnails[1].format, "jpeg");
        assert_eq!(summary.thumbnails[1].width, 32);
    }

    #[test]
    fn summary_json_omits_empty_thumbnail_list() {
        let summary = ImageSummary {
            path: "cat.png".into(),
            width: 1,
            height: 1,
            size_bytes: 10,
            thumbnails: Vec::new(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("thumbnails").is_none());
        assert_eq!(json["path"], "cat.png");
    }
}
