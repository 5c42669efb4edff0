//! Deterministic storage names for source images and thumbnails.
//!
//! Names are `/`-separated paths relative to the storage root. A source keeps
//! its directory and stem and takes the extension of its output format. A
//! thumbnail goes into the configured subdirectory next to its source, named
//! after the full source file name and its identifier:
//!
//! ```text
//! photos/cat.jpg   --(None,    PNG)-->   photos/cat.png
//! photos/cat.jpg   --("small", PNG)-->   photos/thumbs/cat.jpg.small.png
//! cat.jpg          --("small", JPEG)-->  thumbs/cat.jpg.small.jpeg
//! ```
//!
//! Keeping the source extension means `cat.jpg` and `cat.png` in one
//! directory get distinct thumbnails.
//!
//! ## Identifiers
//!
//! Spaces in identifiers become underscores (`"extra small"` →
//! `"extra_small"`). Identifiers may not be empty, and may not contain `/` or
//! `.`, so a thumbnail file name always splits back into
//! `(source file name, identifier, extension)` and distinct sources never
//! share a thumbnail name.

use crate::imaging::OutputFormat;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("The provided name is not usable: \"{0}\"")]
    InvalidName(String),
    #[error("The identifier is not usable: \"{0}\"")]
    InvalidIdentifier(String),
}

/// Normalize a thumbnail identifier: every space becomes an underscore.
///
/// ```
/// # use thumbnail_works::naming::normalize_identifier;
/// assert_eq!(normalize_identifier(" a b ").unwrap(), "_a_b_");
/// assert!(normalize_identifier("").is_err());
/// ```
pub fn normalize_identifier(identifier: &str) -> Result<String, NameError> {
    let normalized = identifier.replace(' ', "_");
    if normalized.is_empty() || normalized.contains(['/', '.']) {
        return Err(NameError::InvalidIdentifier(identifier.to_string()));
    }
    Ok(normalized)
}

/// Builds storage names for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGenerator {
    dirname: String,
}

impl NameGenerator {
    /// `dirname` is the thumbnail subdirectory, e.g. `"thumbs"`.
    pub fn new(dirname: impl Into<String>) -> Self {
        Self {
            dirname: dirname.into(),
        }
    }

    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    /// Name for a source (`identifier = None`) or one of its thumbnails.
    pub fn generate(
        &self,
        base_name: &str,
        identifier: Option<&str>,
        format: OutputFormat,
    ) -> Result<String, NameError> {
        let (dir, file, stem) = split_name(base_name)?;
        let ext = format.extension();

        match identifier {
            None => Ok(join(dir, &format!("{stem}.{ext}"))),
            Some(identifier) => {
                let identifier = normalize_identifier(identifier)?;
                Ok(join(
                    &join(dir, &self.dirname),
                    &format!("{file}.{identifier}.{ext}"),
                ))
            }
        }
    }
}

/// Split `dir/stem.ext` into `(dir, file name, stem)`.
///
/// A leading dot does not start an extension, so `.hidden` has stem `.hidden`.
fn split_name(base_name: &str) -> Result<(&str, &str, &str), NameError> {
    let (dir, file) = base_name.rsplit_once('/').unwrap_or(("", base_name));
    let stem = match file.rfind('.') {
        Some(pos) if pos > 0 => &file[..pos],
        _ => file,
    };
    if stem.is_empty() {
        return Err(NameError::InvalidName(base_name.to_string()));
    }
    Ok((dir, file, stem))
}

fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

/// Parts of a thumbnail file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailFileName<'a> {
    /// File name of the source, in the parent of the thumbnail directory.
    pub source: &'a str,
    pub identifier: &'a str,
    pub format: OutputFormat,
}

/// Split a thumbnail file name (`cat.jpg.small.png`) back into its parts.
///
/// Returns `None` for names that [`NameGenerator::generate`] cannot produce,
/// including names whose extension is not an output format extension.
pub fn parse_thumbnail_file_name(file_name: &str) -> Option<ThumbnailFileName<'_>> {
    let mut parts = file_name.rsplitn(3, '.');
    let format = OutputFormat::from_extension(parts.next()?)?;
    let identifier = parts.next()?;
    let source = parts.next()?;
    if split_name(source).is_err() || normalize_identifier(identifier).ok()? != identifier {
        return None;
    }
    Some(ThumbnailFileName {
        source,
        identifier,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namer() -> NameGenerator {
        NameGenerator::new("thumbs")
    }

    #[test]
    fn source_name_replaces_extension() {
        let name = namer()
            .generate("photos/cat.jpg", None, OutputFormat::Png)
            .unwrap();
        assert_eq!(name, "photos/cat.png");
    }

    #[test]
    fn source_name_without_extension_gains_one() {
        let name = namer().generate("cat", None, OutputFormat::Jpeg).unwrap();
        assert_eq!(name, "cat.jpeg");
    }

    #[test]
    fn thumbnail_goes_into_subdirectory() {
        let name = namer()
            .generate("photos/2024/cat.jpg", Some("small"), OutputFormat::Jpeg)
            .unwrap();
        assert_eq!(name, "photos/2024/thumbs/cat.jpg.small.jpeg");
    }

    #[test]
    fn thumbnail_of_root_level_source() {
        let name = namer()
            .generate("cat.jpg", Some("small"), OutputFormat::WebP)
            .unwrap();
        assert_eq!(name, "thumbs/cat.jpg.small.webp");
    }

    #[test]
    fn subdirectory_name_is_configurable() {
        let name = NameGenerator::new("previews")
            .generate("a/b.png", Some("big"), OutputFormat::Png)
            .unwrap();
        assert_eq!(name, "a/previews/b.png.big.png");
    }

    #[test]
    fn identifier_spaces_become_underscores() {
        let name = namer()
            .generate("cat.jpg", Some("extra small"), OutputFormat::Png)
            .unwrap();
        assert_eq!(name, "thumbs/cat.jpg.extra_small.png");
    }

    #[test]
    fn multi_dot_stem_is_preserved() {
        let name = namer()
            .generate("a/cat.final.v2.jpg", Some("small"), OutputFormat::Png)
            .unwrap();
        assert_eq!(name, "a/thumbs/cat.final.v2.jpg.small.png");
    }

    #[test]
    fn generation_is_deterministic() {
        let n = namer();
        let first = n.generate("x/y.gif", Some("t"), OutputFormat::Gif).unwrap();
        let second = n.generate("x/y.gif", Some("t"), OutputFormat::Gif).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn extension_always_matches_format() {
        for format in OutputFormat::ALL {
            let name = namer().generate("a/b.jpg", Some("t"), format).unwrap();
            assert!(name.ends_with(&format!(".{}", format.extension())));
            let name = namer().generate("a/b.jpg", None, format).unwrap();
            assert!(name.ends_with(&format!(".{}", format.extension())));
        }
    }

    #[test]
    fn empty_base_name_is_rejected() {
        assert_eq!(
            namer().generate("", None, OutputFormat::Png),
            Err(NameError::InvalidName(String::new()))
        );
        assert!(matches!(
            namer().generate("photos/", Some("t"), OutputFormat::Png),
            Err(NameError::InvalidName(_))
        ));
    }

    #[test]
    fn hidden_file_keeps_its_dot() {
        let name = namer().generate(".hidden", None, OutputFormat::Png).unwrap();
        assert_eq!(name, ".hidden.png");
    }

    #[test]
    fn bad_identifiers_are_rejected() {
        for bad in ["", "a/b", "a.b"] {
            assert!(matches!(
                namer().generate("cat.jpg", Some(bad), OutputFormat::Png),
                Err(NameError::InvalidIdentifier(_))
            ));
        }
    }

    #[test]
    fn normalize_replaces_every_space() {
        assert_eq!(normalize_identifier(" a b ").unwrap(), "_a_b_");
        assert_eq!(normalize_identifier("   ").unwrap(), "___");
        assert_eq!(normalize_identifier("plain").unwrap(), "plain");
    }

    #[test]
    fn same_stem_sources_get_distinct_thumbnails() {
        let n = namer();
        let jpg = n.generate("cat.jpg", Some("small"), OutputFormat::Png).unwrap();
        let png = n.generate("cat.png", Some("small"), OutputFormat::Png).unwrap();
        let bare = n.generate("cat", Some("small"), OutputFormat::Png).unwrap();
        assert_eq!(jpg, "thumbs/cat.jpg.small.png");
        assert_eq!(png, "thumbs/cat.png.small.png");
        assert_eq!(bare, "thumbs/cat.small.png");
    }

    #[test]
    fn thumbnail_file_name_parses_back() {
        let parsed = parse_thumbnail_file_name("cat.final.jpg.small.png").unwrap();
        assert_eq!(parsed.source, "cat.final.jpg");
        assert_eq!(parsed.identifier, "small");
        assert_eq!(parsed.format, OutputFormat::Png);
    }

    #[test]
    fn generated_names_parse_back_to_their_inputs() {
        for source in ["cat.jpg", "cat", ".hidden", "a.b.c.tiff"] {
            for format in OutputFormat::ALL {
                let name = namer().generate(source, Some("x_y"), format).unwrap();
                let file = name.rsplit('/').next().unwrap();
                let parsed = parse_thumbnail_file_name(file).unwrap();
                assert_eq!(parsed.source, source);
                assert_eq!(parsed.identifier, "x_y");
                assert_eq!(parsed.format, format);
            }
        }
    }

    #[test]
    fn non_thumbnail_file_names_do_not_parse() {
        assert_eq!(parse_thumbnail_file_name("cat.png"), None);
        assert_eq!(parse_thumbnail_file_name("README"), None);
        assert_eq!(parse_thumbnail_file_name(".small.png"), None);
        assert_eq!(parse_thumbnail_file_name("cat.small.txt"), None);
        assert_eq!(parse_thumbnail_file_name("cat.small.jpg"), None);
        assert_eq!(parse_thumbnail_file_name("cat.a b.png"), None);
    }
}
