//! Core data types, enums, and reports for the fb2epub conversion library.
//!
//! This module defines the fundamental data structures used throughout fb2epub:
//! - Extracted book data (`BookMetadata`, `Chapter`, `Annotation`, `CoverImage`)
//! - The in-memory package handed to the writer (`EpubPackage`, `SpineItem`, `TocLink`)
//! - Settings and reports (`EpubVersion`, `ExecutionMode`, `BookReport`)

use uuid::Uuid;

/// Title used when the FB2 file has no `book-title`.
pub const DEFAULT_TITLE: &str = "Unknown Title";
/// Language used when the FB2 file has no `lang`.
pub const DEFAULT_LANGUAGE: &str = "en";

pub const ANNOTATION_FILE_NAME: &str = "annotation.xhtml";
pub const ANNOTATION_TITLE: &str = "Annotation";
pub const ANNOTATION_ANCHOR: &str = "annotation";

pub const COVER_IMAGE_FILE_NAME: &str = "cover.jpg";
pub const COVER_PAGE_FILE_NAME: &str = "cover.xhtml";
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// Contents page occupying the navigation slot of the spine.
pub const CONTENTS_PAGE_FILE_NAME: &str = "toc.xhtml";
pub const CONTENTS_TITLE: &str = "Table of Contents";

/// Package paths generated by the EPUB writer itself.
pub const NAV_FILE_NAME: &str = "nav.xhtml";
pub const NCX_FILE_NAME: &str = "toc.ncx";
pub const STYLESHEET_FILE_NAME: &str = "stylesheet.css";

/// Descriptive metadata pulled from the FB2 `title-info` block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookMetadata {
    pub title: String,
    pub language: String, // e.g., "en", "ru"
    pub authors: Vec<String>,
}

impl Default for BookMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            authors: Vec::new(),
        }
    }
}

/// One chapter document, produced from one FB2 `section`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub ordinal: usize, // 1-based, continuous across bodies
    pub title: String,
    pub file_name: String,
    pub html_content: String, // XHTML fragment: `<h1>` heading followed by formatted content
}

impl Chapter {
    pub fn new(ordinal: usize, title: String, html_content: String) -> Self {
        Self {
            ordinal,
            title,
            file_name: Self::file_name_for(ordinal),
            html_content,
        }
    }

    /// File name inside the package. Unique per ordinal.
    pub fn file_name_for(ordinal: usize) -> String {
        format!("chapter_{}.xhtml", ordinal)
    }

    pub fn anchor(&self) -> String {
        format!("chapter_{}", self.ordinal)
    }
}

/// The book annotation, rendered as a leading chapter titled "Annotation".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub html_content: String,
}

/// Decoded JPEG cover image.
#[derive(Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl CoverImage {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE,
            data,
        }
    }
}

impl std::fmt::Debug for CoverImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverImage")
            .field("mime_type", &self.mime_type)
            .field("data", &format!("{} bytes", self.data.len()))
            .finish()
    }
}

/// A table of contents link: target document, label, and anchor id.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocLink {
    pub href: String,
    pub title: String,
    pub anchor: String,
}

/// An entry of the reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpineItem {
    Annotation,
    /// The navigation (table of contents) page, written as the contents page.
    Nav,
    /// A chapter, by ordinal.
    Chapter(usize),
}

/// A manifest entry of the produced package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub href: String,
    pub media_type: &'static str,
}

/// Fully materialized book, ready to be serialized by the EPUB writer.
#[derive(Debug, Clone)]
pub struct EpubPackage {
    pub identifier: Uuid,
    pub metadata: BookMetadata,
    pub annotation: Option<Annotation>,
    pub chapters: Vec<Chapter>,
    pub cover: Option<CoverImage>,
    pub spine: Vec<SpineItem>,
    pub toc: Vec<TocLink>,
}

impl EpubPackage {
    pub fn chapter(&self, ordinal: usize) -> Option<&Chapter> {
        self.chapters.iter().find(|chapter| chapter.ordinal == ordinal)
    }

    /// Every item the package declares in its manifest.
    pub fn manifest(&self) -> Vec<ManifestEntry> {
        const XHTML: &str = "application/xhtml+xml";

        let mut entries = vec![
            ManifestEntry {
                href: NCX_FILE_NAME.to_string(),
                media_type: "application/x-dtbncx+xml",
            },
            ManifestEntry {
                href: NAV_FILE_NAME.to_string(),
                media_type: XHTML,
            },
            ManifestEntry {
                href: STYLESHEET_FILE_NAME.to_string(),
                media_type: "text/css",
            },
            ManifestEntry {
                href: CONTENTS_PAGE_FILE_NAME.to_string(),
                media_type: XHTML,
            },
        ];
        if let Some(cover) = &self.cover {
            entries.push(ManifestEntry {
                href: COVER_IMAGE_FILE_NAME.to_string(),
                media_type: cover.mime_type,
            });
            entries.push(ManifestEntry {
                href: COVER_PAGE_FILE_NAME.to_string(),
                media_type: XHTML,
            });
        }
        if self.annotation.is_some() {
            entries.push(ManifestEntry {
                href: ANNOTATION_FILE_NAME.to_string(),
                media_type: XHTML,
            });
        }
        entries.extend(self.chapters.iter().map(|chapter| ManifestEntry {
            href: chapter.file_name.clone(),
            media_type: XHTML,
        }));
        entries
    }
}

/// EPUB specification version of the produced package.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EpubVersion {
    V20,
    #[default]
    V30,
}

impl From<EpubVersion> for epub_builder::EpubVersion {
    fn from(version: EpubVersion) -> Self {
        match version {
            EpubVersion::V20 => epub_builder::EpubVersion::V20,
            EpubVersion::V30 => epub_builder::EpubVersion::V30,
        }
    }
}

/// Specifies the intended input of a conversion.
/// Used by `Fb2EpubConfig::preflight_check` to tailor validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionMode {
    /// A single `.fb2` file.
    SingleFile,
    /// A ZIP archive holding one or more `.fb2` entries.
    Archive,
}

/// Outcome of analyzing an FB2 file without writing an EPUB.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookReport {
    pub metadata: BookMetadata,
    pub chapter_titles: Vec<String>,
    pub toc: Vec<TocLink>,
    pub has_annotation: bool,
    pub has_cover: bool,
}

impl From<&EpubPackage> for BookReport {
    fn from(package: &EpubPackage) -> Self {
        Self {
            metadata: package.metadata.clone(),
            chapter_titles: package
                .chapters
                .iter()
                .map(|chapter| chapter.title.clone())
                .collect(),
            toc: package.toc.clone(),
            has_annotation: package.annotation.is_some(),
            has_cover: package.cover.is_some(),
        }
    }
}
