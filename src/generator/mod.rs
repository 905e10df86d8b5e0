//! Package assembly and output generators.
//!
//! [`assemble_package`] runs the extraction pipeline over raw FB2 bytes and
//! produces a fully materialized [`EpubPackage`]. A [`Generator`] then
//! serializes that package into a file format.

use std::path::Path;

use uuid::Uuid;

use crate::chapters::{assemble_chapters, heading_with_content};
use crate::cover::extract_cover;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::metadata::extract_metadata;
use crate::path_utils::path_to_string_lossy;
use crate::types::{
    ANNOTATION_ANCHOR, ANNOTATION_FILE_NAME, ANNOTATION_TITLE, Annotation, DEFAULT_LANGUAGE,
    DEFAULT_TITLE, EpubPackage, SpineItem, TocLink,
};

pub mod epub;

/// Fallback values used while assembling a package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageOptions {
    pub default_title: String,
    pub default_language: String,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Common interface for package serializers.
pub trait Generator {
    /// Serializes `package` into an in-memory file.
    fn render(&self, package: &EpubPackage) -> Result<Vec<u8>>;

    /// Renders `package` and writes it to `output_path` in one step.
    ///
    /// Nothing is written if rendering fails, and a partially written file is
    /// removed if the write itself fails.
    fn save(&self, package: &EpubPackage, output_path: &Path) -> Result<()> {
        let bytes = self.render(package).map_err(|e| {
            Error::Write(output_path.to_path_buf(), format!("rendering failed: {}", e))
        })?;

        if let Err(e) = std::fs::write(output_path, &bytes) {
            if output_path.exists() {
                let _ = std::fs::remove_file(output_path);
            }
            return Err(Error::Write(
                output_path.to_path_buf(),
                format!(
                    "failed to write '{}': {}",
                    path_to_string_lossy(output_path),
                    e
                ),
            ));
        }
        Ok(())
    }
}

/// Parses FB2 bytes and assembles the complete package.
pub fn assemble_package(bytes: &[u8], options: &PackageOptions) -> Result<EpubPackage> {
    let document = Document::parse(bytes)?;
    Ok(assemble_from_document(&document, options))
}

/// Assembles the package of an already parsed document.
///
/// The spine starts as the navigation page followed by every chapter in ordinal
/// order. An annotation, when present, is then placed in front of both the
/// spine and the table of contents.
pub fn assemble_from_document(document: &Document, options: &PackageOptions) -> EpubPackage {
    let extracted = extract_metadata(
        document,
        &options.default_title,
        &options.default_language,
    );
    let cover = extract_cover(document);
    let assembled = assemble_chapters(document);

    let mut spine = vec![SpineItem::Nav];
    spine.extend(
        assembled
            .chapters
            .iter()
            .map(|chapter| SpineItem::Chapter(chapter.ordinal)),
    );
    let mut toc = assembled.toc;

    let annotation = extracted.annotation.map(|node| Annotation {
        html_content: heading_with_content(ANNOTATION_TITLE, node),
    });
    if annotation.is_some() {
        spine.insert(0, SpineItem::Annotation);
        toc.insert(
            0,
            TocLink {
                href: ANNOTATION_FILE_NAME.to_string(),
                title: ANNOTATION_TITLE.to_string(),
                anchor: ANNOTATION_ANCHOR.to_string(),
            },
        );
    }

    EpubPackage {
        identifier: Uuid::new_v4(),
        metadata: extracted.metadata,
        annotation,
        chapters: assembled.chapters,
        cover,
        spine,
        toc,
    }
}
