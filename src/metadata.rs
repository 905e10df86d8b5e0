//! Extraction of book metadata and the annotation block from `title-info`.

use crate::document::{Document, Element};
use crate::types::BookMetadata;

/// Author name parts, in the order they are joined.
const NAME_PARTS: [&str; 3] = ["first-name", "middle-name", "last-name"];

/// Metadata of a parsed FB2 document, plus the raw annotation subtree.
#[derive(Debug, Clone)]
pub struct ExtractedMetadata<'a> {
    pub metadata: BookMetadata,
    pub annotation: Option<&'a Element>,
}

/// Reads title, language, authors and annotation from the first `title-info` node.
///
/// Missing values fall back to `default_title` and `default_language`; a document
/// without `title-info` yields those defaults, no authors and no annotation.
pub fn extract_metadata<'a>(
    document: &'a Document,
    default_title: &str,
    default_language: &str,
) -> ExtractedMetadata<'a> {
    let Some(title_info) = document.find("title-info") else {
        log::debug!("No title-info found, using default metadata");
        return ExtractedMetadata {
            metadata: BookMetadata {
                title: default_title.to_string(),
                language: default_language.to_string(),
                authors: Vec::new(),
            },
            annotation: None,
        };
    };

    let title = title_info
        .find("book-title")
        .map(|node| node.text().trim().to_string())
        .unwrap_or_else(|| default_title.to_string());

    let language = title_info
        .find("lang")
        .map(|node| node.text().trim().to_string())
        .unwrap_or_else(|| default_language.to_string());

    let authors = title_info
        .find_all("author")
        .into_iter()
        .map(author_name)
        .collect();

    ExtractedMetadata {
        metadata: BookMetadata {
            title,
            language,
            authors,
        },
        annotation: title_info.find("annotation"),
    }
}

/// Joins the present name parts of an `author` node with single spaces.
///
/// An author without any name part yields an empty string so that author
/// positions stay aligned with the source.
pub fn author_name(author: &Element) -> String {
    NAME_PARTS
        .iter()
        .filter_map(|part| author.find(part))
        .map(|node| node.text().trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_LANGUAGE, DEFAULT_TITLE};

    fn extract(source: &str) -> (BookMetadata, bool) {
        let doc = Document::parse_str(source).unwrap();
        let extracted = extract_metadata(&doc, DEFAULT_TITLE, DEFAULT_LANGUAGE);
        (extracted.metadata, extracted.annotation.is_some())
    }

    #[test]
    fn test_full_title_info() {
        let (metadata, has_annotation) = extract(
            r#"<FictionBook><description><title-info>
                <author><first-name>Ann</first-name><last-name>Lee</last-name></author>
                <author><first-name>Ivan</first-name><middle-name>P.</middle-name><last-name>Sidorov</last-name></author>
                <book-title>Test</book-title>
                <annotation><p>About</p></annotation>
                <lang>ru</lang>
            </title-info></description></FictionBook>"#,
        );
        assert_eq!(metadata.title, "Test");
        assert_eq!(metadata.language, "ru");
        assert_eq!(metadata.authors, vec!["Ann Lee", "Ivan P. Sidorov"]);
        assert!(has_annotation);
    }

    #[test]
    fn test_missing_title_info_uses_defaults() {
        let (metadata, has_annotation) = extract("<FictionBook><body/></FictionBook>");
        assert_eq!(metadata, BookMetadata::default());
        assert!(!has_annotation);
    }

    #[test]
    fn test_missing_fields_fall_back_individually() {
        let (metadata, _) =
            extract("<FictionBook><title-info><lang>de</lang></title-info></FictionBook>");
        assert_eq!(metadata.title, DEFAULT_TITLE);
        assert_eq!(metadata.language, "de");
        assert!(metadata.authors.is_empty());
    }

    #[test]
    fn test_author_without_name_parts_keeps_its_slot() {
        let (metadata, _) = extract(
            r#"<FictionBook><title-info>
                <author><nickname>anon</nickname></author>
                <author><last-name>Lee</last-name></author>
            </title-info></FictionBook>"#,
        );
        assert_eq!(metadata.authors, vec!["", "Lee"]);
    }
}
