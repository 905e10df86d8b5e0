use chrono::{DateTime, Utc};
use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use lazy_static::lazy_static;
use quick_xml::escape::escape;
use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::types::{
    ANNOTATION_FILE_NAME, ANNOTATION_TITLE, CONTENTS_PAGE_FILE_NAME, CONTENTS_TITLE,
    COVER_IMAGE_FILE_NAME, COVER_PAGE_FILE_NAME, EpubPackage, EpubVersion, SpineItem,
};

const CHAPTER_TEMPLATE: &str = include_str!("../../templates/chapter.xhtml");
const COVER_TEMPLATE: &str = include_str!("../../templates/cover.xhtml");
const DEFAULT_STYLESHEET: &str = include_str!("../../templates/book.css");

const XHTML_MIME_TYPE: &str = "application/xhtml+xml";

lazy_static! {
    static ref TEMPLATE_PLACEHOLDER_REGEX: Regex = Regex::new(r"%(title|lang|body|src)%").unwrap();
}

/// Fills every `%name%` placeholder of `template` in a single pass.
///
/// Substituted values are never scanned again, so a title containing `%body%`
/// stays literal.
fn fill_template(template: &str, value_of: impl Fn(&str) -> String) -> String {
    TEMPLATE_PLACEHOLDER_REGEX
        .replace_all(template, |caps: &Captures| value_of(&caps[1]))
        .into_owned()
}

/// Wraps an XHTML fragment into a complete content document.
///
/// # Arguments
///
/// * `title` - Document title, used in `<title>`
/// * `lang` - Language code for the `lang` attributes
/// * `body` - Already escaped XHTML fragment
fn generate_xhtml(title: &str, lang: &str, body: &str) -> String {
    fill_template(CHAPTER_TEMPLATE, |name| match name {
        "title" => escape(title).into_owned(),
        "lang" => escape(lang).into_owned(),
        "body" => body.to_string(),
        _ => String::new(),
    })
}

/// Generates the cover page pointing at the packaged cover image.
fn generate_cover_xhtml(book_title: &str, lang: &str) -> String {
    fill_template(COVER_TEMPLATE, |name| match name {
        "title" => escape(book_title).into_owned(),
        "lang" => escape(lang).into_owned(),
        "src" => COVER_IMAGE_FILE_NAME.to_string(),
        _ => String::new(),
    })
}

/// Body of the contents page: one link per table of contents entry, in order.
fn contents_fragment(package: &EpubPackage) -> String {
    let mut html = format!("<h1>{}</h1><ol>", CONTENTS_TITLE);
    for link in &package.toc {
        html.push_str(&format!(
            r#"<li><a href="{}">{}</a></li>"#,
            escape(link.href.as_str()),
            escape(link.title.as_str())
        ));
    }
    html.push_str("</ol>");
    html
}

/// A generator for EPUB packages.
///
/// Wraps `EpubBuilder` and feeds it the documents of an [`EpubPackage`] in
/// spine order. The navigation spine slot holds an untitled contents page, so
/// the table of contents lists exactly the package's own links. The cover page
/// is registered as a manifest-only resource and does not shift the reading
/// order.
///
/// The modification date written to the package is fixed (the Unix epoch
/// unless [`with_modified_date`](EpubWriter::with_modified_date) is used), so
/// rendering the same package twice gives the same documents.
#[derive(Debug, Clone)]
pub struct EpubWriter {
    version: EpubVersion,
    stylesheet: String,
    modified_date: DateTime<Utc>,
}

impl Default for EpubWriter {
    fn default() -> Self {
        Self::new(EpubVersion::default(), None)
    }
}

impl EpubWriter {
    /// Creates a writer for the given EPUB version.
    ///
    /// # Arguments
    ///
    /// * `version` - EPUB version of the produced package
    /// * `stylesheet` - Replacement CSS; the bundled stylesheet is used when `None`
    pub fn new(version: EpubVersion, stylesheet: Option<&str>) -> Self {
        Self {
            version,
            stylesheet: stylesheet.unwrap_or(DEFAULT_STYLESHEET).to_string(),
            modified_date: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Sets the `dcterms:modified` date of produced packages.
    pub fn with_modified_date(mut self, modified_date: DateTime<Utc>) -> Self {
        self.modified_date = modified_date;
        self
    }

    fn set_metadata(&self, epub: &mut EpubBuilder<ZipLibrary>, package: &EpubPackage) {
        let metadata = &package.metadata;

        epub.set_uuid(package.identifier);
        epub.set_modified_date(self.modified_date);
        epub.set_title(metadata.title.as_str());
        // `metadata("author", "")` would clear the list; empty names are kept.
        for author in &metadata.authors {
            epub.add_author(author.as_str());
        }
        epub.add_language(metadata.language.as_str());
        epub.set_generator(env!("CARGO_PKG_NAME"));
    }

    fn add_cover(&self, epub: &mut EpubBuilder<ZipLibrary>, package: &EpubPackage) -> Result<()> {
        let Some(cover) = &package.cover else {
            return Ok(());
        };

        epub.add_cover_image(COVER_IMAGE_FILE_NAME, cover.data.as_slice(), cover.mime_type)?;

        let cover_page = generate_cover_xhtml(&package.metadata.title, &package.metadata.language);
        epub.add_resource(COVER_PAGE_FILE_NAME, cover_page.as_bytes(), XHTML_MIME_TYPE)?;
        Ok(())
    }

    fn add_spine(&self, epub: &mut EpubBuilder<ZipLibrary>, package: &EpubPackage) -> Result<()> {
        let lang = package.metadata.language.as_str();

        for item in &package.spine {
            match item {
                SpineItem::Nav => {
                    let xhtml = generate_xhtml(CONTENTS_TITLE, lang, &contents_fragment(package));
                    epub.add_content(EpubContent::new(CONTENTS_PAGE_FILE_NAME, xhtml.as_bytes()))?;
                }
                SpineItem::Annotation => {
                    let annotation = package.annotation.as_ref().ok_or_else(|| {
                        Error::Other("spine references a missing annotation".to_string())
                    })?;
                    let xhtml = generate_xhtml(ANNOTATION_TITLE, lang, &annotation.html_content);
                    epub.add_content(
                        EpubContent::new(ANNOTATION_FILE_NAME, xhtml.as_bytes())
                            .title(ANNOTATION_TITLE)
                            .reftype(ReferenceType::Preface),
                    )?;
                }
                SpineItem::Chapter(ordinal) => {
                    let chapter = package.chapter(*ordinal).ok_or_else(|| {
                        Error::Other(format!("spine references missing chapter {}", ordinal))
                    })?;
                    let xhtml = generate_xhtml(&chapter.title, lang, &chapter.html_content);
                    epub.add_content(
                        EpubContent::new(chapter.file_name.as_str(), xhtml.as_bytes())
                            .title(chapter.title.as_str())
                            .reftype(ReferenceType::Text),
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl Generator for EpubWriter {
    fn render(&self, package: &EpubPackage) -> Result<Vec<u8>> {
        let mut epub = EpubBuilder::new(ZipLibrary::new()?)?;
        epub.epub_version(self.version.into());
        epub.stylesheet(self.stylesheet.as_bytes())?;

        self.set_metadata(&mut epub, package);
        self.add_cover(&mut epub, package)?;
        self.add_spine(&mut epub, package)?;

        let mut output = Vec::new();
        epub.generate(&mut output)?;
        log::debug!(
            "Rendered EPUB '{}' ({} chapters, {} bytes)",
            package.metadata.title,
            package.chapters.len(),
            output.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{PackageOptions, assemble_package};
    use std::io::{Cursor, Read};

    fn read_entry(epub: &[u8], suffix: &str) -> Option<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(epub)).unwrap();
        let name = archive
            .file_names()
            .find(|name| name.ends_with(suffix))?
            .to_string();
        let mut content = String::new();
        archive
            .by_name(&name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        Some(content)
    }

    #[test]
    fn test_generate_xhtml_wraps_fragment() {
        let xhtml = generate_xhtml("A & B", "en", "<h1>A &amp; B</h1>");
        assert!(xhtml.contains("<title>A &amp; B</title>"));
        assert!(xhtml.contains(r#"lang="en""#));
        assert!(xhtml.contains("<h1>A &amp; B</h1>"));
    }

    #[test]
    fn test_render_writes_chapters_and_navigation() {
        let package = assemble_package(
            br#"<FictionBook>
                <description><title-info>
                    <author><first-name>Ann</first-name><last-name>Lee</last-name></author>
                    <book-title>Test</book-title>
                </title-info></description>
                <body><section><title><p>Intro</p></title><p>Hello</p></section></body>
            </FictionBook>"#,
            &PackageOptions::default(),
        )
        .unwrap();

        let epub = EpubWriter::default().render(&package).unwrap();

        let chapter = read_entry(&epub, "chapter_1.xhtml").unwrap();
        assert!(chapter.contains(r#"<h1>Intro</h1><p style="text-indent: 1em;">Hello</p>"#));
        assert!(read_entry(&epub, "toc.ncx").is_some());
        assert!(read_entry(&epub, "nav.xhtml").is_some());

        let opf = read_entry(&epub, ".opf").unwrap();
        assert!(opf.contains("Test"));
        assert!(opf.contains("Ann Lee"));
        assert!(opf.contains(&package.identifier.to_string()));
    }

    fn itemrefs(opf: &str) -> Vec<String> {
        opf.split("<itemref idref=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_fill_template_substitutes_once() {
        let xhtml = generate_xhtml("%body% and %lang%", "en", "<p>hello</p>");
        assert!(xhtml.contains("<title>%body% and %lang%</title>"));
        assert_eq!(xhtml.matches("<p>hello</p>").count(), 1);
    }

    #[test]
    fn test_empty_author_keeps_its_neighbours() {
        let package = assemble_package(
            br#"<FictionBook><description><title-info>
                    <author><first-name>Ann</first-name><last-name>Lee</last-name></author>
                    <author><nickname>anon</nickname></author>
                    <author><first-name>Bob</first-name></author>
                </title-info></description><body/></FictionBook>"#,
            &PackageOptions::default(),
        )
        .unwrap();
        assert_eq!(package.metadata.authors, vec!["Ann Lee", "", "Bob"]);

        let epub = EpubWriter::default().render(&package).unwrap();
        let opf = read_entry(&epub, ".opf").unwrap();
        assert!(opf.contains(">Ann Lee</dc:creator>"));
        assert!(opf.contains(">Bob</dc:creator>"));
    }

    #[test]
    fn test_navigation_lists_only_package_links() {
        let package = assemble_package(
            br#"<FictionBook><description><title-info>
                    <annotation><p>Blurb</p></annotation>
                </title-info></description>
                <body><section><p>a</p></section><section><p>b</p></section></body>
            </FictionBook>"#,
            &PackageOptions::default(),
        )
        .unwrap();
        let epub = EpubWriter::default().render(&package).unwrap();

        let ncx = read_entry(&epub, "toc.ncx").unwrap();
        assert_eq!(ncx.matches("<navPoint ").count(), package.toc.len());
        assert_eq!(package.toc.len(), 3);

        let nav = read_entry(&epub, "nav.xhtml").unwrap();
        assert_eq!(nav.matches("<li><a href=").count(), 3);
        assert!(!nav.contains(r#"href="toc.xhtml""#));

        let opf = read_entry(&epub, ".opf").unwrap();
        assert_eq!(
            itemrefs(&opf),
            vec![
                "id_annotation.xhtml",
                "id_toc.xhtml",
                "id_chapter_1.xhtml",
                "id_chapter_2.xhtml"
            ]
        );

        let contents = read_entry(&epub, CONTENTS_PAGE_FILE_NAME).unwrap();
        assert!(contents.contains(r#"<a href="chapter_2.xhtml">Chapter 2</a>"#));
    }

    #[test]
    fn test_modified_date_is_fixed() {
        let package = assemble_package(
            b"<FictionBook><body><section><p>x</p></section></body></FictionBook>",
            &PackageOptions::default(),
        )
        .unwrap();

        let opf = read_entry(&EpubWriter::default().render(&package).unwrap(), ".opf").unwrap();
        assert!(opf.contains("1970-01-01T00:00:00Z"));

        let date = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let writer = EpubWriter::default().with_modified_date(date);
        let opf = read_entry(&writer.render(&package).unwrap(), ".opf").unwrap();
        assert!(opf.contains("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_render_includes_cover_when_present() {
        let package = assemble_package(
            br#"<FictionBook><body><section><p>x</p></section></body>
                <binary id="c" content-type="image/jpeg">/9j/4AA=</binary></FictionBook>"#,
            &PackageOptions::default(),
        )
        .unwrap();

        let epub = EpubWriter::default().render(&package).unwrap();
        assert!(read_entry(&epub, COVER_PAGE_FILE_NAME).is_some());

        let mut archive = zip::ZipArchive::new(Cursor::new(epub.as_slice())).unwrap();
        assert!(archive.file_names().any(|name| name.ends_with(COVER_IMAGE_FILE_NAME)));
        let opf_name = archive
            .file_names()
            .find(|name| name.ends_with(".opf"))
            .unwrap()
            .to_string();
        let mut opf = String::new();
        archive.by_name(&opf_name).unwrap().read_to_string(&mut opf).unwrap();
        assert!(opf.contains(COVER_IMAGE_FILE_NAME));
    }
}
