//! Chapter assembly: one chapter document per FB2 `section`.

use quick_xml::escape::escape;

use crate::document::{Document, Element};
use crate::formatter::format_section;
use crate::types::{Chapter, TocLink};

/// Chapters of a document together with their table of contents links.
///
/// `toc[i]` always links to `chapters[i]`.
#[derive(Debug, Clone, Default)]
pub struct AssembledChapters {
    pub chapters: Vec<Chapter>,
    pub toc: Vec<TocLink>,
}

/// Walks every `section` of every `body`, in document order.
///
/// Ordinals start at 1 and continue across bodies. Nested sections become
/// chapters of their own, and their content also stays inside the enclosing
/// chapter.
pub fn assemble_chapters(document: &Document) -> AssembledChapters {
    let mut assembled = AssembledChapters::default();

    for body in document.find_all("body") {
        for section in body.find_all("section") {
            let ordinal = assembled.chapters.len() + 1;
            let chapter = build_chapter(ordinal, section);

            assembled.toc.push(TocLink {
                href: chapter.file_name.clone(),
                title: chapter.title.clone(),
                anchor: chapter.anchor(),
            });
            assembled.chapters.push(chapter);
        }
    }

    log::debug!("Assembled {} chapter(s)", assembled.chapters.len());
    assembled
}

fn build_chapter(ordinal: usize, section: &Element) -> Chapter {
    // Every chapter needs a non-empty title to get a table of contents entry.
    let title = section
        .find("title")
        .map(Element::stripped_text)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| format!("Chapter {}", ordinal));

    let html_content = heading_with_content(&title, section);
    Chapter::new(ordinal, title, html_content)
}

/// `<h1>` heading followed by the formatted content of `section`.
pub fn heading_with_content(title: &str, section: &Element) -> String {
    format!("<h1>{}</h1>{}", escape(title), format_section(section))
}
