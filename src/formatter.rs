//! Rendering of FB2 section content into XHTML fragments.
//!
//! Only paragraphs, links and subtitles produce output. They are emitted in
//! document order at any depth below the section, so a link nested in a
//! paragraph yields both the paragraph and the link.

use quick_xml::escape::escape;

use crate::document::Element;

/// Namespaced FB2 link target attribute, with `href` as fallback.
///
/// A link carrying neither attribute gets the literal target `href`.
pub const LINK_TARGET_ATTR: &str = "l:href";
const LINK_FALLBACK_ATTR: &str = "href";

const PARAGRAPH_OPEN: &str = r#"<p style="text-indent: 1em;">"#;

/// Formats the content of a section-like element (a `section` or an `annotation`).
pub fn format_section(section: &Element) -> String {
    let mut html = String::new();
    for child in section.child_elements() {
        format_element(child, false, &mut html);
    }
    html
}

fn format_element(element: &Element, in_title: bool, html: &mut String) {
    match element.name() {
        "p" if !in_title => {
            html.push_str(PARAGRAPH_OPEN);
            html.push_str(&paragraph_inner(element));
            html.push_str("</p>");
        }
        "a" => {
            let href = element
                .attr_or(LINK_TARGET_ATTR, LINK_FALLBACK_ATTR)
                .unwrap_or(LINK_FALLBACK_ATTR);
            html.push_str(&format!(
                r#"<a href="{}">{}</a>"#,
                escape(href),
                escape(element.text().as_str())
            ));
        }
        "subtitle" => {
            html.push_str(PARAGRAPH_OPEN);
            html.push_str(&format!(
                "<subtitle>{}</subtitle>",
                escape(element.text().as_str())
            ));
            html.push_str("</p>");
        }
        _ => {}
    }

    let in_title = in_title || element.name() == "title";
    for child in element.child_elements() {
        format_element(child, in_title, html);
    }
}

/// Inner markup of a paragraph.
///
/// Emphasis anywhere in the paragraph italicizes the whole text. A paragraph
/// holding a link renders empty; the link itself is emitted on its own.
fn paragraph_inner(paragraph: &Element) -> String {
    if paragraph.contains("emphasis") {
        format!("<i>{}</i>", escape(paragraph.text().as_str()))
    } else if paragraph.contains("a") {
        String::new()
    } else {
        escape(paragraph.text().as_str()).into_owned()
    }
}
