//! FB2 document tree built on top of `quick-xml`.
//!
//! FictionBook files are parsed once into an owned, read-only tree of [`Node`]s.
//! The extractors never touch raw XML events; they query the tree through
//! typed find-first / find-all helpers on [`Element`] and [`Document`].
//!
//! Element names are matched by their local part (`<fb:section>` answers to
//! `section`), while attributes keep their qualified name so that FB2 link
//! targets such as `l:href` can be distinguished from a plain `href`.

use std::borrow::Cow;

use lazy_static::lazy_static;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::bytes::Regex;

use crate::error::{Error, Result};

/// How many leading bytes are scanned for an `<?xml ... encoding="..."?>` declaration.
const PROLOG_SCAN_LIMIT: usize = 256;

lazy_static! {
    /// Matches the encoding pseudo-attribute of an XML declaration.
    static ref XML_ENCODING_REGEX: Regex =
        Regex::new(r#"encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap();
}

/// A node of the document tree: either an element or a run of character data.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    qualified_name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let qualified_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr
                    .unescape_value()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                (key, value)
            })
            .collect();

        Self {
            name,
            qualified_name,
            attributes,
            children: Vec::new(),
        }
    }

    /// Local tag name, without any namespace prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag name as written in the source, including its prefix if any.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct child elements, skipping text nodes.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Returns the value of the attribute whose qualified name is `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Looks up `name` and falls back to `fallback`.
    ///
    /// The fallback matches either an attribute literally called `fallback` or any
    /// namespaced attribute whose local part is `fallback`, so `xlink:href` and
    /// `href` both satisfy a lookup of `("l:href", "href")`.
    pub fn attr_or(&self, name: &str, fallback: &str) -> Option<&str> {
        self.attr(name).or_else(|| self.attr(fallback)).or_else(|| {
            self.attributes
                .iter()
                .find(|(key, _)| key.rsplit(':').next() == Some(fallback))
                .map(|(_, value)| value.as_str())
        })
    }

    /// First descendant element (depth-first, document order) named `tag`.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.find_where(&|element: &Element| element.name == tag)
    }

    /// First descendant named `tag` whose attribute `attr` holds one of `values`.
    pub fn find_with_attr(&self, tag: &str, attr: &str, values: &[&str]) -> Option<&Element> {
        self.find_where(&|element: &Element| {
            element.name == tag
                && element
                    .attr(attr)
                    .is_some_and(|value| values.contains(&value))
        })
    }

    /// All descendant elements named `tag`, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_where(&|element: &Element| element.name == tag, &mut found);
        found
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    /// Concatenated character data of every descendant, untouched.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.push_text(&mut text);
        text
    }

    /// Descendant text runs, each trimmed, empty runs dropped, joined by single spaces.
    pub fn stripped_text(&self) -> String {
        let mut pieces = Vec::new();
        self.collect_text_runs(&mut pieces);
        pieces
            .iter()
            .map(|piece| piece.trim())
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn find_where(&self, predicate: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find_where(predicate) {
                return Some(found);
            }
        }
        None
    }

    fn collect_where<'a>(
        &'a self,
        predicate: &dyn Fn(&Element) -> bool,
        found: &mut Vec<&'a Element>,
    ) {
        for child in self.child_elements() {
            if predicate(child) {
                found.push(child);
            }
            child.collect_where(predicate, found);
        }
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.push_text(out),
            }
        }
    }

    fn collect_text_runs<'a>(&'a self, out: &mut Vec<&'a str>) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push(text),
                Node::Element(element) => element.collect_text_runs(out),
            }
        }
    }

    fn push_child_text(&mut self, text: String) {
        // adjacent text and CDATA runs become a single text node
        if let Some(Node::Text(previous)) = self.children.last_mut() {
            previous.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }
}

/// A parsed FB2 document. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parses raw FB2 bytes, decoding legacy encodings first.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let source = decode_source(bytes);
        Self::parse_str(&source)
    }

    /// Parses an already decoded FB2 document.
    pub fn parse_str(source: &str) -> Result<Self> {
        let mut reader = Reader::from_str(source);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Element::from_start(&start)),
                Ok(Event::Empty(start)) => {
                    attach(&mut stack, &mut root, Element::from_start(&start))?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::Parse("closing tag without matching opening tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(text)) => {
                    if let Some(parent) = stack.last_mut() {
                        let content = text
                            .unescape()
                            .map(Cow::into_owned)
                            .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                        parent.push_child_text(content);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_child_text(String::from_utf8_lossy(&data.into_inner()).into_owned());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Parse(format!(
                        "error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        // Truncated documents keep whatever was read; close the open elements
        if !stack.is_empty() {
            log::warn!(
                "FB2 document ended with {} unclosed element(s), closing them",
                stack.len()
            );
        }
        while let Some(element) = stack.pop() {
            attach(&mut stack, &mut root, element)?;
        }

        root.map(|root| Document { root })
            .ok_or_else(|| Error::Parse("document has no root element".to_string()))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// First element named `tag` anywhere in the document, root included.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        if self.root.name == tag {
            Some(&self.root)
        } else {
            self.root.find(tag)
        }
    }

    /// First element named `tag` whose `attr` is one of `values`, root included.
    pub fn find_with_attr(&self, tag: &str, attr: &str, values: &[&str]) -> Option<&Element> {
        let root_matches = self.root.name == tag
            && self
                .root
                .attr(attr)
                .is_some_and(|value| values.contains(&value));
        if root_matches {
            Some(&self.root)
        } else {
            self.root.find_with_attr(tag, attr, values)
        }
    }

    /// Every element named `tag` in document order, root included.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        if self.root.name == tag {
            found.push(&self.root);
        }
        found.extend(self.root.find_all(tag));
        found
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(Error::Parse(format!(
            "unexpected second root element <{}>",
            element.qualified_name
        )))
    }
}

/// Decodes FB2 bytes to text.
///
/// UTF-8 (with or without BOM) is tried first, then the encoding named in the XML
/// declaration, and finally Windows-1252.
pub fn decode_source(bytes: &[u8]) -> Cow<'_, str> {
    let (decoded, _, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return decoded;
    }

    if let Some(encoding) =
        declared_encoding(bytes).and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()))
    {
        log::debug!("Decoding FB2 source as {}", encoding.name());
        let (decoded, _, _) = encoding.decode(bytes);
        return decoded;
    }

    let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    decoded
}

/// Reads the encoding label from the XML declaration, if any.
pub fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let prolog = &bytes[..bytes.len().min(PROLOG_SCAN_LIMIT)];
    let prolog_end = prolog
        .windows(2)
        .position(|window| window == b"?>")
        .unwrap_or(prolog.len());

    XML_ENCODING_REGEX
        .captures(&prolog[..prolog_end])
        .and_then(|captures| captures.get(1))
        .map(|label| String::from_utf8_lossy(label.as_bytes()).into_owned())
}
