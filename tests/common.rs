//! Common test utilities and constants for the fb2epub crate.
//!
//! Provides functions for setting up test directories, generating FB2
//! fixtures and archives, and inspecting produced EPUB files.

use rand::{Rng, distributions::Alphanumeric};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base64 of a tiny JPEG header, enough to be accepted as a cover payload.
#[allow(dead_code)]
pub const COVER_BASE64: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD/2Q==";

/// Scratch directories of one test.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

/// Creates a clean, uniquely named test directory with `source` and `target` subdirectories.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let target_dir = test_dir.join("target");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&target_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        target_dir,
    }
}

/// Declarative description of an FB2 fixture.
#[allow(dead_code)]
#[derive(Default)]
pub struct SampleBook<'a> {
    pub title: Option<&'a str>,
    pub lang: Option<&'a str>,
    pub authors: Vec<(&'a str, &'a str)>,
    pub annotation: Option<&'a str>,
    /// Bodies, each a list of `(section title, paragraph)` pairs.
    pub bodies: Vec<Vec<(&'a str, &'a str)>>,
    pub cover_base64: Option<&'a str>,
}

#[allow(dead_code)]
impl SampleBook<'_> {
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="utf-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0" xmlns:l="http://www.w3.org/1999/xlink">
<description><title-info>
"#,
        );
        for (first, last) in &self.authors {
            xml.push_str(&format!(
                "<author><first-name>{}</first-name><last-name>{}</last-name></author>\n",
                first, last
            ));
        }
        if let Some(title) = self.title {
            xml.push_str(&format!("<book-title>{}</book-title>\n", title));
        }
        if let Some(annotation) = self.annotation {
            xml.push_str(&format!("<annotation><p>{}</p></annotation>\n", annotation));
        }
        if let Some(lang) = self.lang {
            xml.push_str(&format!("<lang>{}</lang>\n", lang));
        }
        xml.push_str("</title-info></description>\n");

        for sections in &self.bodies {
            xml.push_str("<body>\n");
            for (title, paragraph) in sections {
                xml.push_str(&format!(
                    "<section><title><p>{}</p></title><p>{}</p></section>\n",
                    title, paragraph
                ));
            }
            xml.push_str("</body>\n");
        }

        if let Some(cover) = self.cover_base64 {
            xml.push_str(&format!(
                "<binary id=\"cover.jpg\" content-type=\"image/jpeg\">{}</binary>\n",
                cover
            ));
        }
        xml.push_str("</FictionBook>\n");
        xml
    }
}

/// Writes an FB2 fixture to `path`.
#[allow(dead_code)]
pub async fn write_fb2(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.unwrap();
    }
    fs::write(path, content).await.unwrap();
}

/// Creates a ZIP archive holding the given `(entry name, content)` pairs, in order.
#[allow(dead_code)]
pub fn create_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// Checks that a ZIP file (EPUB) exists and contains at least one entry.
#[allow(dead_code)]
pub fn assert_valid_zip_file(path: &Path) {
    assert!(path.exists(), "Output ZIP file does not exist: {:?}", path);
    assert!(path.is_file(), "Output ZIP path is not a file: {:?}", path);

    let zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    assert!(zip.len() > 0, "Output ZIP file is empty: {:?}", path);
}

/// Names of every entry in an EPUB.
#[allow(dead_code)]
pub fn epub_entry_names(path: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    zip.file_names().map(str::to_string).collect()
}

/// Reads the first EPUB entry whose name ends with `suffix`.
#[allow(dead_code)]
pub fn read_epub_entry(path: &Path, suffix: &str) -> Option<String> {
    let mut zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let name = zip
        .file_names()
        .find(|name| name.ends_with(suffix))?
        .to_string();
    let mut content = String::new();
    zip.by_name(&name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    Some(content)
}

/// Every entry of an EPUB as `(name, bytes)`, in archive order.
#[allow(dead_code)]
pub fn epub_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    (0..zip.len())
        .map(|index| {
            let mut entry = zip.by_index(index).unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (entry.name().to_string(), content)
        })
        .collect()
}

/// Spine `idref`s of a package document, in reading order.
#[allow(dead_code)]
pub fn spine_itemrefs(opf: &str) -> Vec<String> {
    opf.split("<itemref idref=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}
