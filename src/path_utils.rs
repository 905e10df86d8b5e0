//! Path utilities for naming and validating conversion outputs.
//!
//! Output files are named after their input (`book.fb2` becomes `book.epub`).
//! Names coming from archive entries are untrusted, so only their final
//! component is used and characters that file systems reject are replaced.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Extension of produced packages.
pub const EPUB_EXTENSION: &str = "epub";

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Base name of `path` without its extension (`dir/book.fb2` gives `book`).
pub fn file_stem_lossy(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Base name of an archive entry without its extension.
///
/// Entry names always use `/`, but archives produced on Windows sometimes
/// carry `\` separators, so both are treated as directory boundaries.
pub fn entry_stem(entry_name: &str) -> String {
    let base = entry_name.rsplit(['/', '\\']).next().unwrap_or(entry_name);
    file_stem_lossy(Path::new(base))
}

/// Sanitizes a filename by replacing invalid characters with safe alternatives.
///
/// # Arguments
///
/// * `filename` - The filename to sanitize
///
/// # Returns
///
/// * `String` - The sanitized filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Path of the EPUB produced for `stem` inside `target_dir`.
pub fn output_path_for(target_dir: &Path, stem: &str) -> PathBuf {
    target_dir.join(format!("{}.{}", sanitize_filename(stem), EPUB_EXTENSION))
}

/// Like [`output_path_for`], but never returns a path already in `taken`.
///
/// Clashing names get ` (2)`, ` (3)`, ... appended to the stem. The returned
/// path is recorded in `taken`.
pub fn unique_output_path(target_dir: &Path, stem: &str, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let mut candidate = output_path_for(target_dir, stem);
    let mut counter = 2;
    while taken.contains(&candidate) {
        candidate = output_path_for(target_dir, &format!("{} ({})", stem, counter));
        counter += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Checks that `path` exists and is a regular file.
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(Error::InvalidPath(
            path.to_path_buf(),
            "Input path is not a file.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_string_lossy() {
        let path = Path::new("test/path");
        let result = path_to_string_lossy(path);
        assert!(result.contains("test"));
        assert!(result.contains("path"));
    }

    #[test]
    fn test_entry_stem_drops_directories() {
        assert_eq!(entry_stem("book.fb2"), "book");
        assert_eq!(entry_stem("library/author/book.fb2"), "book");
        assert_eq!(entry_stem("library\\book.fb2"), "book");
        assert_eq!(entry_stem("../../evil.fb2"), "evil");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test<file>"), "test-file-");
        assert_eq!(sanitize_filename("test|file"), "test-file");
        assert_eq!(sanitize_filename("test?file"), "test-file");
        assert_eq!(sanitize_filename("test:file"), "test-file");
        assert_eq!(sanitize_filename("normal_file.txt"), "normal_file.txt");
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("out"), "book"),
            PathBuf::from("out").join("book.epub")
        );
    }

    #[test]
    fn test_unique_output_path_suffixes_clashes() {
        let mut taken = HashSet::new();
        let dir = Path::new("out");
        assert_eq!(unique_output_path(dir, "book", &mut taken), dir.join("book.epub"));
        assert_eq!(unique_output_path(dir, "book", &mut taken), dir.join("book (2).epub"));
        assert_eq!(unique_output_path(dir, "book", &mut taken), dir.join("book (3).epub"));
        assert_eq!(unique_output_path(dir, "other", &mut taken), dir.join("other.epub"));
    }

    #[test]
    fn test_validate_input_file() {
        assert!(matches!(
            validate_input_file(Path::new("definitely/missing.fb2")),
            Err(Error::InputNotFound(_))
        ));
        assert!(matches!(
            validate_input_file(Path::new("src")),
            Err(Error::InvalidPath(_, _))
        ));
    }
}
