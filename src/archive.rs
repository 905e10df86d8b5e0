//! Batch conversion of FB2 entries stored in a ZIP archive.
//!
//! Entries are converted one after another in archive listing order. A failing
//! entry is logged and skipped; its siblings are still converted.

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::generator::{Generator, PackageOptions, assemble_package};
use crate::path_utils::{entry_stem, path_to_string_lossy, unique_output_path, validate_input_file};

lazy_static! {
    /// Default pattern for archive entries eligible for conversion.
    pub static ref DEFAULT_FB2_ENTRY_REGEX: Regex = Regex::new(r"\.fb2$").unwrap();
}

/// Converts every eligible entry of an archive into `target_dir`.
pub struct ArchiveConverter<'a> {
    target_dir: &'a Path,
    entry_regex: &'a Regex,
    options: &'a PackageOptions,
    generator: &'a dyn Generator,
}

impl<'a> ArchiveConverter<'a> {
    /// Creates a new converter.
    ///
    /// # Arguments
    ///
    /// * `target_dir` - Existing directory receiving the EPUB files
    /// * `entry_regex` - Entries whose name matches are converted
    /// * `options` - Package assembly fallbacks
    /// * `generator` - Serializer used for each package
    pub fn new(
        target_dir: &'a Path,
        entry_regex: &'a Regex,
        options: &'a PackageOptions,
        generator: &'a dyn Generator,
    ) -> Self {
        Self {
            target_dir,
            entry_regex,
            options,
            generator,
        }
    }

    /// Converts the archive at `archive_path`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PathBuf>)` - Outputs of the entries that converted, in archive order
    /// * `Err(Error::NoEligibleEntries)` - The archive holds no matching entry
    /// * `Err(Error)` - The archive itself is missing or unreadable
    pub fn convert(&self, archive_path: &Path) -> Result<Vec<PathBuf>> {
        validate_input_file(archive_path)?;
        let mut archive = ZipArchive::new(File::open(archive_path)?)?;

        let entries = self.eligible_entries(&mut archive);
        if entries.is_empty() {
            return Err(Error::NoEligibleEntries(archive_path.to_path_buf()));
        }
        log::debug!(
            "Found {} FB2 entries in '{}'",
            entries.len(),
            path_to_string_lossy(archive_path)
        );

        let mut taken = HashSet::new();
        let mut produced = Vec::with_capacity(entries.len());

        for (index, name) in entries {
            let output_path = unique_output_path(self.target_dir, &entry_stem(&name), &mut taken);
            match self.convert_entry(&mut archive, index, &output_path) {
                Ok(()) => {
                    log::info!("Created EPUB book: {}", path_to_string_lossy(&output_path));
                    produced.push(output_path);
                }
                Err(e) => log::warn!("Skipping archive entry '{}': {}", name, e),
            }
        }

        Ok(produced)
    }

    /// Index and name of every file entry matching the entry pattern.
    pub fn eligible_entries<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Vec<(usize, String)> {
        (0..archive.len())
            .filter_map(|index| {
                let entry = archive.by_index_raw(index).ok()?;
                if entry.is_dir() {
                    return None;
                }
                let name = entry.name().to_string();
                self.entry_regex.is_match(&name).then_some((index, name))
            })
            .collect()
    }

    fn convert_entry<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        index: usize,
        output_path: &Path,
    ) -> Result<()> {
        let mut bytes = Vec::new();
        archive.by_index(index)?.read_to_end(&mut bytes)?;

        let package = assemble_package(&bytes, self.options)?;
        self.generator.save(&package, output_path)
    }
}
