use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;

use crate::archive::{ArchiveConverter, DEFAULT_FB2_ENTRY_REGEX};
use crate::error::{Error, Result};
use crate::generator::epub::EpubWriter;
use crate::generator::{Generator, PackageOptions, assemble_package};
use crate::path_utils::{
    file_stem_lossy, output_path_for, path_to_string_lossy, validate_input_file,
};
use crate::types::{BookReport, DEFAULT_LANGUAGE, DEFAULT_TITLE, EpubVersion, ExecutionMode};

/// The main conversion configuration, built declaratively using the builder pattern.
///
/// This struct holds the settings shared by every conversion: where outputs go,
/// the metadata fallbacks, and how the EPUB package is produced. Once configured,
/// it can run any of the entry points:
///
/// - [`convert_file`](Fb2EpubConfig::convert_file): One `.fb2` file to one `.epub`
/// - [`convert_archive`](Fb2EpubConfig::convert_archive): Every `.fb2` entry of a ZIP archive
/// - [`analyze_file`](Fb2EpubConfig::analyze_file): Extraction only, nothing is written
///
/// Each call is an independent, sequential pipeline; a single config can serve
/// concurrent calls as long as their outputs do not share a name.
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use fb2epub::prelude::*;
/// # use std::path::PathBuf;
/// let config = Fb2EpubConfig::builder()
///     .target_path(PathBuf::from("./output"))
///     .default_language("ru")
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct Fb2EpubConfig {
    /// Directory where generated EPUB files are saved, as `{input stem}.epub`.
    #[builder(default = "PathBuf::from(\".\")")]
    pub target_path: PathBuf,

    /// Whether to create [`target_path`](Fb2EpubConfig::target_path) when it is missing.
    ///
    /// If `false`, converting into a missing directory fails with [`Error::NotFound`].
    #[builder(default = "true")]
    pub create_output_directory: bool,

    /// Title used for books without `book-title`.
    #[builder(default = "DEFAULT_TITLE.to_string()")]
    pub default_title: String,

    /// Language used for books without `lang`.
    #[builder(default = "DEFAULT_LANGUAGE.to_string()")]
    pub default_language: String,

    /// EPUB version of the generated packages.
    #[builder(default)]
    pub epub_version: EpubVersion,

    /// CSS replacing the bundled stylesheet.
    #[builder(default)]
    pub stylesheet: Option<String>,

    /// `dcterms:modified` date written to every package.
    ///
    /// Defaults to the Unix epoch, so converting the same input twice yields
    /// packages that differ only in their identifier.
    #[builder(default)]
    pub modified_date: Option<DateTime<Utc>>,

    /// Custom regex selecting the archive entries to convert.
    ///
    /// If not provided, entries whose name ends in `.fb2` are converted.
    ///
    /// Example: `r"(?i)\.fb2$"` to also accept `BOOK.FB2`
    #[builder(default)]
    pub entry_name_regex_str: Option<String>,
}

impl Fb2EpubConfig {
    /// Creates a new builder for configuring `Fb2EpubConfig`.
    pub fn builder() -> Fb2EpubConfigBuilder {
        Fb2EpubConfigBuilder::default()
    }

    /// Performs validation checks on the configuration for a specific execution mode.
    ///
    /// Nothing is converted or created. Every `convert_*` method runs this first,
    /// so calling it manually only moves the failure earlier.
    ///
    /// # Arguments
    ///
    /// * `mode` - The intended execution mode:
    ///   - [`ExecutionMode::SingleFile`]: Validates output settings
    ///   - [`ExecutionMode::Archive`]: Also validates the entry regex
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - Configuration is valid for the specified mode
    /// * `Err(Error)` - Configuration has validation errors
    pub fn preflight_check(&self, mode: ExecutionMode) -> Result<&Self> {
        if self.default_title.trim().is_empty() {
            return Err(Error::Other("Default title must not be empty".to_string()));
        }
        if self.default_language.trim().is_empty() {
            return Err(Error::Other("Default language must not be empty".to_string()));
        }
        if self.target_path.as_os_str().is_empty() {
            return Err(Error::Other("Target path is required".to_string()));
        }
        if self.target_path.exists() && !self.target_path.is_dir() {
            return Err(Error::InvalidPath(
                self.target_path.clone(),
                "Target path is not a directory.".to_string(),
            ));
        }
        if !self.create_output_directory && !self.target_path.exists() {
            return Err(Error::NotFound(format!(
                "Target directory does not exist: {:?}",
                self.target_path
            )));
        }

        match mode {
            ExecutionMode::SingleFile => {}
            ExecutionMode::Archive => {
                self.entry_name_regex()?;
            }
        }

        Ok(self)
    }

    /// Fallback values handed to package assembly.
    pub fn package_options(&self) -> PackageOptions {
        PackageOptions {
            default_title: self.default_title.clone(),
            default_language: self.default_language.clone(),
        }
    }

    /// EPUB writer configured with this config's version and stylesheet.
    pub fn writer(&self) -> EpubWriter {
        let writer = EpubWriter::new(self.epub_version, self.stylesheet.as_deref());
        match self.modified_date {
            Some(date) => writer.with_modified_date(date),
            None => writer,
        }
    }

    /// Compiled archive entry pattern.
    pub fn entry_name_regex(&self) -> Result<Regex> {
        match &self.entry_name_regex_str {
            Some(pattern) => Ok(Regex::new(pattern)?),
            None => Ok(DEFAULT_FB2_ENTRY_REGEX.clone()),
        }
    }

    /// Parses an FB2 file and reports what its EPUB would contain.
    ///
    /// # Returns
    ///
    /// * `Ok(BookReport)` - Metadata, chapter titles, table of contents, annotation and cover presence
    /// * `Err(Error)` - The file is missing or cannot be parsed
    pub async fn analyze_file(&self, input_path: impl AsRef<Path>) -> Result<BookReport> {
        let input_path = input_path.as_ref();
        let bytes = read_input(input_path).await?;
        let options = self.package_options();

        let package = spawn_blocking(move || assemble_package(&bytes, &options)).await??;
        Ok(BookReport::from(&package))
    }

    /// Converts one FB2 file into `{target_path}/{input stem}.epub`.
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written EPUB
    /// * `Err(Error)` - [`Error::InputNotFound`], [`Error::Parse`], [`Error::Write`] or a
    ///   configuration error
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use fb2epub::prelude::*;
    /// # #[tokio::main]
    /// # async fn main() -> fb2epub::error::Result<()> {
    /// let config = Fb2EpubConfig::builder().target_path("./books").build()?;
    /// let epub = config.convert_file("novel.fb2").await?;
    /// println!("Wrote {:?}", epub);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn convert_file(&self, input_path: impl AsRef<Path>) -> Result<PathBuf> {
        let input_path = input_path.as_ref();
        let result = self.perform_file_conversion(input_path).await;
        if let Err(e) = &result {
            log::error!(
                "Failed to convert FB2 to EPUB '{}': {}",
                path_to_string_lossy(input_path),
                e
            );
        }
        result
    }

    /// Converts every eligible entry of a ZIP archive.
    ///
    /// Entries are converted sequentially, in archive order. Entries that fail are
    /// logged and left out of the result; no file is kept for them.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PathBuf>)` - Paths of the EPUBs that were written
    /// * `Err(Error)` - The archive is missing or unreadable, or holds no eligible
    ///   entry ([`Error::NoEligibleEntries`])
    pub async fn convert_archive(&self, input_path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let input_path = input_path.as_ref();
        let result = self.perform_archive_conversion(input_path).await;
        if let Err(e) = &result {
            log::error!(
                "Failed to convert FB2 archive to EPUB '{}': {}",
                path_to_string_lossy(input_path),
                e
            );
        }
        result
    }

    async fn perform_file_conversion(&self, input_path: &Path) -> Result<PathBuf> {
        self.preflight_check(ExecutionMode::SingleFile)?;
        let bytes = read_input(input_path).await?;
        let target_dir = self.prepare_target_directory().await?;
        let output_path = output_path_for(&target_dir, &file_stem_lossy(input_path));

        let options = self.package_options();
        let writer = self.writer();
        let destination = output_path.clone();
        spawn_blocking(move || {
            let package = assemble_package(&bytes, &options)?;
            writer.save(&package, &destination)
        })
        .await??;

        log::info!("Created EPUB book: {}", path_to_string_lossy(&output_path));
        Ok(output_path)
    }

    async fn perform_archive_conversion(&self, input_path: &Path) -> Result<Vec<PathBuf>> {
        self.preflight_check(ExecutionMode::Archive)?;
        validate_input_file(input_path)?;
        let target_dir = self.prepare_target_directory().await?;

        let entry_regex = self.entry_name_regex()?;
        let options = self.package_options();
        let writer = self.writer();
        let archive_path = input_path.to_path_buf();

        spawn_blocking(move || {
            ArchiveConverter::new(&target_dir, &entry_regex, &options, &writer).convert(&archive_path)
        })
        .await?
    }

    async fn prepare_target_directory(&self) -> Result<PathBuf> {
        let path = self.target_path.clone();
        if !path.exists() {
            if !self.create_output_directory {
                return Err(Error::NotFound(
                    "Target directory does not exist".to_string(),
                ));
            }
            fs::create_dir_all(&path).await?;
        }
        Ok(path)
    }
}

/// Reads a whole input file, reporting a missing file as [`Error::InputNotFound`].
async fn read_input(input_path: &Path) -> Result<Vec<u8>> {
    validate_input_file(input_path)?;
    fs::read(input_path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::InputNotFound(input_path.to_path_buf()),
        _ => Error::Io(e),
    })
}

impl Fb2EpubConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(Some(s)) = &self.entry_name_regex_str {
            if Regex::new(s).is_err() {
                return Err(format!("Invalid entry_name_regex: {}", s));
            }
        }
        if let Some(title) = &self.default_title {
            if title.trim().is_empty() {
                return Err("Default title must not be empty".to_string());
            }
        }
        if let Some(language) = &self.default_language {
            if language.trim().is_empty() {
                return Err("Default language must not be empty".to_string());
            }
        }
        Ok(())
    }
}
