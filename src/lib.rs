//! fb2epub - FictionBook to EPUB Conversion Library
//!
//! This crate converts FB2 (FictionBook 2) e-books into EPUB packages, either one
//! file at a time or for every `.fb2` entry of a ZIP archive.
//!
//! # Getting Started
//!
//! Configure a conversion with `Fb2EpubConfig::builder()`, then call
//! `convert_file` or `convert_archive`.
//!
//! ```rust,no_run
//! use fb2epub::prelude::*;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> fb2epub::error::Result<()> {
//!     let config = Fb2EpubConfig::builder()
//!         .target_path(PathBuf::from("./converted_ebooks"))
//!         .create_output_directory(true)
//!         .build()?;
//!
//!     // Optional: validate the configuration before converting
//!     config.preflight_check(ExecutionMode::Archive)?;
//!
//!     let single = config.convert_file("./library/novel.fb2").await?;
//!     println!("Created {:?}", single);
//!
//!     let batch = config.convert_archive("./library/collection.zip").await?;
//!     println!("Created {} books", batch.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! The pipeline is also usable synchronously: [`generator::assemble_package`]
//! turns FB2 bytes into an in-memory [`EpubPackage`], and
//! [`generator::epub::EpubWriter`] serializes it.

pub mod archive;
pub mod chapters;
pub mod cover;
pub mod document;
pub mod error;
pub mod fb2epub;
pub mod formatter;
pub mod generator;
pub mod metadata;
pub mod path_utils;
pub mod types;

pub use fb2epub::Fb2EpubConfig;
pub use fb2epub::Fb2EpubConfigBuilder;

// Re-export error and core types for direct access
pub use types::{
    Annotation, BookMetadata, BookReport, Chapter, CoverImage, EpubPackage, EpubVersion,
    ExecutionMode, SpineItem, TocLink,
};

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types, so a single
/// `use fb2epub::prelude::*;` is enough for typical use.
pub mod prelude {
    pub use super::{
        BookMetadata, BookReport, Chapter, EpubPackage, EpubVersion, ExecutionMode,
        Fb2EpubConfig, Fb2EpubConfigBuilder, SpineItem, TocLink, error, generator, types,
    };
    pub use crate::generator::epub::EpubWriter;
    pub use crate::generator::{Generator, PackageOptions, assemble_package};
    pub use std::path::{Path, PathBuf};
}
