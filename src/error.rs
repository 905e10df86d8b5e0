//! Custom error types and result handling for fb2epub operations.
//!
//! Every fallible operation in the crate returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. A broken cover image is deliberately absent here:
//! it is logged and dropped by [`crate::cover`] instead of failing the conversion.
//!
use std::path::PathBuf;

/// Type alias for Results with fb2epub errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all fb2epub operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regular expression parsing errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// ZIP archive errors (reading FB2 archives)
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// EPUB generation errors
    #[error(transparent)]
    Epub(#[from] epub_builder::Error),
    /// Blocking task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::fb2epub::Fb2EpubConfigBuilderError),
    /// The FB2 file or archive to convert does not exist
    #[error("Input not found: {0:?}")]
    InputNotFound(PathBuf),
    /// The FB2 content could not be parsed as XML
    #[error("Failed to parse FB2 document: {0}")]
    Parse(String),
    /// The archive contains no entry eligible for conversion
    #[error("No FB2 entries found in archive {0:?}")]
    NoEligibleEntries(PathBuf),
    /// The EPUB package could not be written to its output path
    #[error("Failed to write EPUB '{0:?}': {1}")]
    Write(PathBuf, String),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for resources that couldn't be found (e.g., target directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
