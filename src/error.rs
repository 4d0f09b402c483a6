//! Error types for folio operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while turning a document into pages.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Could not open document container: {0}")]
    Container(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl From<zip::result::ZipError> for ParseError {
    fn from(err: zip::result::ZipError) -> Self {
        ParseError::Container(err.to_string())
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        ParseError::MalformedDocument(err.to_string())
    }
}

/// Errors surfaced by the page store, search, and the library API.
///
/// The `Display` output is the human-readable message handed back to callers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient permissions: {0}")]
    Permission(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Storage error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
