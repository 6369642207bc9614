//! Unified error types for seafform.
//!
//! One error enum covers the ODS package layer, the form engine and every
//! storage backend, so callers match on a single type whatever the backend.
use thiserror::Error;

/// Main error type for seafform operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The spreadsheet does not follow the form layout (missing `Data`
    /// sheet, unknown metadata token, duplicate field label, ...)
    #[error("Invalid form schema: {0}")]
    InvalidSchema(String),

    /// An accessor or commit was used before a successful load
    #[error("Form document is not loaded")]
    NotLoaded,

    /// A row index outside the data rows `first..end`
    #[error("Row {row} is outside the data rows {first}..{end}")]
    RowOutOfRange { row: usize, first: usize, end: usize },

    /// Replacing a row of a form that does not allow editing
    #[error("Form does not allow editing existing rows")]
    EditNotAllowed,

    /// The storage backend has no such file or library
    #[error("Not found: {0}")]
    NotFound(String),

    /// The storage backend refused access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The path is malformed or not usable on this backend
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The remote backend needs an authenticated session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Remote backend answered with an unmapped error status
    #[error("Storage backend error {status}: {message}")]
    Backend { status: u16, message: String },

    /// Transport failure while talking to a remote backend
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Configuration file could not be read or understood
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for seafform operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Tag an IO error with the locator it happened on, mapping the kinds the
    /// storage contract names to their dedicated variants.
    pub(crate) fn from_io(err: std::io::Error, locator: impl std::fmt::Debug) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(format!("{:?}", locator)),
            std::io::ErrorKind::PermissionDenied => {
                Error::PermissionDenied(format!("{:?}", locator))
            },
            std::io::ErrorKind::InvalidInput => Error::InvalidPath(format!("{:?}", locator)),
            _ => Error::Io(err),
        }
    }
}
