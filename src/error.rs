//! Defines the app level error type.

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An unhandled/unexpected SQL error.
    ///
    /// This covers I/O failures in the underlying database file, e.g., the
    /// file is locked, the disk is full or permission was denied.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// The category catalog file could not be read.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not read the category catalog: {0}")]
    CategoryCatalogUnavailable(String),

    /// The total for a category overflowed to infinity or is not a number,
    /// so it cannot be sent to clients as JSON.
    ///
    /// Holds the name of the category.
    #[error("the total for category \"{0}\" is not a finite number")]
    NonFiniteTotal(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The MCP transport failed to start or stopped unexpectedly.
    ///
    /// Callers should pass in the original error as a string.
    #[error("the MCP transport failed: {0}")]
    TransportError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}
