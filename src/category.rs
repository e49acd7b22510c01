//! The category catalog: an operator-edited JSON file listing suggested
//! expense categories.
//!
//! The catalog is advisory only. Stored expenses are never checked against it.

use std::{fs, path::Path};

use crate::Error;

/// The URI clients use to fetch the category catalog.
pub const CATEGORIES_URI: &str = "expense://categories";

/// The content type of the category catalog.
pub const CATEGORIES_MIME_TYPE: &str = "application/json";

/// Read the category catalog at `path`.
///
/// The file is read from disk on every call so edits show up without
/// restarting the server. The contents are returned as-is.
///
/// # Errors
/// Returns [Error::CategoryCatalogUnavailable] if the file is missing or
/// cannot be read as UTF-8 text.
pub fn read_category_catalog(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|error| {
        tracing::error!("could not read category catalog {}: {error}", path.display());
        Error::CategoryCatalogUnavailable(format!("{}: {error}", path.display()))
    })
}
