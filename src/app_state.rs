//! Implements a struct that holds the state of the RPC server.

use std::path::{Path, PathBuf};

use crate::{Error, db::initialize, db::open_connection};

/// The state of the RPC server.
///
/// Only file paths are shared between requests. Each request opens its own
/// database connection.
#[derive(Debug, Clone)]
pub struct AppState {
    /// File path to the SQLite database that holds the expenses.
    pub db_path: PathBuf,

    /// File path to the JSON category catalog.
    pub categories_path: PathBuf,
}

impl AppState {
    /// Create a new [AppState].
    ///
    /// This function will initialize the database at `db_path` by adding the
    /// tables for the domain models if they do not exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: &Path, categories_path: &Path) -> Result<Self, Error> {
        let connection = open_connection(db_path)?;
        initialize(&connection)?;

        Ok(Self {
            db_path: db_path.to_owned(),
            categories_path: categories_path.to_owned(),
        })
    }
}
