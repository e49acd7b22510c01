//! Database initialization and connection helpers.

use std::path::Path;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, expense::create_expense_table};

/// Create the tables for the domain models if they do not already exist.
///
/// This function is idempotent, so it is safe to call every time the server
/// starts.
///
/// # Errors
/// Returns an error if the database file cannot be written to or if there is
/// some other SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Open a connection to the SQLite database at `path`.
///
/// The connection is closed when it is dropped, so callers should hold it
/// only for the duration of a single operation.
///
/// # Errors
/// Returns [Error::SqlError] if the database file cannot be opened.
pub fn open_connection(path: &Path) -> Result<Connection, Error> {
    Connection::open(path).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        db::{initialize, open_connection},
        expense::{NewExpense, create_expense},
    };

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialize failed");
        create_expense(NewExpense::new("2024-01-05", 1.0, "Food"), &connection)
            .expect("Could not create expense");
        initialize(&connection).expect("second initialize failed");

        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1, "re-initializing must not drop existing rows");
    }

    #[test]
    fn initialize_on_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expense.db");

        {
            let connection = open_connection(&path).unwrap();
            initialize(&connection).unwrap();
            create_expense(NewExpense::new("2024-01-05", 1.0, "Food"), &connection).unwrap();
        }

        let connection = open_connection(&path).unwrap();
        initialize(&connection).unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let first = create_expense(NewExpense::new("2024-01-05", 1.0, "Food"), &connection).unwrap();
        let second =
            create_expense(NewExpense::new("2024-01-06", 2.0, "Food"), &connection).unwrap();

        // Expenses cannot be deleted through the service, only out-of-band.
        connection
            .execute("DELETE FROM expenses WHERE id = ?1", [second.id])
            .unwrap();
        let third = create_expense(NewExpense::new("2024-01-07", 3.0, "Food"), &connection).unwrap();

        assert!(first.id < second.id);
        assert!(third.id > second.id, "got id {} after deleting {}", third.id, second.id);
    }

    #[test]
    fn open_connection_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does").join("not").join("exist.db");

        let result = open_connection(&path);

        assert!(result.is_err());
    }
}
