//! Database operations for expenses.

use rusqlite::{Connection, Row, ToSql};

use crate::{
    Error,
    expense::{CategoryTotal, DateRange, Expense, NewExpense},
};

/// Store a new expense and return it with its generated ID.
///
/// # Errors
/// Returns [Error::SqlError] if the insert fails, e.g., the database file is
/// locked or read-only.
pub fn create_expense(expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    connection.execute(
        "INSERT INTO expenses (date, amount, category, subcategory, note) \
        VALUES (?1, ?2, ?3, ?4, ?5);",
        (
            &expense.date,
            expense.amount,
            &expense.category,
            &expense.subcategory,
            &expense.note,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Expense {
        id,
        date: expense.date,
        amount: expense.amount,
        category: expense.category,
        subcategory: expense.subcategory,
        note: expense.note,
    })
}

/// Get the expenses whose date falls within `date_range`, in the order they
/// were created.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - SQL query preparation or execution fails
/// - Expense row mapping fails
pub fn get_expenses_in_range(
    date_range: &DateRange,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, date, amount, category, subcategory, note FROM expenses \
            WHERE date BETWEEN ?1 AND ?2 \
            ORDER BY id ASC;",
        )?
        .query_map((&date_range.start, &date_range.end), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::SqlError))
        .collect()
}

/// Sum the amounts of the expenses in `date_range`, grouped by category and
/// sorted by category name.
///
/// If `category` is given and not empty, only expenses with exactly that
/// category are included. Categories without any expenses in the range are
/// left out rather than reported as zero.
///
/// # Errors
/// Returns:
/// - [Error::SqlError] if SQL query preparation or execution fails
/// - [Error::NonFiniteTotal] if a category's amounts add up to more than
///   `f64` can hold
pub fn summarize_expenses(
    date_range: &DateRange,
    category: Option<&str>,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    let category = category.filter(|category| !category.is_empty());

    let mut query = String::from(
        "SELECT category, SUM(amount) AS total_amount FROM expenses \
        WHERE date BETWEEN ?1 AND ?2",
    );
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(3);
    params.push(&date_range.start);
    params.push(&date_range.end);

    if let Some(category) = category.as_ref() {
        query.push_str(" AND category = ?3");
        params.push(category);
    }

    query.push_str(" GROUP BY category ORDER BY category ASC;");

    let totals = connection
        .prepare(&query)?
        .query_map(params.as_slice(), |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total_amount: row.get(1)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    // JSON has no representation for infinity, serde_json would send null.
    if let Some(total) = totals.iter().find(|total| !total.total_amount.is_finite()) {
        tracing::error!(
            "total for category \"{}\" is {}",
            total.category,
            total.total_amount
        );
        return Err(Error::NonFiniteTotal(total.category.clone()));
    }

    Ok(totals)
}

/// Initialize the expense table.
///
/// `AUTOINCREMENT` stops SQLite from handing out the ID of a deleted row
/// again.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT ''
        );",
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        subcategory: row.get(4)?,
        note: row.get(5)?,
    })
}


#[cfg(test)]
mod get_expenses_in_range_tests {
    use rusqlite::Connection;

    use crate::expense::{DateRange, NewExpense, create_expense, get_expenses_in_range};

    use super::create_expense_table;

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_expense_table(&connection).expect("Could not create expense table");
        connection
    }

    #[test]
    fn range_includes_both_bounds() {
        let connection = get_test_db_connection();
        for date in ["2023-12-31", "2024-01-01", "2024-01-15", "2024-01-31", "2024-02-01"] {
            create_expense(NewExpense::new(date, 1.0, "Food"), &connection).unwrap();
        }

        let got = get_expenses_in_range(&DateRange::new("2024-01-01", "2024-01-31"), &connection)
            .unwrap();

        let dates: Vec<&str> = got.iter().map(|expense| expense.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-15", "2024-01-31"]);
    }

    #[test]
    fn orders_by_insertion_not_date() {
        let connection = get_test_db_connection();
        let a = create_expense(NewExpense::new("2024-01-10", 1.0, "A"), &connection).unwrap();
        let b = create_expense(NewExpense::new("2024-01-10", 2.0, "B"), &connection).unwrap();
        let c = create_expense(NewExpense::new("2024-01-02", 3.0, "C"), &connection).unwrap();

        let got = get_expenses_in_range(&DateRange::new("2024-01-01", "2024-01-31"), &connection)
            .unwrap();

        assert_eq!(got, vec![a, b, c]);
    }

    #[test]
    fn empty_range_returns_no_rows() {
        let connection = get_test_db_connection();
        create_expense(NewExpense::new("2024-01-10", 1.0, "Food"), &connection).unwrap();

        let got = get_expenses_in_range(&DateRange::new("2025-01-01", "2025-12-31"), &connection)
            .unwrap();

        assert!(got.is_empty(), "want no expenses, got {got:?}");
    }

    #[test]
    fn reversed_range_returns_no_rows() {
        let connection = get_test_db_connection();
        create_expense(NewExpense::new("2024-01-10", 1.0, "Food"), &connection).unwrap();

        let got = get_expenses_in_range(&DateRange::new("2024-01-31", "2024-01-01"), &connection)
            .unwrap();

        assert!(got.is_empty(), "want no expenses, got {got:?}");
    }
}
