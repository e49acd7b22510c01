//! Core expense domain types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// A recorded monetary transaction.
///
/// The date is stored as opaque text and compared lexicographically, so it
/// should use a sortable format such as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expense {
    /// The ID assigned by the database. IDs are never reused.
    pub id: ExpenseId,
    /// The date of the expense, e.g. "2024-01-05".
    pub date: String,
    /// The amount spent. There is no currency unit.
    pub amount: f64,
    /// A free-form category name, e.g. "Food".
    pub category: String,
    /// A free-form subcategory name, empty if not given.
    pub subcategory: String,
    /// A free-form note, empty if not given.
    pub note: String,
}

/// An expense that has not been stored yet.
///
/// No validation is performed on any of the fields: negative amounts, empty
/// categories and malformed dates are all stored as given.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct NewExpense {
    /// The date of the expense, e.g. "2024-01-05".
    pub date: String,
    /// The amount spent.
    pub amount: f64,
    /// The category name, e.g. "Food".
    pub category: String,
    /// The subcategory name.
    #[serde(default)]
    pub subcategory: String,
    /// A free-form note.
    #[serde(default)]
    pub note: String,
}

impl NewExpense {
    /// Create an expense with an empty subcategory and note.
    pub fn new(date: &str, amount: f64, category: &str) -> Self {
        Self {
            date: date.to_owned(),
            amount,
            category: category.to_owned(),
            subcategory: String::new(),
            note: String::new(),
        }
    }

    /// Set the subcategory.
    #[cfg(test)]
    pub fn subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = subcategory.to_owned();
        self
    }

    /// Set the note.
    #[cfg(test)]
    pub fn note(mut self, note: &str) -> Self {
        self.note = note.to_owned();
        self
    }
}

/// An inclusive range of dates.
///
/// If `start` sorts after `end` the range is empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct DateRange {
    /// The first date to include, e.g. "2024-01-01".
    #[serde(rename = "start_date")]
    pub start: String,
    /// The last date to include, e.g. "2024-01-31".
    #[serde(rename = "end_date")]
    pub end: String,
}

impl DateRange {
    /// Create a range from `start` to `end`, inclusive.
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_owned(),
            end: end.to_owned(),
        }
    }
}

/// The sum of expense amounts for a single category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of the amounts of the expenses in the category.
    pub total_amount: f64,
}
