//! Expense recording, listing and per-category summaries.

mod db;
mod domain;

pub use db::{create_expense, create_expense_table, get_expenses_in_range, summarize_expenses};
pub use domain::{CategoryTotal, DateRange, Expense, ExpenseId, NewExpense};
