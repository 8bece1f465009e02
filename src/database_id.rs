//! Type aliases for database row IDs.

/// The integer row ID used by the SQLite database.
pub type DatabaseId = i64;

/// The row ID of an expense.
pub type ExpenseId = DatabaseId;
