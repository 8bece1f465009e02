//! Defines the core data model and database queries for expenses.
//!
//! Every query here is scoped to an owner. A caller asking for another
//! user's expense gets [Error::NotFound], the same as for an ID that does
//! not exist, so the two cases cannot be told apart from the outside.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, category::Category, database_id::ExpenseId, user::UserId, validation::ValidatedExpense,
};

// ============================================================================
// MODELS
// ============================================================================

/// A single spending record belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The ID of the user who recorded the expense.
    pub user_id: UserId,
    /// How much money was spent. Always greater than zero.
    pub amount: f64,
    /// The category the expense falls under.
    pub category: Category,
    /// A text description of what the money was spent on.
    pub description: String,
    /// When the money was spent.
    pub date: Date,
}

/// The total amount spent in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category.
    pub category: Category,
    /// The sum of all expense amounts in the category.
    pub total: f64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE
                )",
        (),
    )?;

    // Covering index for the dashboard queries, which always filter by owner
    // and sort or group from there.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Insert a new expense owned by `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_expense(
    validated: &ValidatedExpense,
    user_id: UserId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (user_id, amount, category, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, amount, category, description, date",
        )?
        .query_row(
            (
                user_id.as_i64(),
                validated.amount,
                validated.category,
                &validated.description,
                validated.date,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve the expense with `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, user_id, amount, category, description, date FROM expense
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_expense_row,
        )?;

    Ok(expense)
}

/// Overwrite the amount, category, description, and date of the expense with
/// `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    id: ExpenseId,
    user_id: UserId,
    validated: &ValidatedExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "UPDATE expense
             SET amount = ?1, category = ?2, description = ?3, date = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING id, user_id, amount, category, description, date",
        )?
        .query_row(
            (
                validated.amount,
                validated.category,
                &validated.description,
                validated.date,
                id,
                user_id.as_i64(),
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Delete the expense with `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(id: ExpenseId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM expense WHERE id = :id AND user_id = :user_id",
        &[(":id", &id), (":user_id", &user_id.as_i64())],
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get up to `limit` of the most recent expenses owned by `user_id`.
///
/// Expenses are ordered by date, newest first, with ties broken by insertion
/// order so the most recently recorded entry comes first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_recent_expenses(
    user_id: UserId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, amount, category, description, date FROM expense
             WHERE user_id = :user_id
             ORDER BY date DESC, id DESC
             LIMIT :limit",
        )?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":limit", &(limit as i64))],
            map_expense_row,
        )?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Get the sum of all expense amounts owned by `user_id`, over all time.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn sum_all(user_id: UserId, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense WHERE user_id = :user_id",
            &[(":user_id", &user_id.as_i64())],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the sum of all expense amounts owned by `user_id` dated on or after `start`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn sum_since(user_id: UserId, start: Date, connection: &Connection) -> Result<f64, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense
             WHERE user_id = :user_id AND date >= :start",
        )?
        .query_row(
            rusqlite::named_params! { ":user_id": user_id.as_i64(), ":start": start },
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the total amount spent per category by `user_id`, largest total first.
///
/// Categories with no expenses are not included.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn sum_by_category(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category, SUM(amount) AS total FROM expense
             WHERE user_id = :user_id
             GROUP BY category
             ORDER BY total DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(|error| error.into()))
        .collect()
}

/// Map a database row to an Expense.
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id = row.get(1)?;
    let amount = row.get(2)?;
    let category = row.get(3)?;
    let description = row.get(4)?;
    let date = row.get(5)?;

    Ok(Expense {
        id,
        user_id: UserId::new(raw_user_id),
        amount,
        category,
        description,
        date,
    })
}

// ============================================================================
// TESTS
// ============================================================================
