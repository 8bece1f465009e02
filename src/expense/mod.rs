//! Expense records and the pages and endpoints for managing them.

mod add_endpoint;
mod core;
mod delete_endpoint;
mod edit_endpoint;
mod form;

pub use add_endpoint::{AddExpenseState, get_add_expense_page, post_add_expense};
pub use core::{
    CategoryTotal, Expense, create_expense_table, get_recent_expenses, sum_all, sum_by_category,
    sum_since,
};
pub use delete_endpoint::{DeleteExpenseState, post_delete_expense};
pub use edit_endpoint::{EditExpenseState, get_edit_expense_page, post_edit_expense};

#[cfg(test)]
pub use core::{create_expense, delete_expense, get_expense, update_expense};
