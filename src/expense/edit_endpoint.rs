//! The page and endpoint for editing an existing expense.
//!
//! Expenses belonging to another account are reported as not found so the
//! response does not reveal whether the expense exists at all.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::ExpenseId,
    endpoints::{self, format_endpoint},
    expense::add_endpoint::{ExpenseFormData, local_today},
    expense::core::{Expense, get_expense, update_expense},
    expense::form::{ExpenseFormValues, expense_form},
    html::{PAGE_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    not_found::get_404_not_found_response,
    user::UserId,
    validation::{DATE_FORMAT, ExpenseErrors, validate_expense},
};

/// The state needed to edit an existing expense.
#[derive(Clone)]
pub struct EditExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for updating expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

fn form_values_for(expense: &Expense) -> ExpenseFormValues {
    ExpenseFormValues {
        amount: format!("{:.2}", expense.amount),
        category: expense.category.as_str().to_owned(),
        description: expense.description.clone(),
        date: expense.date.format(DATE_FORMAT).unwrap_or_default(),
    }
}

fn render_edit_page(expense_id: ExpenseId, values: &ExpenseFormValues) -> Response {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let form = expense_form(
        &format_endpoint(endpoints::EDIT_EXPENSE, expense_id),
        "Save Changes",
        values,
        &ExpenseErrors::default(),
    );
    let content = maud::html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Edit Expense" }

            (form)
        }
    };

    base("Edit Expense", &[dollar_input_styles()], &content).into_response()
}

/// Renders the page for editing an expense with the stored values filled in.
///
/// Responds with the 404 page when the expense does not exist or belongs to
/// another account.
pub async fn get_edit_expense_page(
    State(state): State<EditExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_expense(expense_id, user_id, &connection) {
        Ok(expense) => render_edit_page(expense_id, &form_values_for(&expense)),
        Err(Error::NotFound) => get_404_not_found_response(),
        Err(error) => {
            tracing::error!("Could not fetch expense {expense_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for saving changes to an expense, redirects to the
/// dashboard on success.
pub async fn post_edit_expense(
    State(state): State<EditExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<ExpenseFormData>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let validated = match validate_expense(
        &form.amount,
        &form.category,
        &form.description,
        form.date.as_deref(),
        today,
    ) {
        Ok(validated) => validated,
        Err(errors) => {
            return expense_form(
                &format_endpoint(endpoints::EDIT_EXPENSE, expense_id),
                "Save Changes",
                &form.into_form_values(),
                &errors,
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_expense(expense_id, user_id, &validated, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::NotFound) => get_404_not_found_response(),
        Err(error) => {
            tracing::error!("Could not update expense {expense_id}: {error}");
            error.into_response()
        }
    }
}
