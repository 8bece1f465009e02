//! The page and endpoint for recording a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses a missing optional field as
// None instead of rejecting the request like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::Markup;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, endpoints,
    expense::core::create_expense,
    expense::form::{ExpenseFormValues, expense_form},
    html::{PAGE_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    timezone::get_local_offset,
    user::UserId,
    validation::{DATE_FORMAT, ExpenseErrors, validate_expense},
};

/// The state needed to record a new expense.
#[derive(Clone)]
pub struct AddExpenseState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for storing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AddExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw form data for creating or editing an expense.
///
/// Fields are strings so the validation layer can report every problem at
/// once instead of failing at deserialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseFormData {
    pub amount: String,
    pub category: String,
    pub description: String,
    /// A missing date means "use today". An empty string is a validation error.
    #[serde(default)]
    pub date: Option<String>,
}

impl ExpenseFormData {
    pub(crate) fn into_form_values(self) -> ExpenseFormValues {
        ExpenseFormValues {
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date.unwrap_or_default(),
        }
    }
}

fn render_page(title: &str, active_endpoint: &str, form: Markup) -> Response {
    let nav_bar = NavBar::new(active_endpoint).into_html();
    let content = maud::html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { (title) }

            (form)
        }
    };

    base(title, &[dollar_input_styles()], &content).into_response()
}

/// Get today's date in the configured local timezone.
pub(crate) fn local_today(local_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(local_timezone)
        .ok_or_else(|| Error::InvalidTimezone(local_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

/// Renders the page for recording a new expense.
///
/// The date field is filled in with today's date in the local timezone.
pub async fn get_add_expense_page(State(state): State<AddExpenseState>) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_response(),
    };

    let values = ExpenseFormValues {
        date: today.format(DATE_FORMAT).unwrap_or_default(),
        ..Default::default()
    };
    let form = expense_form(
        endpoints::ADD_EXPENSE,
        "Add Expense",
        &values,
        &ExpenseErrors::default(),
    );

    render_page("Add Expense", endpoints::ADD_EXPENSE, form)
}

/// A route handler for recording a new expense, redirects to the dashboard
/// on success.
///
/// Validation failures re-render the form fragment with the errors attached
/// to the offending fields and the submitted values echoed back.
pub async fn post_add_expense(
    State(state): State<AddExpenseState>,
    Extension(user_id): Extension<UserId>,
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
                endpoints::ADD_EXPENSE,
                "Add Expense",
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

    match create_expense(&validated, user_id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not create expense: {error}");
            error.into_response()
        }
    }
}
