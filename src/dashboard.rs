//! The dashboard page, an overview of the logged in user's spending.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    endpoints::{self, format_endpoint},
    expense::{
        CategoryTotal, Expense, get_recent_expenses, sum_all, sum_by_category, sum_since,
    },
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::get_local_offset,
    user::{UserId, get_user_by_id},
};

/// The number of expenses shown in the recent expenses table.
const RECENT_EXPENSE_COUNT: u32 = 10;

/// The state needed for displaying the dashboard page.
#[derive(Clone)]
pub struct DashboardState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display a page with an overview of the user's spending.
///
/// Shows the lifetime and month-to-date totals, the ten most recent expenses
/// and a breakdown of spending by category.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let offset = get_local_offset(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezone(state.local_timezone.clone()))?;
    let today = time::OffsetDateTime::now_utc().to_offset(offset).date();

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not fetch user {user_id}: {error}"))?;

    let recent_expenses = get_recent_expenses(user_id, RECENT_EXPENSE_COUNT, &connection)?;
    let lifetime_total = sum_all(user_id, &connection)?;
    let month_to_date = sum_since(user_id, month_start(today), &connection)?;
    let category_totals = sum_by_category(user_id, &connection)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold mb-4" { "Hello, " (user.username) "!" }

            (totals_view(lifetime_total, month_to_date))

            @if recent_expenses.is_empty()
            {
                (no_expenses_view())
            }
            @else
            {
                (recent_expenses_table(&recent_expenses))
                (category_totals_table(&category_totals))
            }
        }
    };

    Ok(base("Dashboard", &[], &content).into_response())
}

/// The first day of the month containing `date`.
fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

fn totals_view(lifetime_total: f64, month_to_date: f64) -> Markup {
    html! {
        section class="grid grid-cols-1 sm:grid-cols-2 gap-4 w-full mb-8"
        {
            (total_card("This Month", month_to_date))
            (total_card("All Time", lifetime_total))
        }
    }
}

fn total_card(label: &str, amount: f64) -> Markup {
    html! {
        div class="bg-white dark:bg-gray-800 border border-gray-200 dark:border-gray-700
            rounded-lg p-4 shadow-md"
        {
            h3 class="text-xl font-semibold" { (label) }
            p class="text-3xl font-bold mt-2" { (format_currency(amount)) }
        }
    }
}

fn no_expenses_view() -> Markup {
    html! {
        section class="text-center mt-8"
        {
            p class="text-gray-600 dark:text-gray-400 mb-4"
            {
                "No expenses yet. Record your first one to see it here."
            }
            a href=(endpoints::ADD_EXPENSE) class=(LINK_STYLE) { "Add an expense" }
        }
    }
}

fn recent_expenses_table(expenses: &[Expense]) -> Markup {
    html! {
        section class="w-full mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "Recent Expenses" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }
                    tbody
                    {
                        @for expense in expenses
                        {
                            (expense_row(expense))
                        }
                    }
                }
            }
        }
    }
}

fn expense_row(expense: &Expense) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (expense.date) }
            td class=(TABLE_CELL_STYLE) { (expense.description) }
            td class=(TABLE_CELL_STYLE) { (expense.category.label()) }
            td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a
                        href=(format_endpoint(endpoints::EDIT_EXPENSE, expense.id))
                        class=(LINK_STYLE)
                    {
                        "Edit"
                    }

                    button
                        type="button"
                        class=(BUTTON_DELETE_STYLE)
                        hx-post=(format_endpoint(endpoints::DELETE_EXPENSE, expense.id))
                        hx-confirm="Delete this expense?"
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}

fn category_totals_table(category_totals: &[CategoryTotal]) -> Markup {
    html! {
        section class="w-full mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "Spending by Category" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                        }
                    }
                    tbody
                    {
                        @for category_total in category_totals
                        {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (category_total.category.label()) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (format_currency(category_total.total))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
