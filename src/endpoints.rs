//! The application's endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/edit_expense/{expense_id}',
//! use [format_endpoint].

/// The dashboard, the landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/";
/// The page and form handler for creating an account.
pub const REGISTER: &str = "/register";
/// The page and form handler for logging in.
pub const LOG_IN: &str = "/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The page and form handler for creating an expense.
pub const ADD_EXPENSE: &str = "/add_expense";
/// The page and form handler for editing an existing expense.
pub const EDIT_EXPENSE: &str = "/edit_expense/{expense_id}";
/// The route for deleting an expense.
pub const DELETE_EXPENSE: &str = "/delete_expense/{expense_id}";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/edit_expense/{expense_id}',
/// '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
