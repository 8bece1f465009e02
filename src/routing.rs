//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{anonymous_guard, auth_guard, auth_guard_hx},
    dashboard::get_dashboard_page,
    endpoints,
    expense::{
        get_add_expense_page, get_edit_expense_page, post_add_expense, post_delete_expense,
        post_edit_expense,
    },
    internal_server_error::get_internal_server_error_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    register_user::{get_register_page, register_user},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    // The log-in and registration pages only make sense when logged out.
    let anonymous_routes = Router::new()
        .route(endpoints::REGISTER, get(get_register_page).post(register_user))
        .route(endpoints::LOG_IN, get(get_log_in_page).post(post_log_in))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            anonymous_guard,
        ));

    // Log-out only replaces the auth cookies with expired ones and redirects,
    // so it works the same with or without a live session and needs no guard.
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_pages = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ADD_EXPENSE, get(get_add_expense_page))
        .route(endpoints::EDIT_EXPENSE, get(get_edit_expense_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST routes need to use the HX-Redirect header for auth redirects
    // to work properly for HTMX requests.
    let protected_endpoints = Router::new()
        .route(endpoints::ADD_EXPENSE, post(post_add_expense))
        .route(endpoints::EDIT_EXPENSE, post(post_edit_expense))
        .route(endpoints::DELETE_EXPENSE, post(post_delete_expense))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx));

    protected_pages
        .merge(protected_endpoints)
        .merge(anonymous_routes)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}
