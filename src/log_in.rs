//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, endpoints,
    auth::{
        DEFAULT_COOKIE_DURATION, NEXT_PARAM, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie,
        normalize_redirect_url, set_auth_cookie,
    },
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner, log_in_register,
        password_input,
    },
    user::{User, get_user_by_username},
};

/// The generic message shown when the username or password is wrong.
///
/// The same message covers both cases so a failed log-in does not reveal
/// whether the username exists.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

fn log_in_form(username: &str, next: Option<&str>, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="username"
                    class=(FORM_LABEL_STYLE)
                {
                    "Username"
                }

                input
                    type="text"
                    name="username"
                    id="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus
                    value=(username);
            }

            (password_input("password", "Password", 0, error_message))

            div class="flex items-center gap-2"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember-me"
                    class="w-4 h-4 rounded border-gray-300 dark:border-gray-600";

                label
                    for="remember-me"
                    class="text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Remember me"
                }
            }

            @if let Some(next) = next
            {
                input type="hidden" name=(NEXT_PARAM) value=(next);
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log In"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "

                a
                    href=(endpoints::REGISTER) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Sign up here"
                }
            }
        }
    }
}

/// The query parameters accepted by the log-in page.
#[derive(Debug, Deserialize)]
pub struct LogInPageParams {
    /// Where to send the user after a successful log-in.
    pub next: Option<String>,
}

/// Display the log-in page.
///
/// A `next` query parameter is carried through the form as a hidden input so
/// the user lands back on the page they originally asked for. Off-site URLs
/// are dropped.
pub async fn get_log_in_page(Query(params): Query<LogInPageParams>) -> Response {
    let next = params
        .next
        .as_deref()
        .and_then(normalize_redirect_url);

    let form = log_in_form("", next.as_deref(), None);
    let content = log_in_register("Log in to your account", &form);
    base("Log In", &[], &content).into_response()
}

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: crate::app_state::create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The username and password are stored as plain strings. There is no need for validation here since
/// they will be compared against the username and password in the database, which have been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,
    /// Password entered during log-in.
    pub password: String,
    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    #[serde(default)]
    pub remember_me: Option<String>,
    /// Where to send the user after a successful log-in.
    #[serde(default)]
    pub next: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the `next` URL from the form, or the dashboard.
/// Otherwise, the form is returned with an error message explaining the problem.
///
/// A nonexistent username and a wrong password produce identical responses
/// apart from the echoed username.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let next = user_data.next.as_deref().and_then(normalize_redirect_url);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let user: User = match get_user_by_username(&user_data.username, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return log_in_error_response(&user_data.username, next.as_deref());
        }
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return internal_log_in_error_response(&user_data.username, next.as_deref());
        }
    };
    drop(connection);

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return internal_log_in_error_response(&user_data.username, next.as_deref());
        }
    };

    if !is_password_valid {
        return log_in_error_response(&user_data.username, next.as_deref());
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let redirect_target = next.unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

    set_auth_cookie(jar.clone(), user.id, cookie_duration)
        .map(|updated_jar| (StatusCode::SEE_OTHER, HxRedirect(redirect_target), updated_jar))
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}

fn log_in_error_response(username: &str, next: Option<&str>) -> Response {
    log_in_form(username, next, Some(INVALID_CREDENTIALS_ERROR_MSG)).into_response()
}

fn internal_log_in_error_response(username: &str, next: Option<&str>) -> Response {
    log_in_form(
        username,
        next,
        Some("An internal error occurred. Please try again later."),
    )
    .into_response()
}


#[cfg(test)]
mod log_in_tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    use axum::{
        Router,
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::SET_COOKIE},
        routing::post,
    };
    use axum_extra::extract::{Form, PrivateCookieJar, cookie::Cookie};
    use axum_htmx::HX_REDIRECT;
    use axum_test::TestServer;

    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash,
        auth::cookie::{COOKIE_EXPIRY, COOKIE_USER_ID},
        endpoints,
        user::{create_user, create_user_table},
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, REMEMBER_ME_COOKIE_DURATION,
        post_log_in,
    };

    fn get_test_state(with_test_user: bool) -> LoginState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");

        create_user_table(&connection).expect("Could not create user table");

        if with_test_user {
            create_user(
                "alice",
                "alice@example.com",
                PasswordHash::new("okon", 4).expect("Could not hash test password"),
                &connection,
            )
            .expect("Could not create test user");
        }

        LoginState::new("foobar", Arc::new(Mutex::new(connection)))
    }

    fn log_in_data(username: &str, password: &str) -> LogInData {
        LogInData {
            username: username.to_string(),
            password: password.to_string(),
            remember_me: None,
            next: None,
        }
    }

    async fn new_log_in_request(state: LoginState, log_in_form: LogInData) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        post_log_in(State(state), jar, Form(log_in_form)).await
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state(true);

        let response = new_log_in_request(state, log_in_data("alice", "okon")).await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
        assert_set_cookie(&response);
    }

    #[tokio::test]
    async fn log_in_redirects_to_next_url() {
        let state = get_test_state(true);
        let mut form = log_in_data("alice", "okon");
        form.next = Some("/edit_expense/3".to_owned());

        let response = new_log_in_request(state, form).await;

        assert_hx_redirect(&response, "/edit_expense/3");
    }

    #[tokio::test]
    async fn log_in_ignores_offsite_next_url() {
        let state = get_test_state(true);
        let mut form = log_in_data("alice", "okon");
        form.next = Some("https://evil.example/".to_owned());

        let response = new_log_in_request(state, form).await;

        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie_through_form() {
        let state = get_test_state(true);
        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in))
            .with_state(state);
        let server = TestServer::new(app);
        let form = [
            ("username", "alice"),
            ("password", "okon"),
            ("remember_me", "on"),
        ];

        let response = server.post(endpoints::LOG_IN).form(&form).await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

        let auth_cookie = response.cookie(COOKIE_USER_ID);
        let want_expiry = OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION;
        assert!(
            (auth_cookie.expires_datetime().unwrap() - want_expiry).abs() < Duration::seconds(2),
            "got expiry {:?}, want about {:?}",
            auth_cookie.expires_datetime(),
            want_expiry
        );
    }

    #[tokio::test]
    async fn form_deserialises_without_remember_me() {
        let state = get_test_state(false);
        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in))
            .with_state(state);
        let server = TestServer::new(app);
        let form = [("username", "alice"), ("password", "test")];

        let response = server.post(endpoints::LOG_IN).form(&form).await;

        assert_ne!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let state = get_test_state(false);

        let response = new_log_in_request(state, log_in_data("nobody", "test")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, INVALID_CREDENTIALS_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let state = get_test_state(true);

        let response = new_log_in_request(state, log_in_data("alice", "wrongpassword")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_body_contains_message(response, INVALID_CREDENTIALS_ERROR_MSG).await;
    }

    #[tokio::test]
    async fn unknown_username_and_wrong_password_responses_are_identical() {
        let state = get_test_state(true);

        let unknown_username =
            new_log_in_request(state.clone(), log_in_data("nobody", "okon")).await;
        let wrong_password =
            new_log_in_request(state, log_in_data("alice", "wrongpassword")).await;

        assert_eq!(unknown_username.status(), wrong_password.status());
        // The only permitted difference is the echoed username.
        let unknown_body = body_text(unknown_username).await.replace("nobody", "USER");
        let wrong_body = body_text(wrong_password).await.replace("alice", "USER");
        assert_eq!(unknown_body, wrong_body);
    }

    async fn body_text(response: Response<Body>) -> String {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

        String::from_utf8_lossy(&body).to_string()
    }

    #[track_caller]
    fn assert_hx_redirect(response: &Response<Body>, want_location: &str) {
        let redirect_location = response.headers().get(HX_REDIRECT).unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location, want_location);
    }

    #[track_caller]
    fn assert_set_cookie(response: &Response<Body>) {
        let mut found_cookies = HashSet::new();

        for cookie_headers in response.headers().get_all(SET_COOKIE) {
            let cookie_string = cookie_headers.to_str().unwrap();
            let cookie = Cookie::parse(cookie_string).unwrap();

            match cookie.name() {
                COOKIE_USER_ID | COOKIE_EXPIRY => {
                    assert!(cookie.expires_datetime() > Some(OffsetDateTime::now_utc()));
                    found_cookies.insert(cookie.name().to_string());
                }
                _ => panic!("Unexpected cookie found: {}", cookie.name()),
            }
        }

        assert!(
            found_cookies.contains(COOKIE_USER_ID),
            "could not find cookie '{}' in {:?}",
            COOKIE_USER_ID,
            found_cookies
        );

        assert!(
            found_cookies.contains(COOKIE_EXPIRY),
            "could not find cookie '{}' in {:?}",
            COOKIE_EXPIRY,
            found_cookies
        );
    }

    async fn assert_body_contains_message(response: Response<Body>, message: &str) {
        let text = body_text(response).await;

        assert!(
            text.contains(message),
            "response body should contain the text '{}' but got {}",
            message,
            text
        );
    }
}
