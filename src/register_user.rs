//! The registration page and endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner, log_in_register,
        password_input,
    },
    internal_server_error::InternalServerError,
    user::create_user,
    validation::{
        PASSWORD_MIN_LENGTH, RegistrationErrors, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
        validate_registration,
    },
};

fn text_input(
    name: &str,
    label: &str,
    input_type: &str,
    value: &str,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label
                for=(name)
                class=(FORM_LABEL_STYLE)
            {
                (label)
            }

            input
                type=(input_type)
                name=(name)
                id=(name)
                class=(FORM_TEXT_INPUT_STYLE)
                required
                value=(value)
                minlength=[(name == "username").then_some(USERNAME_MIN_LENGTH)]
                maxlength=[(name == "username").then_some(USERNAME_MAX_LENGTH)]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(
    username: &str,
    email: &str,
    errors: &RegistrationErrors,
    form_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(form_error_message) = form_error_message
            {
                p class="text-red-500 text-base" { (form_error_message) }
            }

            (text_input("username", "Username", "text", username, errors.username_error.as_deref()))
            (text_input("email", "Email", "email", email, errors.email_error.as_deref()))
            (password_input("password", "Password", PASSWORD_MIN_LENGTH as u8, errors.password_error.as_deref()))
            (password_input("confirm_password", "Confirm Password", PASSWORD_MIN_LENGTH as u8, errors.confirm_password_error.as_deref()))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Sign Up"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", &RegistrationErrors::default(), None);
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Clone)]
pub struct RegistrationState {
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an account.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// A route handler for creating a new account, redirects to the log-in page
/// on success.
///
/// Validation failures and username or email collisions re-render the form
/// fragment with the errors attached to the offending fields. A collision is
/// reported as a single combined message so the response does not reveal
/// which of the two fields is already taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(errors) = validate_registration(
        &form.username,
        &form.email,
        &form.password,
        &form.confirm_password,
    ) {
        return registration_form(&form.username, &form.email, &errors, None).into_response();
    }

    let password_hash = match PasswordHash::new(&form.password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return InternalServerError::default().into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_user(&form.username, &form.email, password_hash, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::LOG_IN.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateUser) => registration_form(
            &form.username,
            &form.email,
            &RegistrationErrors::default(),
            Some("That username or email is already registered."),
        )
        .into_response(),
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            InternalServerError::default().into_response()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::{
        body::Body,
        http::{Response, StatusCode, header::CONTENT_TYPE},
    };
    use scraper::Html;

    use crate::{endpoints, register_user::get_register_page};

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let document = parse_html(response).await;
        assert_valid_html(&document);

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();
        let hx_post = form.value().attr("hx-post");
        assert_eq!(
            hx_post,
            Some(endpoints::REGISTER),
            "want form with attribute hx-post=\"{}\", got {:?}",
            endpoints::REGISTER,
            hx_post
        );

        struct FormInput {
            type_: &'static str,
            id: &'static str,
        }

        let want_form_inputs: Vec<FormInput> = vec![
            FormInput {
                type_: "text",
                id: "username",
            },
            FormInput {
                type_: "email",
                id: "email",
            },
            FormInput {
                type_: "password",
                id: "password",
            },
            FormInput {
                type_: "password",
                id: "confirm_password",
            },
        ];

        for FormInput { type_, id } in want_form_inputs {
            let selector_string = format!("input[type={type_}]#{id}");
            let input_selector = scraper::Selector::parse(&selector_string).unwrap();
            let inputs = form.select(&input_selector).collect::<Vec<_>>();
            assert_eq!(inputs.len(), 1, "want 1 {type_} input, got {}", inputs.len());
        }

        let log_in_link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links = form.select(&log_in_link_selector).collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        let link = links.first().unwrap();
        assert_eq!(
            link.value().attr("href"),
            Some(endpoints::LOG_IN),
            "want link to {}, got {:?}",
            endpoints::LOG_IN,
            link.value().attr("href")
        );
    }

    async fn parse_html(response: Response<Body>) -> scraper::Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        scraper::Html::parse_document(&text)
    }

    #[track_caller]
    fn assert_valid_html(html: &Html) {
        assert!(
            html.errors.is_empty(),
            "Got HTML parsing errors: {:?}",
            html.errors
        );
    }
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        body::Body,
        http::{Response, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        endpoints,
        register_user::{RegisterForm, register_user},
        user::{create_user_table, get_user_by_username},
    };

    use super::RegistrationState;

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        RegistrationState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::REGISTER, post(register_user))
            .with_state(state);

        TestServer::new(app)
    }

    fn valid_form() -> RegisterForm {
        RegisterForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
    }

    #[tokio::test]
    async fn register_succeeds_and_stores_hashed_password() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        server
            .post(endpoints::REGISTER)
            .form(&valid_form())
            .await
            .assert_status_see_other();

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_username("alice", &connection).expect("user should exist");
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(
            user.password_hash.to_string(),
            "hunter22",
            "the raw password must not be stored"
        );
        assert!(user.password_hash.verify("hunter22").unwrap());
    }

    #[tokio::test]
    async fn register_fails_with_invalid_fields() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::REGISTER)
            .form(&RegisterForm {
                username: "abc".to_string(),
                email: "not-an-email".to_string(),
                password: "short".to_string(),
                confirm_password: "different".to_string(),
            })
            .await
            .text();

        let fragment = parse_html(response.into_response()).await;

        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(
            paragraphs.len(),
            4,
            "want one error per field, got {}",
            paragraphs.len()
        );
    }

    #[tokio::test]
    async fn duplicate_username_and_email_get_the_same_message() {
        let server = get_test_server(get_test_state());
        server
            .post(endpoints::REGISTER)
            .form(&valid_form())
            .await
            .assert_status_see_other();

        let username_collision = server
            .post(endpoints::REGISTER)
            .form(&RegisterForm {
                email: "different@example.com".to_string(),
                ..valid_form()
            })
            .await;
        let email_collision = server
            .post(endpoints::REGISTER)
            .form(&RegisterForm {
                username: "bobby".to_string(),
                ..valid_form()
            })
            .await;

        assert_eq!(username_collision.status_code(), StatusCode::OK);
        assert_eq!(email_collision.status_code(), StatusCode::OK);

        let username_message = extract_error_message(username_collision.text()).await;
        let email_message = extract_error_message(email_collision.text()).await;

        assert_eq!(
            username_message, email_message,
            "both collisions must produce the same message"
        );
        assert!(
            username_message.contains("already registered"),
            "'{username_message}' does not contain the text 'already registered'"
        );
    }

    async fn extract_error_message(body: String) -> String {
        let fragment = parse_html(body.into_response()).await;
        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());

        paragraphs.first().unwrap().text().collect::<String>()
    }

    async fn parse_html(response: Response<Body>) -> scraper::Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        scraper::Html::parse_fragment(&text)
    }
}
