//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{Method, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// How much of a request or response body is logged at the `info` level.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Form fields whose values must never appear in the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Log the request and response for each request.
///
/// Both are logged at the `info` level, with bodies longer than
/// [LOG_BODY_LENGTH_LIMIT] bytes truncated and logged in full at the `debug`
/// level. Password fields in form submissions are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let is_form_post = request.method() == Method::POST
        && request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();

    if is_form_post {
        let display_text = REDACTED_FIELDS
            .iter()
            .fold(body_text.clone(), |text, field| redact_field(&text, field));
        log_request(&parts, &display_text);
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes).to_string();
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the value of `field_name` in a URL-encoded form body with asterisks.
fn redact_field(form_text: &str, field_name: &str) -> String {
    let field_prefix = format!("{field_name}=");
    let start = match form_text.find(&field_prefix) {
        Some(position) => position,
        None => return form_text.to_string(),
    };

    let end = form_text[start..]
        .find('&')
        .map(|offset| start + offset)
        .unwrap_or(form_text.len());

    let mut redacted = form_text.to_string();
    redacted.replace_range(start..end, &format!("{field_prefix}********"));
    redacted
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {parts:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {parts:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {parts:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redaction_tests {
    use super::redact_field;

    #[test]
    fn redacts_field_in_middle_of_form() {
        let form = "username=alice&password=hunter2&remember_me=on";

        let redacted = redact_field(form, "password");

        assert_eq!(redacted, "username=alice&password=********&remember_me=on");
    }

    #[test]
    fn redacts_field_at_end_of_form() {
        let form = "username=alice&password=hunter2";

        let redacted = redact_field(form, "password");

        assert_eq!(redacted, "username=alice&password=********");
    }

    #[test]
    fn leaves_form_without_field_unchanged() {
        let form = "username=alice&remember_me=on";

        let redacted = redact_field(form, "password");

        assert_eq!(redacted, form);
    }

    #[test]
    fn redacts_both_password_fields() {
        let form = "password=hunter2&confirm_password=hunter2";

        let redacted = super::REDACTED_FIELDS
            .iter()
            .fold(form.to_string(), |text, field| redact_field(&text, field));

        assert!(!redacted.contains("hunter2"), "got {redacted}");
    }
}
