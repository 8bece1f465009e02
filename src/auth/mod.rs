//! User authentication: password hashing, auth cookies, and route guards.

pub(crate) mod cookie;
mod middleware;
mod password;
mod redirect;

pub(crate) use cookie::{
    DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie,
};
pub(crate) use middleware::{AuthState, anonymous_guard, auth_guard, auth_guard_hx};
pub use password::PasswordHash;
pub(crate) use redirect::{NEXT_PARAM, build_log_in_redirect_url, normalize_redirect_url};
