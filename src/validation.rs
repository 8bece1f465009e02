//! Pure validation routines for the registration and expense forms.
//!
//! Each routine checks every field and reports all failures together so the
//! form can highlight every invalid field in one round trip, rather than
//! stopping at the first bad field.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::category::Category;

/// The minimum number of characters for a username.
pub const USERNAME_MIN_LENGTH: usize = 4;
/// The maximum number of characters for a username.
pub const USERNAME_MAX_LENGTH: usize = 20;
/// The minimum number of characters for a password.
pub const PASSWORD_MIN_LENGTH: usize = 6;
/// The maximum number of characters for an expense description.
pub const DESCRIPTION_MAX_LENGTH: usize = 200;

/// The date format used by HTML date inputs and for dates stored in the database.
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The validation errors for the registration form. Each field gets its own
/// message so the form can mark the offending inputs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegistrationErrors {
    pub username_error: Option<String>,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    pub confirm_password_error: Option<String>,
}

impl RegistrationErrors {
    fn is_empty(&self) -> bool {
        self.username_error.is_none()
            && self.email_error.is_none()
            && self.password_error.is_none()
            && self.confirm_password_error.is_none()
    }
}

/// Check the raw registration form fields.
///
/// Uniqueness of the username and email is not checked here, that happens
/// against the database when the user record is inserted.
///
/// # Errors
///
/// Returns a [RegistrationErrors] carrying a message for every invalid field.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), RegistrationErrors> {
    let mut errors = RegistrationErrors::default();

    let username_length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&username_length) {
        errors.username_error = Some(format!(
            "Username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters."
        ));
    }

    if !is_plausible_email(email) {
        errors.email_error = Some("Enter a valid email address.".to_owned());
    }

    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.password_error = Some(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters."
        ));
    }

    if confirm_password != password {
        errors.confirm_password_error = Some("Passwords must match.".to_owned());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// A loose shape check, not a full RFC 5322 parse. The address must have a
/// single "@" with a non-empty local part and a domain containing a dot.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// The expense form fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedExpense {
    pub amount: f64,
    pub category: Category,
    pub description: String,
    pub date: Date,
}

/// The validation errors for the expense form. Each field gets its own
/// message so the form can mark the offending inputs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenseErrors {
    pub amount_error: Option<String>,
    pub category_error: Option<String>,
    pub description_error: Option<String>,
    pub date_error: Option<String>,
}

impl ExpenseErrors {
    fn is_empty(&self) -> bool {
        self.amount_error.is_none()
            && self.category_error.is_none()
            && self.description_error.is_none()
            && self.date_error.is_none()
    }
}

/// Check the raw expense form fields and parse them into their domain types.
///
/// A `date` of `None` means the field was omitted and defaults to `today`.
/// An empty string means the field was submitted blank, which is an error.
///
/// # Errors
///
/// Returns an [ExpenseErrors] carrying a message for every invalid field.
pub fn validate_expense(
    amount: &str,
    category: &str,
    description: &str,
    date: Option<&str>,
    today: Date,
) -> Result<ValidatedExpense, ExpenseErrors> {
    let mut errors = ExpenseErrors::default();

    let parsed_amount = match amount.trim().parse::<f64>() {
        Ok(value) if value > 0.0 && value.is_finite() => Some(value),
        Ok(_) => {
            errors.amount_error = Some("Amount must be greater than zero.".to_owned());
            None
        }
        Err(_) => {
            errors.amount_error = Some("Enter a valid amount.".to_owned());
            None
        }
    };

    let parsed_category = match category.parse::<Category>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.category_error = Some("Choose a category from the list.".to_owned());
            None
        }
    };

    let description = description.trim();
    if description.chars().count() > DESCRIPTION_MAX_LENGTH {
        errors.description_error = Some(format!(
            "Description must be at most {DESCRIPTION_MAX_LENGTH} characters."
        ));
    }

    let parsed_date = match date {
        None => Some(today),
        Some(raw_date) => match Date::parse(raw_date, DATE_FORMAT) {
            Ok(value) => Some(value),
            Err(_) => {
                errors.date_error = Some("Enter a date as YYYY-MM-DD.".to_owned());
                None
            }
        },
    };

    match (parsed_amount, parsed_category, parsed_date) {
        (Some(amount), Some(category), Some(date)) if errors.is_empty() => Ok(ValidatedExpense {
            amount,
            category,
            description: description.to_owned(),
            date,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod validate_registration_tests {
    use super::validate_registration;

    #[test]
    fn accepts_valid_form() {
        let result = validate_registration("alice", "alice@example.com", "hunter22", "hunter22");

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn rejects_short_username() {
        let errors =
            validate_registration("abc", "alice@example.com", "hunter22", "hunter22").unwrap_err();

        assert!(errors.username_error.is_some());
        assert!(errors.email_error.is_none());
    }

    #[test]
    fn rejects_long_username() {
        let username = "a".repeat(21);
        let errors =
            validate_registration(&username, "alice@example.com", "hunter22", "hunter22")
                .unwrap_err();

        assert!(errors.username_error.is_some());
    }

    #[test]
    fn accepts_boundary_username_lengths() {
        assert!(validate_registration("abcd", "a@b.com", "hunter22", "hunter22").is_ok());
        let twenty = "a".repeat(20);
        assert!(validate_registration(&twenty, "a@b.com", "hunter22", "hunter22").is_ok());
    }

    #[test]
    fn rejects_invalid_email() {
        for email in ["", "alice", "alice@", "@example.com", "alice@nodot"] {
            let errors =
                validate_registration("alice", email, "hunter22", "hunter22").unwrap_err();

            assert!(errors.email_error.is_some(), "email {email:?} should fail");
        }
    }

    #[test]
    fn rejects_short_password() {
        let errors =
            validate_registration("alice", "alice@example.com", "abc12", "abc12").unwrap_err();

        assert!(errors.password_error.is_some());
    }

    #[test]
    fn rejects_mismatched_confirm_password() {
        let errors = validate_registration("alice", "alice@example.com", "hunter22", "hunter23")
            .unwrap_err();

        assert!(errors.confirm_password_error.is_some());
    }

    #[test]
    fn reports_all_errors_at_once() {
        let errors = validate_registration("abc", "not-an-email", "abc", "xyz").unwrap_err();

        assert!(errors.username_error.is_some());
        assert!(errors.email_error.is_some());
        assert!(errors.password_error.is_some());
        assert!(errors.confirm_password_error.is_some());
    }
}
