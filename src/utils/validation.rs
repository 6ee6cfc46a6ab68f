//! Validation Utilities
//!
//! Email normalization and password policy checks shared by registration,
//! password change and password reset.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::ValidationError;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password size in bytes; bcrypt ignores anything beyond
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Passwords rejected outright regardless of length
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "sunshine1",
    "letmein123",
    "football1",
    "baseball1",
    "welcome1",
    "admin1234",
    "passw0rd",
    "abc12345",
    "11111111",
    "00000000",
];

/// Validates email address format
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes an email address: trims whitespace and lower-cases the domain part.
///
/// The local part keeps its case (`TEST@Example.com` becomes `TEST@example.com`).
pub fn normalize_email(email: &str) -> String {
    let trimmed = email.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => trimmed.to_string(),
    }
}

/// Checks a candidate password against the password policy.
///
/// Returns the list of human-readable problems; empty means acceptable.
pub fn password_problems(password: &str, email: Option<&str>) -> Vec<&'static str> {
    let mut problems = Vec::new();
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        problems.push(messages::PASSWORD_TOO_SHORT);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        problems.push(messages::PASSWORD_TOO_LONG);
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(messages::PASSWORD_NUMERIC);
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        problems.push(messages::PASSWORD_COMMON);
    }
    if let Some((local, _)) = email.and_then(|e| e.split_once('@')) {
        if !local.is_empty() && password.eq_ignore_ascii_case(local) {
            problems.push(messages::PASSWORD_SIMILAR);
        }
    }

    problems
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email.trim()) {
        Ok(())
    } else {
        Err(validation_error("invalid_email", messages::INVALID_EMAIL))
    }
}

/// Custom validator enforcing the password policy without context
pub fn password_strength_validator(password: &str) -> Result<(), ValidationError> {
    match password_problems(password, None).first() {
        None => Ok(()),
        Some(&problem) => Err(validation_error("weak_password", problem)),
    }
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Enter a valid email address.";
    pub const FIELD_REQUIRED: &str = "This field is required.";
    pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";
    pub const WRONG_PASSWORD: &str = "Wrong password.";
    pub const PASSWORD_TOO_SHORT: &str =
        "This password is too short. It must contain at least 8 characters.";
    pub const PASSWORD_TOO_LONG: &str =
        "This password is too long. It must contain at most 72 bytes.";
    pub const PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
    pub const PASSWORD_COMMON: &str = "This password is too common.";
    pub const PASSWORD_SIMILAR: &str = "The password is too similar to the email.";
}
