use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Field name -> messages, serialized as the `errors` object of a 422 body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message overall, used as the top-level summary.
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().flatten().next().map(String::as_str)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.first_message().unwrap_or("The given data was invalid."))
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("name", "The name field is required.");
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "The email field is required.");
    } else if !is_valid_email(email) {
        errors.add("email", "The email field must be a valid email address.");
    }
}

/// Surrounding whitespace doesn't count; callers store the trimmed secret.
fn check_password(errors: &mut ValidationErrors, password: &str) {
    let password = password.trim();
    if password.is_empty() {
        errors.add("password", "The password field is required.");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("The password field must be at least {MIN_PASSWORD_LEN} characters."),
        );
    }
}

/// Registration: all three fields required. `email` must already be normalized.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_name(&mut errors, name);
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors.into_result()
}

/// Partial update: only the supplied fields are checked, but a supplied field
/// may not be blank.
pub fn validate_changes(
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(name) = name {
        check_name(&mut errors, name);
    }
    if let Some(email) = email {
        check_email(&mut errors, email);
    }
    if let Some(password) = password {
        check_password(&mut errors, password);
    }
    errors.into_result()
}
