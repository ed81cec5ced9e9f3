//! Payload validation and normalization for user writes.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repositories::user::UserFields;
use crate::text::capitalize_first;

const MAX_LENGTH: usize = 255;

const BLANK: &str = "This value should not be blank.";
const TOO_LONG: &str = "This value is too long. It should have 255 characters or less.";
const INVALID_EMAIL: &str = "This value is not a valid email address.";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Body accepted by user create and update.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserPayload {
    #[schema(example = "jdoe")]
    pub username: Option<String>,
    #[schema(example = "john")]
    pub first_name: Option<String>,
    #[schema(example = "doe")]
    pub last_name: Option<String>,
    #[schema(example = "John.Doe@Gmail.com")]
    pub email: Option<String>,
}

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl UserPayload {
    /// Checks every field and returns the normalized attributes.
    ///
    /// Values are trimmed; username and email are lowercased and the first
    /// letter of each name is capitalized.
    pub fn validate(&self) -> Result<UserFields, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let username = required(&mut errors, "username", self.username.as_deref());
        let first_name = required(&mut errors, "first_name", self.first_name.as_deref());
        let last_name = required(&mut errors, "last_name", self.last_name.as_deref());
        let email = required(&mut errors, "email", self.email.as_deref());

        if let Some(email) = email
            && !EMAIL_PATTERN.is_match(email)
        {
            errors.add("email", INVALID_EMAIL);
        }

        match (username, first_name, last_name, email) {
            (Some(username), Some(first_name), Some(last_name), Some(email))
                if errors.is_empty() =>
            {
                Ok(UserFields {
                    username: username.to_lowercase(),
                    first_name: capitalize_first(first_name),
                    last_name: capitalize_first(last_name),
                    email: email.to_lowercase(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn required<'v>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&'v str>,
) -> Option<&'v str> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if value.chars().count() > MAX_LENGTH {
        errors.add(field, TOO_LONG);
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: &str) -> UserPayload {
        UserPayload {
            username: Some("  JDoe ".to_string()),
            first_name: Some("john".to_string()),
            last_name: Some("doe".to_string()),
            email: Some(email.to_string()),
        }
    }

    #[test]
    fn valid_payload_is_normalized() {
        let fields = payload("Test@Gmail.com").validate().unwrap();

        assert_eq!(fields.username, "jdoe");
        assert_eq!(fields.first_name, "John");
        assert_eq!(fields.last_name, "Doe");
        assert_eq!(fields.email, "test@gmail.com");
    }

    #[test]
    fn missing_and_blank_fields_are_reported() {
        let errors = UserPayload {
            username: Some("   ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        for field in ["username", "first_name", "last_name", "email"] {
            assert_eq!(errors.messages(field), [BLANK]);
        }
    }

    #[test]
    fn invalid_email_is_reported() {
        let errors = payload("not-an-email").validate().unwrap_err();

        assert_eq!(errors.messages("email"), [INVALID_EMAIL]);
        assert_eq!(errors.fields().len(), 1);
    }

    #[test]
    fn overlong_values_are_rejected() {
        let mut long = payload("john@gmail.com");
        long.last_name = Some("x".repeat(256));

        let errors = long.validate().unwrap_err();
        assert_eq!(errors.messages("last_name"), [TOO_LONG]);
    }
}
