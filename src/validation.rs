//! Field-level validation of JSON request payloads.
//!
//! Payloads are validated field by field so every problem is reported at
//! once, keyed by field name. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Key used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_NULL: &str = "This field may not be null.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_NOT_STRING: &str = "Not a valid string.";
pub const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build errors holding a single message for one field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Return `value` when no errors were collected.
    pub fn finish<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Whether a field must be present in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Rules for a string field.
#[derive(Debug, Clone, Copy)]
pub struct CharField {
    pub presence: Presence,
    pub max_length: Option<usize>,
    pub trim: bool,
}

impl CharField {
    pub const fn required() -> Self {
        Self {
            presence: Presence::Required,
            max_length: None,
            trim: true,
        }
    }

    pub const fn optional() -> Self {
        Self {
            presence: Presence::Optional,
            max_length: None,
            trim: true,
        }
    }

    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub const fn untrimmed(mut self) -> Self {
        self.trim = false;
        self
    }

    /// Read `name` from `payload`, recording any problem in `errors`.
    ///
    /// Numbers are accepted and converted to their string form; booleans,
    /// arrays and objects are rejected.
    pub fn extract(
        &self,
        payload: &Map<String, Value>,
        name: &str,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let raw = match payload.get(name) {
            None => {
                if self.presence == Presence::Required {
                    errors.add(name, MSG_REQUIRED);
                }
                return None;
            }
            Some(Value::Null) => {
                errors.add(name, MSG_NULL);
                return None;
            }
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                errors.add(name, MSG_NOT_STRING);
                return None;
            }
        };

        let value = if self.trim {
            raw.trim().to_string()
        } else {
            raw
        };

        // Untrimmed values keep their whitespace but still count as blank
        if value.trim().is_empty() {
            errors.add(name, MSG_BLANK);
            return None;
        }

        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                errors.add(
                    name,
                    format!("Ensure this field has no more than {} characters.", max),
                );
                return None;
            }
        }

        Some(value)
    }
}

/// Require the request body to be a JSON object.
pub fn expect_object(body: Value) -> Result<Map<String, Value>, FieldErrors> {
    let kind = match body {
        Value::Object(map) => return Ok(map),
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    };
    Err(FieldErrors::single(
        NON_FIELD_ERRORS,
        format!("Invalid data. Expected an object, but got {}.", kind),
    ))
}

/// Loose structural check for an email address: `local@domain.tld`, no
/// whitespace, no empty domain labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}
