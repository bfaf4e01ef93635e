//! Request bodies for the four record types and their validation rules.

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::{number, Document};

pub use bootcamp::BootcampInput;
pub use course::CourseInput;
pub use review::ReviewInput;
pub use user::{LoginInput, PasswordUpdate, UserDetails, UserInput};

/// Fields maintained by the service that request bodies may not set
pub const SYSTEM_FIELDS: &[&str] = &["id", "createdAt", "averageCost", "averageRating"];

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Expected a JSON object")]
    NotAnObject,

    #[error("System field '{0}' cannot be set via API")]
    SystemField(String),

    #[error("Invalid request body: {0}")]
    Malformed(String),

    #[error("Validation failed")]
    Fields(BTreeMap<String, String>),
}

/// Whether required fields must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Decode a JSON body into an input struct, refusing system fields.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ValidationError> {
    let map = body.as_object().ok_or(ValidationError::NotAnObject)?;
    if let Some(field) = SYSTEM_FIELDS.iter().find(|f| map.contains_key(**f)) {
        return Err(ValidationError::SystemField(field.to_string()));
    }
    serde_json::from_value(body).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Serialize an input struct into the document written to the store.
/// Whole floats are stored as integers.
pub fn to_document<T: Serialize>(input: &T) -> Document {
    match serde_json::to_value(input) {
        Ok(Value::Object(doc)) => doc
            .into_iter()
            .map(|(k, v)| match v.as_f64() {
                Some(n) if v.is_f64() => (k, number(n)),
                _ => (k, v),
            })
            .collect(),
        _ => Document::new(),
    }
}

/// Collects per-field messages; empty means the input is valid.
#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Flag a field that is absent on create.
    pub fn required<T>(&mut self, mode: Mode, value: &Option<T>, field: &str, message: &str) {
        if mode == Mode::Create && value.is_none() {
            self.add(field, message);
        }
    }

    /// Required text: absent on create or blank on either path.
    pub fn required_text(&mut self, mode: Mode, value: &Option<String>, field: &str, message: &str) {
        match value {
            Some(text) if text.trim().is_empty() => self.add(field, message),
            Some(_) => {}
            None => self.required(mode, value, field, message),
        }
    }

    pub fn max_len(&mut self, value: &Option<String>, max: usize, field: &str) {
        if let Some(text) = value {
            if text.chars().count() > max {
                self.add(field, format!("{} can not be more than {} characters", field, max));
            }
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self.0))
        }
    }
}

/// Loose shape check for e-mail addresses: `local@domain.tld`.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map_or(false, |(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}
