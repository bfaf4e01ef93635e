use serde::{Deserialize, Serialize};

use super::{is_email, FieldErrors, Mode, ValidationError};
use crate::types::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Registration body, also used by admins to create and edit accounts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserInput {
    /// `allow_admin` is false for self-registration.
    pub fn validate(&self, mode: Mode, allow_admin: bool) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.required_text(mode, &self.name, "name", "Please add a name");
        check_email(&mut errors, mode, &self.email);
        errors.required(mode, &self.password, "password", "Please add a password");
        if let Some(password) = &self.password {
            check_password(&mut errors, "password", password);
        }
        if self.role == Some(Role::Admin) && !allow_admin {
            errors.add("role", "Role must be user or publisher");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `PUT /auth/updatedetails` accepts only name and email.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.required_text(Mode::Update, &self.name, "name", "Please add a name");
        check_email(&mut errors, Mode::Update, &self.email);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdate {
    pub current_password: String,
    pub new_password: String,
}

impl PasswordUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        check_password(&mut errors, "newPassword", &self.new_password);
        errors.into_result()
    }
}

fn check_email(errors: &mut FieldErrors, mode: Mode, email: &Option<String>) {
    errors.required(mode, email, "email", "Please add an email");
    if let Some(email) = email {
        errors.check(is_email(email), "email", "Please add a valid email");
    }
}

fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    errors.check(
        password.chars().count() >= MIN_PASSWORD_LEN,
        field,
        "Password must be at least 6 characters",
    );
}
