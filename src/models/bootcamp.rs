use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_email, to_document, FieldErrors, Mode, ValidationError};
use crate::types::Document;

pub const CAREERS: &[&str] = &[
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub careers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_assistance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_guarantee: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_gi: Option<bool>,
}

impl BootcampInput {
    pub fn validate(&self, mode: Mode) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.required_text(mode, &self.name, "name", "Please add a name");
        errors.max_len(&self.name, 50, "name");
        errors.required_text(mode, &self.description, "description", "Please add a description");
        errors.max_len(&self.description, 500, "description");
        errors.required_text(mode, &self.address, "address", "Please add an address");
        errors.max_len(&self.phone, 20, "phone");

        if let Some(website) = &self.website {
            errors.check(
                website.starts_with("http://") || website.starts_with("https://"),
                "website",
                "Please use a valid URL with HTTP or HTTPS",
            );
        }
        if let Some(email) = &self.email {
            errors.check(is_email(email), "email", "Please add a valid email");
        }

        errors.required(mode, &self.careers, "careers", "Please add at least one career");
        if let Some(careers) = &self.careers {
            errors.check(!careers.is_empty(), "careers", "Please add at least one career");
            if let Some(bad) = careers.iter().find(|c| !CAREERS.contains(&c.as_str())) {
                errors.add("careers", format!("'{}' is not a supported career", bad));
            }
        }
        errors.into_result()
    }

    /// Document to store; creates get the default photo and `false` flags.
    pub fn into_document(self, mode: Mode) -> Document {
        let mut doc = to_document(&self);
        if mode == Mode::Create {
            doc.entry("photo").or_insert_with(|| Value::String(DEFAULT_PHOTO.to_string()));
            for flag in ["housing", "jobAssistance", "jobGuarantee", "acceptGi"] {
                doc.entry(flag).or_insert(Value::Bool(false));
            }
        }
        doc
    }
}
