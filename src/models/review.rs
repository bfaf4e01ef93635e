use serde::{Deserialize, Serialize};

use super::{to_document, FieldErrors, Mode, ValidationError};
use crate::types::Document;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ReviewInput {
    pub fn validate(&self, mode: Mode) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.required_text(mode, &self.title, "title", "Please add a title for the review");
        errors.max_len(&self.title, 100, "title");
        errors.required_text(mode, &self.text, "text", "Please add some text");
        errors.required(mode, &self.rating, "rating", "Please add a rating between 1 and 10");
        if let Some(rating) = self.rating {
            errors.check(
                (MIN_RATING..=MAX_RATING).contains(&rating),
                "rating",
                "Please add a rating between 1 and 10",
            );
        }
        errors.into_result()
    }

    pub fn into_document(self) -> Document {
        to_document(&self)
    }
}
