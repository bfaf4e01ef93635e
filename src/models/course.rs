use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{to_document, FieldErrors, Mode, ValidationError};
use crate::types::Document;

pub const SKILLS: &[&str] = &["beginner", "intermediate", "advanced"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuition: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scholarship_available: Option<bool>,
}

impl CourseInput {
    pub fn validate(&self, mode: Mode) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::default();
        errors.required_text(mode, &self.title, "title", "Please add a course title");
        errors.required_text(mode, &self.description, "description", "Please add a description");
        errors.required_text(mode, &self.weeks, "weeks", "Please add number of weeks");
        errors.required(mode, &self.tuition, "tuition", "Please add a tuition cost");
        if let Some(tuition) = self.tuition {
            errors.check(tuition.is_finite() && tuition >= 0.0, "tuition", "Tuition can not be negative");
        }
        errors.required(mode, &self.minimum_skill, "minimumSkill", "Please add a minimum skill");
        if let Some(skill) = &self.minimum_skill {
            errors.check(
                SKILLS.contains(&skill.as_str()),
                "minimumSkill",
                "Minimum skill must be beginner, intermediate or advanced",
            );
        }
        errors.into_result()
    }

    pub fn into_document(self, mode: Mode) -> Document {
        let mut doc = to_document(&self);
        if mode == Mode::Create {
            doc.entry("scholarshipAvailable").or_insert(Value::Bool(false));
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_body;
    use serde_json::json;

    #[test]
    fn create_needs_every_course_field() {
        let input: CourseInput = parse_body(json!({"title": "Front End"})).unwrap();
        match input.validate(Mode::Create) {
            Err(ValidationError::Fields(fields)) => {
                assert_eq!(
                    fields.keys().collect::<Vec<_>>(),
                    vec!["description", "minimumSkill", "tuition", "weeks"]
                );
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn skill_must_be_known() {
        let input: CourseInput = parse_body(json!({"minimumSkill": "expert"})).unwrap();
        assert!(input.validate(Mode::Update).is_err());
    }

    #[test]
    fn create_defaults_scholarship_flag() {
        let input: CourseInput = parse_body(json!({
            "title": "Front End Web Development",
            "description": "HTML, CSS and JavaScript",
            "weeks": "8",
            "tuition": 8000,
            "minimumSkill": "beginner"
        }))
        .unwrap();
        input.validate(Mode::Create).unwrap();
        let doc = input.into_document(Mode::Create);
        assert_eq!(doc["scholarshipAvailable"], json!(false));
        assert_eq!(doc["tuition"], json!(8000));
    }
}
