use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::{number, Document};

/// Column types understood by the filter layer and the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Id,
    Text,
    Number,
    Boolean,
    Timestamp,
    TextList,
}

impl FieldKind {
    /// Coerce a raw query-string value into the JSON value stored for this kind.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self {
            FieldKind::Text | FieldKind::TextList => Some(Value::String(raw.to_string())),
            FieldKind::Number => raw.parse::<f64>().ok().filter(|n| n.is_finite()).map(number),
            FieldKind::Boolean => match raw {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            FieldKind::Id => Uuid::parse_str(raw).ok().map(|id| Value::String(id.to_string())),
            FieldKind::Timestamp => parse_timestamp(raw).map(|ts| Value::String(timestamp(ts))),
        }
    }

    /// Postgres cast applied to bound text parameters
    pub fn sql_cast(&self) -> &'static str {
        match self {
            FieldKind::Id => "::uuid",
            FieldKind::Timestamp => "::timestamptz",
            _ => "",
        }
    }
}

/// Canonical timestamp text, lexically ordered like the instants it encodes
pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// The four record collections of the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Bootcamps,
    Courses,
    Reviews,
    Users,
}

const BOOTCAMP_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Id),
    ("user", FieldKind::Id),
    ("name", FieldKind::Text),
    ("description", FieldKind::Text),
    ("website", FieldKind::Text),
    ("phone", FieldKind::Text),
    ("email", FieldKind::Text),
    ("address", FieldKind::Text),
    ("careers", FieldKind::TextList),
    ("housing", FieldKind::Boolean),
    ("jobAssistance", FieldKind::Boolean),
    ("jobGuarantee", FieldKind::Boolean),
    ("acceptGi", FieldKind::Boolean),
    ("photo", FieldKind::Text),
    ("averageCost", FieldKind::Number),
    ("averageRating", FieldKind::Number),
    ("createdAt", FieldKind::Timestamp),
];

const COURSE_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Id),
    ("title", FieldKind::Text),
    ("description", FieldKind::Text),
    ("weeks", FieldKind::Text),
    ("tuition", FieldKind::Number),
    ("minimumSkill", FieldKind::Text),
    ("scholarshipAvailable", FieldKind::Boolean),
    ("bootcamp", FieldKind::Id),
    ("user", FieldKind::Id),
    ("createdAt", FieldKind::Timestamp),
];

const REVIEW_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Id),
    ("title", FieldKind::Text),
    ("text", FieldKind::Text),
    ("rating", FieldKind::Number),
    ("bootcamp", FieldKind::Id),
    ("user", FieldKind::Id),
    ("createdAt", FieldKind::Timestamp),
];

const USER_FIELDS: &[(&str, FieldKind)] = &[
    ("id", FieldKind::Id),
    ("name", FieldKind::Text),
    ("email", FieldKind::Text),
    ("role", FieldKind::Text),
    ("password", FieldKind::Text),
    ("createdAt", FieldKind::Timestamp),
];

impl Collection {
    pub fn table_name(&self) -> &'static str {
        match self {
            Collection::Bootcamps => "bootcamps",
            Collection::Courses => "courses",
            Collection::Reviews => "reviews",
            Collection::Users => "users",
        }
    }

    pub fn fields(&self) -> &'static [(&'static str, FieldKind)] {
        match self {
            Collection::Bootcamps => BOOTCAMP_FIELDS,
            Collection::Courses => COURSE_FIELDS,
            Collection::Reviews => REVIEW_FIELDS,
            Collection::Users => USER_FIELDS,
        }
    }

    pub fn field_kind(&self, field: &str) -> Option<FieldKind> {
        self.fields()
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// Fields that are stored but never returned to clients
    pub fn hidden_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["password"],
            _ => &[],
        }
    }

    /// Field groups whose combined values must be unique across the collection
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Collection::Users => &[&["email"]],
            Collection::Reviews => &[&["bootcamp", "user"]],
            _ => &[],
        }
    }

    /// Strip hidden fields before a document leaves the service.
    pub fn redact(&self, mut doc: Document) -> Document {
        for field in self.hidden_fields() {
            doc.remove(*field);
        }
        doc
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}
