use serde_json::Value;
use std::cmp::Ordering;

use super::error::FilterError;
use super::filter_where::compare_values;
use super::types::{FilterOrderInfo, SortDirection};
use crate::database::schema::Collection;
use crate::types::Document;

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `sort=-createdAt,name`: comma separated fields, `-` for descending.
    pub fn parse(collection: Collection, spec: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in spec.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let (column, sort) = match trimmed.strip_prefix('-') {
                Some(column) => (column, SortDirection::Desc),
                None => (trimmed.strip_prefix('+').unwrap_or(trimmed), SortDirection::Asc),
            };
            if collection.field_kind(column).is_none() || collection.hidden_fields().contains(&column) {
                return Err(FilterError::UnknownField {
                    collection: collection.to_string(),
                    field: column.to_string(),
                });
            }
            out.push(FilterOrderInfo { column: column.to_string(), sort });
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Compare two documents by the sort keys in order, later keys breaking ties.
    pub fn compare(infos: &[FilterOrderInfo], a: &Document, b: &Document) -> Ordering {
        for info in infos {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            let ordering = sort_cmp(left, right);
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

// Nulls first, then numbers, strings, booleans; mixed types order by rank.
fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    compare_values(a, b).unwrap_or_else(|| rank(a).cmp(&rank(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_directions() {
        let infos = FilterOrder::parse(Collection::Bootcamps, "-createdAt, name").unwrap();
        assert_eq!(
            infos,
            vec![
                FilterOrderInfo { column: "createdAt".into(), sort: SortDirection::Desc },
                FilterOrderInfo { column: "name".into(), sort: SortDirection::Asc },
            ]
        );
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"createdAt\" DESC NULLS LAST, \"name\" ASC NULLS FIRST");
    }

    #[test]
    fn rejects_unknown_sort_fields() {
        assert!(FilterOrder::parse(Collection::Courses, "-price").is_err());
        assert!(FilterOrder::parse(Collection::Users, "password").is_err());
    }

    #[test]
    fn later_keys_break_ties() {
        let infos = FilterOrder::parse(Collection::Bootcamps, "-createdAt,name").unwrap();
        let a = json!({"createdAt": "2024-01-01T00:00:00.000000Z", "name": "Alpha"});
        let b = json!({"createdAt": "2024-01-01T00:00:00.000000Z", "name": "Beta"});
        let c = json!({"createdAt": "2024-02-01T00:00:00.000000Z", "name": "Zed"});
        let (a, b, c) = (
            a.as_object().unwrap().clone(),
            b.as_object().unwrap().clone(),
            c.as_object().unwrap().clone(),
        );

        let mut docs = vec![a.clone(), b.clone(), c.clone()];
        docs.sort_by(|x, y| FilterOrder::compare(&infos, x, y));
        assert_eq!(docs, vec![c, a, b]);
    }

    #[test]
    fn missing_values_sort_lowest() {
        let rated = json!({"averageRating": 8}).as_object().unwrap().clone();
        let unrated = json!({"name": "New"}).as_object().unwrap().clone();

        let asc = FilterOrder::parse(Collection::Bootcamps, "averageRating").unwrap();
        let mut docs = vec![rated.clone(), unrated.clone()];
        docs.sort_by(|x, y| FilterOrder::compare(&asc, x, y));
        assert_eq!(docs, vec![unrated.clone(), rated.clone()]);
        assert_eq!(FilterOrder::generate(&asc), "ORDER BY \"averageRating\" ASC NULLS FIRST");

        let desc = FilterOrder::parse(Collection::Bootcamps, "-averageRating").unwrap();
        docs.sort_by(|x, y| FilterOrder::compare(&desc, x, y));
        assert_eq!(docs, vec![rated, unrated]);
        assert_eq!(FilterOrder::generate(&desc), "ORDER BY \"averageRating\" DESC NULLS LAST");
    }
}
