use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, ParamValue};
use crate::database::schema::{Collection, FieldKind};
use crate::types::Document;

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Translate grouped query-string filters into typed predicates.
    ///
    /// `field=v` is equality, `field=a&field=b` is set membership and
    /// `field[op]=v` uses the bracket operator. Values are coerced to the
    /// field's kind so `tuition[gt]=1000` compares numerically. A field the
    /// collection does not have matches no record.
    pub fn parse(
        collection: Collection,
        raw: &BTreeMap<String, ParamValue>,
    ) -> Result<Vec<FilterWhereInfo>, FilterError> {
        let mut conditions = vec![];
        for (field, value) in raw {
            let Some(kind) = Self::field_kind(collection, field)? else {
                if let ParamValue::Operators(ops) = value {
                    for token in ops.keys() {
                        Self::map_operator(token)?;
                    }
                }
                conditions.push(FilterWhereInfo::nothing(field.as_str()));
                continue;
            };
            match value {
                ParamValue::Operators(ops) => {
                    for (token, op_value) in ops {
                        let operator = Self::map_operator(token)?;
                        conditions.push(Self::parse_field_condition(field, kind, operator, op_value)?);
                    }
                }
                ParamValue::Single(_) => {
                    conditions.push(Self::parse_field_condition(field, kind, FilterOp::Eq, value)?);
                }
                ParamValue::Many(_) => {
                    conditions.push(Self::parse_field_condition(field, kind, FilterOp::In, value)?);
                }
            }
        }
        Ok(conditions)
    }

    /// Hidden fields are refused outright; `None` for fields the collection lacks.
    fn field_kind(collection: Collection, field: &str) -> Result<Option<FieldKind>, FilterError> {
        if collection.hidden_fields().contains(&field) {
            return Err(FilterError::UnknownField {
                collection: collection.to_string(),
                field: field.to_string(),
            });
        }
        Ok(collection.field_kind(field))
    }

    fn parse_field_condition(
        field: &str,
        kind: FieldKind,
        operator: FilterOp,
        value: &ParamValue,
    ) -> Result<FilterWhereInfo, FilterError> {
        let raw = value.values().ok_or_else(|| {
            FilterError::InvalidOperatorData(format!("nested operators are not supported on '{}'", field))
        })?;

        if kind == FieldKind::TextList && operator.is_range() {
            return Err(FilterError::UnsupportedOperator(format!(
                "{:?} on list field '{}'",
                operator, field
            )));
        }

        let coerce = |r: &str| {
            kind.coerce(r).ok_or_else(|| FilterError::InvalidValue {
                field: field.to_string(),
                value: r.to_string(),
            })
        };

        let data = match operator {
            FilterOp::In => Value::Array(raw.iter().map(|r| coerce(*r)).collect::<Result<_, _>>()?),
            _ => match raw.as_slice() {
                [single] => coerce(*single)?,
                _ => {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{:?} on '{}' takes exactly one value",
                        operator, field
                    )))
                }
            },
        };

        Ok(FilterWhereInfo { column: field.to_string(), operator, data })
    }

    fn map_operator(token: &str) -> Result<FilterOp, FilterError> {
        FilterOp::from_token(token).ok_or_else(|| FilterError::UnsupportedOperator(token.to_string()))
    }

    /// Render predicates as a parameterized Postgres boolean expression.
    /// Returns an empty string when there is nothing to filter on.
    pub fn generate(
        collection: Collection,
        conditions: &[FilterWhereInfo],
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        let mut sql_conditions = vec![];
        for condition in conditions {
            match Self::field_kind(collection, &condition.column)? {
                Some(kind) => sql_conditions.push(filter_where.build_sql_condition(condition, kind)),
                None => sql_conditions.push("1=0".to_string()),
            }
        }
        Ok((sql_conditions.join(" AND "), filter_where.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo, kind: FieldKind) -> String {
        let quoted_column = format!("\"{}\"", condition.column);
        let cast = kind.sql_cast();
        match (condition.operator, kind) {
            (FilterOp::Eq, _) if condition.data.is_null() => format!("{} IS NULL", quoted_column),
            (FilterOp::Eq, FieldKind::TextList) => {
                format!("{} = ANY({})", self.param(condition.data.clone()), quoted_column)
            }
            (FilterOp::In, FieldKind::TextList) => {
                format!("{} && {}::text[]", quoted_column, self.param(condition.data.clone()))
            }
            (FilterOp::In, _) => {
                let values = match &condition.data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    return "1=0".to_string();
                }
                let params: Vec<String> = values
                    .into_iter()
                    .map(|v| format!("{}{}", self.param(v), cast))
                    .collect();
                format!("{} IN ({})", quoted_column, params.join(", "))
            }
            (op, _) => format!(
                "{} {} {}{}",
                quoted_column,
                op.to_sql(),
                self.param(condition.data.clone()),
                cast
            ),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    /// Evaluate predicates against a document held in process.
    pub fn matches(conditions: &[FilterWhereInfo], doc: &Document) -> bool {
        conditions
            .iter()
            .all(|c| Self::matches_condition(c, doc.get(&c.column).unwrap_or(&Value::Null)))
    }

    fn matches_condition(condition: &FilterWhereInfo, actual: &Value) -> bool {
        // List fields match when any element does
        if let Value::Array(items) = actual {
            return items.iter().any(|item| Self::matches_condition(condition, item));
        }
        match condition.operator {
            FilterOp::Eq => loose_eq(actual, &condition.data),
            FilterOp::In => condition
                .data
                .as_array()
                .map_or(false, |values| values.iter().any(|v| loose_eq(actual, v))),
            op => match compare_values(actual, &condition.data) {
                Some(ordering) => match op {
                    FilterOp::Gt => ordering == Ordering::Greater,
                    FilterOp::Gte => ordering != Ordering::Less,
                    FilterOp::Lt => ordering == Ordering::Less,
                    FilterOp::Lte => ordering != Ordering::Greater,
                    _ => false,
                },
                None => false,
            },
        }
    }
}

/// Ordering between two scalars of the same JSON type; `None` across types.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

pub(crate) fn loose_eq(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal) || a == b
}
