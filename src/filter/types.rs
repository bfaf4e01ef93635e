use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::Document;

/// A query-string value after bracket grouping: `a=1`, `a=1&a=2`, `a[gt]=1`
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
    Operators(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    /// Flatten scalar values; operator maps have no list form
    pub fn values(&self) -> Option<Vec<&str>> {
        match self {
            ParamValue::Single(v) => Some(vec![v.as_str()]),
            ParamValue::Many(vs) => Some(vs.iter().map(String::as_str).collect()),
            ParamValue::Operators(_) => None,
        }
    }
}

/// Closed set of predicate operators. Query strings spell them `field[gt]=…`;
/// plain `field=value` is `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    /// Map a bracket token (`gt`, `gte`, `lt`, `lte`, `in`) to an operator
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            "in" => Some(FilterOp::In),
            _ => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte)
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::In => "IN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

impl FilterWhereInfo {
    pub fn eq(column: impl Into<String>, data: Value) -> Self {
        Self { column: column.into(), operator: FilterOp::Eq, data }
    }

    /// Membership in the empty set, which no record satisfies.
    pub fn nothing(column: impl Into<String>) -> Self {
        Self { column: column.into(), operator: FilterOp::In, data: Value::Array(vec![]) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Nulls sort below every value, in either direction.
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC NULLS FIRST",
            SortDirection::Desc => "DESC NULLS LAST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Field projection requested through `select`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    #[default]
    All,
    /// Only these fields, plus `id`
    Include(Vec<String>),
    /// Everything except these fields
    Exclude(Vec<String>),
}

impl Projection {
    /// Apply the projection to a document held in process.
    pub fn apply(&self, doc: Document) -> Document {
        match self {
            Projection::All => doc,
            Projection::Include(fields) => doc
                .into_iter()
                .filter(|(k, _)| k == "id" || fields.iter().any(|f| f == k))
                .collect(),
            Projection::Exclude(fields) => doc
                .into_iter()
                .filter(|(k, _)| !fields.iter().any(|f| f == k))
                .collect(),
        }
    }
}

/// Structured form of a list request: predicates, projection, ordering and window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub select: Projection,
    pub where_clause: Vec<FilterWhereInfo>,
    pub order: Vec<FilterOrderInfo>,
    pub offset: u64,
    /// `None` returns every matching record
    pub limit: Option<u64>,
}

impl QueryPlan {
    /// Every record whose `column` equals `data`, unordered and unbounded
    pub fn matching(column: impl Into<String>, data: Value) -> Self {
        Self {
            where_clause: vec![FilterWhereInfo::eq(column, data)],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
