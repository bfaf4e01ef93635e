use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{Projection, QueryPlan, SqlResult};
use crate::database::schema::Collection;

/// Renders a [`QueryPlan`] against one collection as parameterized Postgres.
///
/// Rows come back as a single jsonb column named `row` so every collection
/// decodes the same way.
pub struct Filter {
    collection: Collection,
    plan: QueryPlan,
}

impl Filter {
    pub fn new(collection: Collection) -> Self {
        Self { collection, plan: QueryPlan::default() }
    }

    pub fn assign(&mut self, plan: QueryPlan) -> Result<&mut Self, FilterError> {
        if let Projection::Include(columns) | Projection::Exclude(columns) = &plan.select {
            Self::validate_select_columns(columns)?;
        }
        self.plan = plan;
        Ok(self)
    }

    /// Parse `select=name,description` (include) or `select=-photo` (exclude).
    pub fn parse_projection(spec: &str) -> Result<Projection, FilterError> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return Ok(Projection::All);
        }
        let excluded = parts.iter().filter(|p| p.starts_with('-')).count();
        if excluded == 0 {
            Ok(Projection::Include(parts.into_iter().map(String::from).collect()))
        } else if excluded == parts.len() {
            Ok(Projection::Exclude(
                parts.into_iter().map(|p| p.trim_start_matches('-').to_string()).collect(),
            ))
        } else {
            Err(FilterError::InvalidProjection(format!(
                "cannot mix inclusion and exclusion in '{}'",
                spec
            )))
        }
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) =
            FilterWhere::generate(self.collection, &self.plan.where_clause, 0)?;
        let order_clause = FilterOrder::generate(&self.plan.order);

        let query = [
            format!("SELECT {} AS row", self.build_select_clause()),
            format!("FROM \"{}\" AS t", self.collection.table_name()),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) =
            FilterWhere::generate(self.collection, &self.plan.where_clause, 0)?;
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.collection.table_name())
        } else {
            format!(
                "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
                self.collection.table_name(),
                where_clause
            )
        };
        Ok(SqlResult { query, params })
    }

    fn validate_select_columns(columns: &[String]) -> Result<(), FilterError> {
        for column in columns {
            let mut chars = column.chars();
            let valid_start = chars.next().map_or(false, |c| c.is_alphabetic() || c == '_');
            if !valid_start || !chars.all(|c| c.is_alphanumeric() || c == '_') {
                return Err(FilterError::InvalidColumn(format!(
                    "Invalid column name format: {}",
                    column
                )));
            }
        }
        Ok(())
    }

    // Unknown names are dropped rather than rejected, matching the in-memory store.
    fn known_columns<'a>(&self, columns: &'a [String]) -> Vec<&'a str> {
        columns
            .iter()
            .map(String::as_str)
            .filter(|c| self.collection.field_kind(c).is_some())
            .collect()
    }

    fn build_select_clause(&self) -> String {
        match &self.plan.select {
            Projection::All => "to_jsonb(t)".to_string(),
            Projection::Include(columns) => {
                let mut pairs = vec!["'id', t.\"id\"".to_string()];
                for column in self.known_columns(columns) {
                    if column != "id" {
                        pairs.push(format!("'{}', t.\"{}\"", column, column));
                    }
                }
                format!("jsonb_build_object({})", pairs.join(", "))
            }
            Projection::Exclude(columns) => {
                let mut expr = "to_jsonb(t)".to_string();
                for column in self.known_columns(columns) {
                    expr.push_str(&format!(" - '{}'", column));
                }
                expr
            }
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.plan.limit, self.plan.offset) {
            (Some(l), 0) => format!("LIMIT {}", l),
            (Some(l), o) => format!("LIMIT {} OFFSET {}", l, o),
            (None, 0) => String::new(),
            (None, o) => format!("OFFSET {}", o),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection};
    use serde_json::json;

    #[test]
    fn renders_full_page_query() {
        let plan = QueryPlan {
            select: Projection::Include(vec!["name".into(), "averageCost".into()]),
            where_clause: vec![FilterWhereInfo {
                column: "averageCost".into(),
                operator: FilterOp::Lte,
                data: json!(10000),
            }],
            order: vec![FilterOrderInfo { column: "createdAt".into(), sort: SortDirection::Desc }],
            offset: 2,
            limit: Some(2),
        };
        let mut filter = Filter::new(Collection::Bootcamps);
        filter.assign(plan).unwrap();
        let sql = filter.to_sql().unwrap();

        assert_eq!(
            sql.query,
            "SELECT jsonb_build_object('id', t.\"id\", 'name', t.\"name\", 'averageCost', t.\"averageCost\") AS row \
             FROM \"bootcamps\" AS t WHERE \"averageCost\" <= $1 ORDER BY \"createdAt\" DESC NULLS LAST LIMIT 2 OFFSET 2"
        );
        assert_eq!(sql.params, vec![json!(10000)]);
    }

    #[test]
    fn exclusion_subtracts_keys() {
        let mut filter = Filter::new(Collection::Bootcamps);
        filter
            .assign(QueryPlan {
                select: Projection::Exclude(vec!["photo".into(), "bogus".into()]),
                ..Default::default()
            })
            .unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(sql.query, "SELECT to_jsonb(t) - 'photo' AS row FROM \"bootcamps\" AS t");
    }

    #[test]
    fn rejects_malformed_select_columns() {
        let mut filter = Filter::new(Collection::Courses);
        let err = filter.assign(QueryPlan {
            select: Projection::Include(vec!["title'); drop".into()]),
            ..Default::default()
        });
        assert!(matches!(err, Err(FilterError::InvalidColumn(_))));
    }

    #[test]
    fn parses_projection_forms() {
        assert_eq!(Filter::parse_projection("").unwrap(), Projection::All);
        assert_eq!(
            Filter::parse_projection("name,description").unwrap(),
            Projection::Include(vec!["name".into(), "description".into()])
        );
        assert_eq!(
            Filter::parse_projection("-photo").unwrap(),
            Projection::Exclude(vec!["photo".into()])
        );
        assert!(Filter::parse_projection("name,-photo").is_err());
    }

    #[test]
    fn count_ignores_window() {
        let mut filter = Filter::new(Collection::Reviews);
        filter
            .assign(QueryPlan { limit: Some(5), offset: 10, ..QueryPlan::matching("rating", json!(8)) })
            .unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"reviews\" WHERE \"rating\" = $1");
    }
}
