use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::schema::Collection;
use super::store::{prepare_insert, Store, StoreError};
use crate::config::DatabaseConfig;
use crate::filter::{Filter, FilterWhere, FilterWhereInfo, QueryPlan, SqlResult};
use crate::types::Document;

const SCHEMA: &str = include_str!("schema.sql");

/// Postgres-backed store. Every collection is a table whose columns carry
/// the camelCase wire names, so rows convert to documents with `to_jsonb`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;
        info!(max_connections = config.max_connections, "Created Postgres pool");
        Ok(Self { pool })
    }

    /// Create the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }

    async fn fetch_documents(&self, sql: &SqlResult) -> Result<Vec<Document>, StoreError> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await.map_err(map_sqlx)?;
        rows.iter().map(row_document).collect()
    }

    /// Columns of `collection` present in `doc`, in schema order
    fn columns_in(collection: Collection, doc: &Document) -> Vec<&'static str> {
        collection
            .fields()
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| *name != "id" && *name != "createdAt" && doc.contains_key(*name))
            .collect()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> Result<Vec<Document>, StoreError> {
        let mut filter = Filter::new(collection);
        filter.assign(plan.clone())?;
        let sql = filter.to_sql()?;
        tracing::debug!(query = %sql.query, "find");
        self.fetch_documents(&sql).await
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        let sql = Filter::new(collection).to_count_sql()?;
        let row = sqlx::query(&sql.query).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let plan = QueryPlan {
            limit: Some(1),
            ..QueryPlan::matching("id", Value::String(id.to_string()))
        };
        Ok(self.find(collection, &plan).await?.into_iter().next())
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, StoreError> {
        let doc = prepare_insert(collection, doc);
        let table = collection.table_name();
        let query = format!(
            "INSERT INTO \"{table}\" AS t SELECT * FROM jsonb_populate_record(NULL::\"{table}\", $1) \
             RETURNING to_jsonb(t) AS row"
        );
        let row = sqlx::query(&query)
            .bind(Value::Object(doc))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row_document(&row)
    }

    async fn update(&self, collection: Collection, id: Uuid, patch: Document) -> Result<Option<Document>, StoreError> {
        let columns = Self::columns_in(collection, &patch);
        if columns.is_empty() {
            return self.find_by_id(collection, id).await;
        }

        let table = collection.table_name();
        let quoted = columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ");
        let query = format!(
            "UPDATE \"{table}\" AS t SET ({quoted}) = (SELECT {quoted} FROM jsonb_populate_record(NULL::\"{table}\", $1)) \
             WHERE t.\"id\" = $2 RETURNING to_jsonb(t) AS row"
        );
        let row = sqlx::query(&query)
            .bind(Value::Object(patch))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(row_document).transpose()
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let query = format!("DELETE FROM \"{}\" WHERE \"id\" = $1", collection.table_name());
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, collection: Collection, field: &str, value: &Value) -> Result<u64, StoreError> {
        let (where_clause, params) =
            FilterWhere::generate(collection, &[FilterWhereInfo::eq(field, value.clone())], 0)?;
        let query = format!("DELETE FROM \"{}\" WHERE {}", collection.table_name(), where_clause);
        let mut q = sqlx::query(&query);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let result = q.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_document(row: &PgRow) -> Result<Document, StoreError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Decode(format!("expected a JSON object, got {}", other))),
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Duplicate(db.constraint().unwrap_or("unique key").to_string());
        }
    }
    StoreError::Sqlx(err)
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // List fields compare against text[]
        Value::Array(items) => q.bind(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<String>>(),
        ),
        Value::Object(_) => q.bind(v.clone()),
    }
}
