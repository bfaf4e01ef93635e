use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::database::schema::{timestamp, Collection};
use crate::filter::{FilterError, QueryPlan};
use crate::types::Document;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Failed to decode row: {0}")]
    Decode(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Document persistence for the four collections.
///
/// Stores hand back full documents including hidden fields; callers redact
/// before anything leaves the service.
#[async_trait]
pub trait Store: Send + Sync {
    /// Records matching the plan, ordered, windowed and projected
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> Result<Vec<Document>, StoreError>;

    /// Total number of records in the collection, ignoring any filter
    async fn count(&self, collection: Collection) -> Result<u64, StoreError>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Insert a new record. `id` and `createdAt` are assigned here.
    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, StoreError>;

    /// Merge `patch` into the record, returning the updated document
    async fn update(&self, collection: Collection, id: Uuid, patch: Document) -> Result<Option<Document>, StoreError>;

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError>;

    /// Remove every record whose `field` equals `value`, returning how many went
    async fn delete_where(&self, collection: Collection, field: &str, value: &Value) -> Result<u64, StoreError>;

    async fn find_where(&self, collection: Collection, field: &str, value: Value) -> Result<Vec<Document>, StoreError> {
        self.find(collection, &QueryPlan::matching(field, value)).await
    }

    async fn find_one_where(&self, collection: Collection, field: &str, value: Value) -> Result<Option<Document>, StoreError> {
        let plan = QueryPlan { limit: Some(1), ..QueryPlan::matching(field, value) };
        Ok(self.find(collection, &plan).await?.into_iter().next())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Stamp `id` and `createdAt` and fill absent schema fields with null.
pub fn prepare_insert(collection: Collection, mut doc: Document) -> Document {
    doc.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    doc.insert("createdAt".into(), Value::String(timestamp(chrono::Utc::now())));
    for (field, _) in collection.fields() {
        doc.entry(field.to_string()).or_insert(Value::Null);
    }
    doc
}
