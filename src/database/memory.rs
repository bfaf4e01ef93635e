use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::schema::Collection;
use super::store::{prepare_insert, Store, StoreError};
use crate::filter::filter_where::loose_eq;
use crate::filter::{FilterOrder, FilterWhere, QueryPlan};
use crate::types::Document;

/// Process-local store used for development without Postgres and by the tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_matches(doc: &Document, id: Uuid) -> bool {
        doc.get("id").and_then(Value::as_str) == Some(id.to_string().as_str())
    }

    /// Reject `candidate` if it collides with another record on a unique key.
    fn check_unique(collection: Collection, docs: &[Document], candidate: &Document) -> Result<(), StoreError> {
        for key in collection.unique_keys() {
            let collides = docs.iter().any(|existing| {
                existing.get("id") != candidate.get("id")
                    && key.iter().all(|field| {
                        match (existing.get(*field), candidate.get(*field)) {
                            (Some(a), Some(b)) if !a.is_null() => loose_eq(a, b),
                            _ => false,
                        }
                    })
            });
            if collides {
                return Err(StoreError::Duplicate(format!("{}({})", collection, key.join(", "))));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, collection: Collection, plan: &QueryPlan) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut matched: Vec<&Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| FilterWhere::matches(&plan.where_clause, d)).collect())
            .unwrap_or_default();

        if !plan.order.is_empty() {
            matched.sort_by(|a, b| FilterOrder::compare(&plan.order, a, b));
        }

        let window = matched.into_iter().skip(usize::try_from(plan.offset).unwrap_or(usize::MAX));
        let window: Vec<&Document> = match plan.limit {
            Some(limit) => window.take(limit as usize).collect(),
            None => window.collect(),
        };

        Ok(window.into_iter().map(|d| plan.select.apply(d.clone())).collect())
    }

    async fn count(&self, collection: Collection) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&collection).map_or(0, |docs| docs.len() as u64))
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| Self::id_matches(d, id)))
            .cloned())
    }

    async fn insert(&self, collection: Collection, doc: Document) -> Result<Document, StoreError> {
        let doc = prepare_insert(collection, doc);
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        Self::check_unique(collection, docs, &doc)?;
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update(&self, collection: Collection, id: Uuid, patch: Document) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(None);
        };
        let Some(position) = docs.iter().position(|d| Self::id_matches(d, id)) else {
            return Ok(None);
        };

        let mut updated = docs[position].clone();
        for (field, value) in patch {
            if field != "id" && field != "createdAt" {
                updated.insert(field, value);
            }
        }
        Self::check_unique(collection, docs, &updated)?;
        docs[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| !Self::id_matches(d, id));
        Ok(docs.len() < before)
    }

    async fn delete_where(&self, collection: Collection, field: &str, value: &Value) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !d.get(field).map_or(false, |v| loose_eq(v, value)));
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterOp, FilterOrderInfo, FilterWhereInfo, Projection, SortDirection};
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn seed_courses(store: &MemoryStore) {
        for (title, tuition) in [("Alpha", 1000), ("Beta", 3000), ("Gamma", 2000), ("Delta", 4000)] {
            store
                .insert(Collection::Courses, doc(json!({"title": title, "tuition": tuition})))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn find_filters_sorts_windows_and_projects() {
        let store = MemoryStore::new();
        seed_courses(&store).await;

        let plan = QueryPlan {
            select: Projection::Include(vec!["title".into()]),
            where_clause: vec![FilterWhereInfo {
                column: "tuition".into(),
                operator: FilterOp::Gte,
                data: json!(2000),
            }],
            order: vec![FilterOrderInfo { column: "tuition".into(), sort: SortDirection::Desc }],
            offset: 1,
            limit: Some(1),
        };
        let found = store.find(Collection::Courses, &plan).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["title"], json!("Beta"));
        assert!(found[0].contains_key("id"));
        assert!(!found[0].contains_key("tuition"));
        assert_eq!(store.count(Collection::Courses).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn unique_keys_are_enforced() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, doc(json!({"email": "john@gmail.com"})))
            .await
            .unwrap();
        let err = store
            .insert(Collection::Users, doc(json!({"email": "john@gmail.com"})))
            .await;
        assert!(matches!(err, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_identity() {
        let store = MemoryStore::new();
        let created = store
            .insert(Collection::Reviews, doc(json!({"title": "Good", "rating": 7})))
            .await
            .unwrap();
        let id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();

        let updated = store
            .update(Collection::Reviews, id, doc(json!({"rating": 9, "id": "other"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["rating"], json!(9));
        assert_eq!(updated["title"], json!("Good"));
        assert_eq!(updated["id"], created["id"]);

        assert!(store.update(Collection::Reviews, Uuid::new_v4(), Document::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_where_removes_children() {
        let store = MemoryStore::new();
        let parent = Uuid::new_v4().to_string();
        for _ in 0..3 {
            store
                .insert(Collection::Courses, doc(json!({"bootcamp": parent})))
                .await
                .unwrap();
        }
        store.insert(Collection::Courses, doc(json!({"bootcamp": Uuid::new_v4().to_string()}))).await.unwrap();

        let removed = store.delete_where(Collection::Courses, "bootcamp", &json!(parent)).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(store.count(Collection::Courses).await.unwrap(), 1);
    }
}
