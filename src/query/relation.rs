use serde_json::Value;
use uuid::Uuid;

use crate::database::{Collection, Store, StoreError};
use crate::filter::Projection;
use crate::types::Document;

/// Related records attached to each document of a list page.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    /// Replace the id stored in `field` with the parent record, restricted to `select`
    Parent {
        field: String,
        collection: Collection,
        select: Projection,
    },
    /// Attach every record of `collection` whose `foreign_key` is this document's id
    Children {
        name: String,
        collection: Collection,
        foreign_key: String,
        select: Projection,
    },
}

impl Relation {
    pub fn parent(field: &str, collection: Collection, select: &[&str]) -> Self {
        Relation::Parent {
            field: field.to_string(),
            collection,
            select: include(select),
        }
    }

    pub fn children(name: &str, collection: Collection, foreign_key: &str) -> Self {
        Relation::Children {
            name: name.to_string(),
            collection,
            foreign_key: foreign_key.to_string(),
            select: Projection::All,
        }
    }

    pub fn with_select(self, fields: &[&str]) -> Self {
        match self {
            Relation::Children { name, collection, foreign_key, .. } => Relation::Children {
                name,
                collection,
                foreign_key,
                select: include(fields),
            },
            Relation::Parent { field, collection, .. } => Relation::Parent {
                field,
                collection,
                select: include(fields),
            },
        }
    }

    pub async fn populate(&self, store: &dyn Store, doc: &mut Document) -> Result<(), StoreError> {
        match self {
            Relation::Parent { field, collection, select } => {
                let Some(parent_id) = doc.get(field).and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()) else {
                    return Ok(());
                };
                let parent = store
                    .find_by_id(*collection, parent_id)
                    .await?
                    .map(|p| Value::Object(collection.redact(select.apply(p))))
                    .unwrap_or(Value::Null);
                doc.insert(field.clone(), parent);
            }
            Relation::Children { name, collection, foreign_key, select } => {
                let Some(id) = doc.get("id").cloned() else {
                    return Ok(());
                };
                let children = store
                    .find_where(*collection, foreign_key, id)
                    .await?
                    .into_iter()
                    .map(|c| Value::Object(collection.redact(select.apply(c))))
                    .collect();
                doc.insert(name.clone(), Value::Array(children));
            }
        }
        Ok(())
    }
}

fn include(fields: &[&str]) -> Projection {
    Projection::Include(fields.iter().map(|f| f.to_string()).collect())
}
