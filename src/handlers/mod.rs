// handlers/mod.rs - one module per resource under /api/v1
//
// Each module exposes `public_routes` (no authentication) and
// `protected_routes` (JWT required); routes.rs layers the latter.

pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod users;

use serde_json::Value;
use uuid::Uuid;

use crate::database::{Collection, Store};
use crate::error::ApiError;
use crate::types::Document;

/// Parse a path id; malformed ids read as missing records.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::resource_not_found(what, raw))
}

/// Load a record or fail with 404.
pub(crate) async fn load(
    store: &dyn Store,
    collection: Collection,
    raw_id: &str,
    what: &str,
) -> Result<(Uuid, Document), ApiError> {
    let id = parse_id(raw_id, what)?;
    let doc = store
        .find_by_id(collection, id)
        .await?
        .ok_or_else(|| ApiError::resource_not_found(what, raw_id))?;
    Ok((id, doc))
}

/// Id stored in a reference field such as `user` or `bootcamp`
pub(crate) fn reference(doc: &Document, field: &str) -> Option<Uuid> {
    doc.get(field)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}
