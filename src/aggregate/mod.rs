//! Derived bootcamp fields kept in step with their courses and reviews.
//!
//! Handlers call [`refresh`] after a course or review is created or
//! deleted. The mean is recomputed from every remaining child and written
//! onto the bootcamp; failures are logged and never reach the caller.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::database::{Collection, Store, StoreError};
use crate::types::{number, Document};

/// Field on a child record that points at its bootcamp
pub const PARENT_REFERENCE: &str = "bootcamp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    AverageCost,
    AverageRating,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("No {kind} contributors for bootcamp {parent}")]
    NoContributors { kind: &'static str, parent: Uuid },

    #[error("Bootcamp {0} not found")]
    ParentNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::AverageCost => "average-cost",
            AggregateKind::AverageRating => "average-rating",
        }
    }

    pub fn child_collection(&self) -> Collection {
        match self {
            AggregateKind::AverageCost => Collection::Courses,
            AggregateKind::AverageRating => Collection::Reviews,
        }
    }

    pub fn source_field(&self) -> &'static str {
        match self {
            AggregateKind::AverageCost => "tuition",
            AggregateKind::AverageRating => "rating",
        }
    }

    pub fn target_field(&self) -> &'static str {
        match self {
            AggregateKind::AverageCost => "averageCost",
            AggregateKind::AverageRating => "averageRating",
        }
    }

    /// Cost rounds up to the next multiple of 10, rating to one decimal place.
    pub fn round(&self, mean: f64) -> f64 {
        match self {
            AggregateKind::AverageCost => (mean / 10.0).ceil() * 10.0,
            AggregateKind::AverageRating => (mean * 10.0).round() / 10.0,
        }
    }

    /// Rounded arithmetic mean, or `None` when nothing contributes.
    pub fn compute(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(self.round(mean))
    }
}

/// Recompute one aggregate for `parent_id` and write it back.
pub async fn recompute(store: &dyn Store, kind: AggregateKind, parent_id: Uuid) -> Result<f64, AggregateError> {
    let children = store
        .find_where(kind.child_collection(), PARENT_REFERENCE, Value::String(parent_id.to_string()))
        .await?;

    // Children without a numeric value do not contribute
    let values: Vec<f64> = children
        .iter()
        .filter_map(|child| child.get(kind.source_field()).and_then(Value::as_f64))
        .collect();

    let value = kind
        .compute(&values)
        .ok_or(AggregateError::NoContributors { kind: kind.name(), parent: parent_id })?;

    let mut patch = Document::new();
    patch.insert(kind.target_field().to_string(), number(value));
    store
        .update(Collection::Bootcamps, parent_id, patch)
        .await?
        .ok_or(AggregateError::ParentNotFound(parent_id))?;

    debug!(kind = kind.name(), %parent_id, value, "aggregate updated");
    Ok(value)
}

/// Best-effort [`recompute`]: the triggering write has already succeeded,
/// so any failure here is only logged.
pub async fn refresh(store: &dyn Store, kind: AggregateKind, parent_id: Uuid) {
    if let Err(e) = recompute(store, kind, parent_id).await {
        error!(kind = kind.name(), %parent_id, "Failed to update aggregate: {}", e);
    }
}
