//! List engine: turns query-string parameters into a [`QueryPlan`], runs it
//! against a [`Store`] and wraps the page in a [`ResultEnvelope`].

pub mod envelope;
pub mod params;
pub mod relation;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::config;
use crate::database::{Collection, Store, StoreError};
use crate::filter::{Filter, FilterError, FilterOrder, FilterOrderInfo, FilterWhere, QueryPlan, SortDirection};

pub use envelope::{ListEnvelope, PageLink, PageRequest, Pagination, ResultEnvelope};
pub use params::{QueryParams, RESERVED_PARAMS};
pub use relation::Relation;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 25;
pub const DEFAULT_SORT: &str = "createdAt";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A translated list request
#[derive(Debug, Clone, PartialEq)]
pub struct Translated {
    pub plan: QueryPlan,
    pub page: PageRequest,
}

/// Build the query plan for one list request.
pub fn translate(collection: Collection, params: &QueryParams) -> Result<Translated, FilterError> {
    let where_clause = FilterWhere::parse(collection, params.filters())?;

    let select = match params.get("select") {
        Some(spec) => Filter::parse_projection(spec)?,
        None => Default::default(),
    };

    let order = match params.get("sort") {
        Some(spec) => FilterOrder::parse(collection, spec)?,
        None => vec![],
    };
    let order = if order.is_empty() {
        vec![FilterOrderInfo { column: DEFAULT_SORT.to_string(), sort: SortDirection::Desc }]
    } else {
        order
    };

    let page = PageRequest {
        page: positive_or(params.get("page"), DEFAULT_PAGE),
        limit: cap_limit(positive_or(params.get("limit"), DEFAULT_LIMIT)),
    };

    let plan = QueryPlan {
        select,
        where_clause,
        order,
        offset: page.skip(),
        limit: Some(page.limit),
    };
    debug!(%collection, ?plan, "translated list query");
    Ok(Translated { plan, page })
}

/// Run a list request end to end.
///
/// `total` for the pagination links counts the whole collection, not just
/// the records matching the filter.
pub async fn advanced_results(
    store: &dyn Store,
    collection: Collection,
    params: &QueryParams,
    relations: &[Relation],
) -> Result<ResultEnvelope, QueryError> {
    let Translated { plan, page } = translate(collection, params)?;

    let total = store.count(collection).await?;
    let mut data = store.find(collection, &plan).await?;

    for doc in data.iter_mut() {
        for relation in relations {
            relation.populate(store, doc).await?;
        }
    }
    let data = data.into_iter().map(|doc| collection.redact(doc)).collect();

    Ok(ResultEnvelope::new(data, page.pagination(total)))
}

/// Leading-integer parse; missing, non-numeric or below 1 falls back to `default`.
fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(parse_int).filter(|n| *n >= 1).map_or(default, |n| n as u64)
}

fn parse_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

fn cap_limit(limit: u64) -> u64 {
    match config().filter.max_limit {
        Some(max) if limit > max => {
            if config().filter.debug_logging {
                warn!("Limit {} exceeds max {}, capping to max", limit, max);
            }
            max
        }
        _ => limit,
    }
}
