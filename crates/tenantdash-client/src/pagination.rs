//! Lazy page-by-page listing
//!
//! Listing endpoints answer `{"count": N, "results": [...]}`. The stream
//! asks for page 1, yields its items, and keeps requesting the next page
//! while fewer than `count` items have been yielded. `count` is taken from
//! the first response only.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::entity::Entity;
use crate::error::{ApiError, EntityResult};

/// Largest page the service hands out
pub const DEFAULT_PAGE_SIZE: usize = 250;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageEnvelope {
    /// Total items across all pages
    pub count: u64,
    /// Items on this page
    pub results: Value,
}

impl PageEnvelope {
    fn parse(endpoint: &str, body: Value) -> Result<Self, ApiError> {
        serde_json::from_value(body).map_err(|e| ApiError::InvalidBody {
            endpoint: endpoint.to_string(),
            message: format!("not a page envelope: {e}"),
        })
    }
}

struct PageCursor {
    client: ApiClient,
    endpoint: String,
    page_size: usize,
    filters: Vec<(String, String)>,
    page: u64,
    yielded: u64,
    total: Option<u64>,
    exhausted: bool,
}

impl PageCursor {
    fn finished(&self) -> bool {
        self.exhausted || self.total.is_some_and(|total| self.yielded >= total)
    }

    fn query(&self) -> Vec<(String, String)> {
        let mut query = self.filters.clone();
        query.push(("page".to_string(), self.page.to_string()));
        query.push(("page_size".to_string(), self.page_size.to_string()));
        query
    }
}

/// Stream every item of a paginated listing
///
/// Nothing is requested until the stream is polled. Each call starts again
/// from page 1. A transport or schema failure ends the stream with that
/// error; items already yielded stay valid.
pub fn paginate<T: Entity>(
    client: ApiClient,
    endpoint: String,
    page_size: usize,
    filters: Vec<(String, String)>,
) -> BoxStream<'static, EntityResult<T>> {
    let cursor = PageCursor {
        client,
        endpoint,
        page_size: page_size.max(1),
        filters,
        page: 1,
        yielded: 0,
        total: None,
        exhausted: false,
    };

    stream::try_unfold(cursor, next_page::<T>)
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
}

async fn next_page<T: Entity>(mut cursor: PageCursor) -> EntityResult<Option<(Vec<T>, PageCursor)>> {
    if cursor.finished() {
        return Ok(None);
    }

    let body = cursor
        .client
        .get_with_query(&cursor.endpoint, cursor.query())
        .await?
        .ok_or_else(|| ApiError::EmptyBody(cursor.endpoint.clone()))?;
    let envelope = PageEnvelope::parse(&cursor.endpoint, body)?;
    let total = *cursor.total.get_or_insert(envelope.count);

    let items = T::load_many(&envelope.results)?;
    debug!(
        endpoint = %cursor.endpoint,
        page = cursor.page,
        items = items.len(),
        total,
        "fetched page"
    );

    if items.is_empty() {
        cursor.exhausted = true;
    }
    cursor.yielded += items.len() as u64;
    cursor.page += 1;

    Ok(Some((items, cursor)))
}
