//! Entity contract and capability traits
//!
//! Every remote record implements [`Entity`]. What a record can do is
//! declared by the capability traits it implements:
//!
//! | Trait | Operations |
//! |---|---|
//! | [`Readable`] | `get`, `fetch` |
//! | [`Listable`] | `objects` (one request) |
//! | [`PaginatedListable`] | `objects_paged` (lazy stream) |
//! | [`Writable`] | `save` |
//! | [`Deletable`] | `delete` |
//!
//! The server is authoritative: `save` and `fetch` replace the local value
//! with whatever the server returns.

use std::fmt::Display;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tenantdash_schema::Structured;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::{EntityError, EntityResult};
use crate::pagination::paginate;

/// A remotely addressable record
pub trait Entity: Structured + Send + Sync + 'static {
    /// Collection endpoint override
    ///
    /// When `None`, the endpoint is derived from the type name.
    const RESOURCE: Option<&'static str> = None;

    /// Server-assigned id, `None` before first save
    fn id(&self) -> Option<i64>;

    /// Entity type name
    #[inline]
    fn entity_name() -> &'static str {
        Self::schema().name
    }

    /// Collection endpoint, e.g. `data_sources`
    fn base_endpoint() -> String {
        Self::RESOURCE.map_or_else(resource_name::<Self>, str::to_string)
    }

    /// Item endpoint for an id
    fn object_endpoint_by_id(id: i64) -> String {
        format!("{}/{id}", Self::base_endpoint())
    }

    /// Item endpoint for this value
    ///
    /// # Errors
    /// Returns [`EntityError::Unsaved`] if the value has no id yet.
    fn object_endpoint(&self, operation: &'static str) -> EntityResult<String> {
        self.id()
            .map(Self::object_endpoint_by_id)
            .ok_or(EntityError::Unsaved {
                entity: Self::entity_name(),
                operation,
            })
    }
}

/// Derive a collection name from a type name
///
/// `DataSource` → `data_sources`, `Query` → `querys` (override via
/// [`Entity::RESOURCE`] where the plural is irregular).
#[must_use]
pub fn resource_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);
    let mut name = snake_case(short);
    name.push('s');
    name
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Records that can be read individually
#[async_trait]
pub trait Readable: Entity {
    /// Value addressing one record
    type Key: Display + Send + Sync;

    /// Key of this value, if it has one
    fn key(&self) -> Option<Self::Key>;

    /// Item endpoint for a key
    fn read_endpoint(key: &Self::Key) -> String {
        format!("{}/{key}", Self::base_endpoint())
    }

    /// Load one record; `None` when the server answers 404
    ///
    /// # Errors
    /// Any other failure is returned as is.
    async fn get(client: &ApiClient, key: &Self::Key) -> EntityResult<Option<Self>> {
        let endpoint = Self::read_endpoint(key);
        match client.get_json(&endpoint).await {
            Ok(body) => Ok(Some(Self::load(&body)?)),
            Err(e) if e.status() == Some(404) => {
                debug!(%endpoint, "not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace this value with the server's current state
    ///
    /// # Errors
    /// Returns [`EntityError::Unsaved`] without a key, or the request or
    /// schema failure.
    async fn fetch(&mut self, client: &ApiClient) -> EntityResult<()> {
        let key = self.key().ok_or(EntityError::Unsaved {
            entity: Self::entity_name(),
            operation: "fetch",
        })?;
        let body = client.get_json(&Self::read_endpoint(&key)).await?;
        *self = Self::load(&body)?;
        Ok(())
    }
}

/// Records listed in a single response
#[async_trait]
pub trait Listable: Entity {
    /// Load every record
    async fn objects(client: &ApiClient) -> EntityResult<Vec<Self>> {
        let body = client.get_json(&Self::base_endpoint()).await?;
        Ok(Self::load_many(&body)?)
    }
}

/// Records listed page by page
pub trait PaginatedListable: Entity {
    /// Lazily stream every record matching `filters`
    ///
    /// Each call starts from page 1.
    fn objects_paged(
        client: &ApiClient,
        page_size: usize,
        filters: Vec<(String, String)>,
    ) -> BoxStream<'static, EntityResult<Self>> {
        paginate(client.clone(), Self::base_endpoint(), page_size, filters)
    }
}

/// Records that can be created and updated
#[async_trait]
pub trait Writable: Entity {
    /// Create (no id) or update (id present), then adopt the server's copy
    ///
    /// # Errors
    /// Returns the schema failure of the local value, or the request or
    /// schema failure of the response.
    async fn save(&mut self, client: &ApiClient) -> EntityResult<()> {
        let body = self.dump()?;
        let endpoint = match self.id() {
            Some(id) => Self::object_endpoint_by_id(id),
            None => Self::base_endpoint(),
        };
        let response = client.post_json(&endpoint, Some(body)).await?;
        *self = Self::load(&response)?;
        debug!(entity = Self::entity_name(), id = ?self.id(), "saved");
        Ok(())
    }
}

/// Records that can be deleted
#[async_trait]
pub trait Deletable: Entity {
    /// Endpoint addressed by `delete`
    fn delete_endpoint(&self) -> EntityResult<String> {
        self.object_endpoint("delete")
    }

    /// Delete on the server; the local value is left untouched
    async fn delete(&self, client: &ApiClient) -> EntityResult<()> {
        let endpoint = self.delete_endpoint()?;
        client.delete(&endpoint).await?;
        debug!(entity = Self::entity_name(), %endpoint, "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DataSource;
    struct QuerySchedule;
    struct Generic<T>(T);

    #[test]
    fn names_are_snake_case_plurals() {
        assert_eq!(resource_name::<DataSource>(), "data_sources");
        assert_eq!(resource_name::<QuerySchedule>(), "query_schedules");
        assert_eq!(resource_name::<Generic<u8>>(), "generics");
    }
}
