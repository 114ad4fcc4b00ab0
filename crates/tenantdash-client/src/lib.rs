//! Tenantdash Client
//!
//! Typed entities over the BI service REST API.
//!
//! # Core Concepts
//!
//! - [`ApiClient`]: authenticated transport with bounded exponential retry
//! - [`Entity`] and the capability traits [`Readable`], [`Listable`],
//!   [`PaginatedListable`], [`Writable`], [`Deletable`]
//! - [`paginate`]: lazy stream over `{count, results}` listings
//! - [`models`]: the concrete entities and their wire schemas
//!
//! # Example
//!
//! ```rust,ignore
//! use tenantdash_client::prelude::*;
//!
//! let client = ApiClient::new(&ClientConfig::new(base_url, api_key))?;
//! let template = Dashboard::get(&client, &"dashboard-acme".into()).await?;
//! ```

#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod pagination;
pub mod resource;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use entity::{resource_name, Deletable, Entity, Listable, PaginatedListable, Readable, Writable};
pub use error::{ApiError, EntityError, EntityResult};
pub use pagination::{paginate, PageEnvelope, DEFAULT_PAGE_SIZE};
pub use resource::ResourceKind;
pub use retry::RetryPolicy;
pub use transport::{ApiRequest, ApiResponse, HttpBackend, HttpMethod, ReqwestBackend};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::models::{
        Dashboard, DataSource, DataSourceOptions, Group, Query, User, Visualization, Widget,
    };
    pub use crate::{
        ApiClient, ClientConfig, Deletable, Entity, EntityError, EntityResult, Listable,
        PaginatedListable, Readable, RetryPolicy, Writable,
    };
    pub use tenantdash_schema::Structured;
}
