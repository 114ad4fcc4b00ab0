//! Runtime dispatch over entity kinds
//!
//! Used where the entity type is only known at runtime, e.g. from a
//! command line argument. Capability restrictions still apply: asking for
//! an operation a kind does not offer fails without a request.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_json::Value;
use tenantdash_schema::Structured;

use crate::client::ApiClient;
use crate::entity::{Entity, Readable};
use crate::error::{EntityError, EntityResult};
use crate::models::{Dashboard, DataSource, Group, Query, User, Widget};

/// Entity kinds known to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// [`DataSource`]
    DataSources,
    /// [`Group`]
    Groups,
    /// [`User`]
    Users,
    /// [`Query`]
    Queries,
    /// [`Widget`]
    Widgets,
    /// [`Dashboard`]
    Dashboards,
}

impl ResourceKind {
    /// All kinds
    pub const ALL: [ResourceKind; 6] = [
        Self::DataSources,
        Self::Groups,
        Self::Users,
        Self::Queries,
        Self::Widgets,
        Self::Dashboards,
    ];

    /// Collection endpoint
    #[must_use]
    pub fn endpoint(self) -> String {
        match self {
            Self::DataSources => DataSource::base_endpoint(),
            Self::Groups => Group::base_endpoint(),
            Self::Users => User::base_endpoint(),
            Self::Queries => Query::base_endpoint(),
            Self::Widgets => Widget::base_endpoint(),
            Self::Dashboards => Dashboard::base_endpoint(),
        }
    }

    /// Entity type name
    #[must_use]
    pub fn entity_name(self) -> &'static str {
        match self {
            Self::DataSources => DataSource::entity_name(),
            Self::Groups => Group::entity_name(),
            Self::Users => User::entity_name(),
            Self::Queries => Query::entity_name(),
            Self::Widgets => Widget::entity_name(),
            Self::Dashboards => Dashboard::entity_name(),
        }
    }

    /// Read one record and return its dumped wire form
    ///
    /// `key` is an id, or a slug for dashboards. Returns `None` on 404.
    ///
    /// # Errors
    /// Returns [`EntityError::Unsupported`] for widgets, and request or
    /// schema failures otherwise.
    pub async fn get_raw(self, client: &ApiClient, key: &str) -> EntityResult<Option<Value>> {
        match self {
            Self::DataSources => dump_of(DataSource::get(client, &parse_id(self, key)?).await?),
            Self::Groups => dump_of(Group::get(client, &parse_id(self, key)?).await?),
            Self::Users => dump_of(User::get(client, &parse_id(self, key)?).await?),
            Self::Queries => dump_of(Query::get(client, &parse_id(self, key)?).await?),
            Self::Dashboards => dump_of(Dashboard::get(client, &key.to_string()).await?),
            Self::Widgets => Err(EntityError::Unsupported {
                entity: self.entity_name(),
                operation: "get",
            }),
        }
    }
}

fn parse_id(kind: ResourceKind, key: &str) -> EntityResult<i64> {
    key.parse().map_err(|_| EntityError::UnknownResource(format!("{kind}/{key}")))
}

fn dump_of<T: Structured>(entity: Option<T>) -> EntityResult<Option<Value>> {
    entity.map(|e| e.dump()).transpose().map_err(EntityError::from)
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}

impl FromStr for ResourceKind {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.endpoint() == wanted)
            .ok_or_else(|| EntityError::UnknownResource(s.to_string()))
    }
}
