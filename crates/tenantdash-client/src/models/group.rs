//! Access groups

use serde::{Deserialize, Serialize};
use serde_json::json;
use tenantdash_schema::{FieldKind, FieldSpec, Schema, Structured, UnknownFields};

use crate::client::ApiClient;
use crate::entity::{Deletable, Entity, Listable, Readable, Writable};
use crate::error::EntityResult;
use crate::models::DataSource;

/// Wire schema of [`Group`]
pub static GROUP_SCHEMA: Schema = Schema {
    name: "Group",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("permissions", FieldKind::List(&FieldKind::String)),
        FieldSpec::optional("kind", FieldKind::String).wire("type"),
    ],
};

/// A set of users sharing data source grants and permissions
///
/// Data source grants and memberships are changed through the sub-resource
/// methods here; a user's own groups are changed by saving
/// [`crate::models::User::group_ids`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    /// Display name, not unique
    pub name: String,
    /// Server-assigned id
    pub id: Option<i64>,
    /// Creation time (RFC 3339)
    pub created_at: Option<String>,
    /// Capability names
    pub permissions: Option<Vec<String>>,
    /// `builtin` or `regular`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl Group {
    /// Create an unsaved group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn sub_endpoint(&self, operation: &'static str, tail: &str) -> EntityResult<String> {
        Ok(format!("{}/{tail}", self.object_endpoint(operation)?))
    }

    /// Data sources this group can reach
    pub async fn data_sources(&self, client: &ApiClient) -> EntityResult<Vec<DataSource>> {
        let endpoint = self.sub_endpoint("list data sources", "data_sources")?;
        let body = client.get_json(&endpoint).await?;
        Ok(DataSource::load_many(&body)?)
    }

    /// Grant access to a data source
    pub async fn add_data_source(&self, client: &ApiClient, data_source_id: i64) -> EntityResult<()> {
        let endpoint = self.sub_endpoint("add data source", "data_sources")?;
        client
            .post(&endpoint, Some(json!({"id": self.id, "data_source_id": data_source_id})))
            .await?;
        Ok(())
    }

    /// Set whether the grant on a data source is view-only
    pub async fn set_data_source_access(
        &self,
        client: &ApiClient,
        data_source_id: i64,
        view_only: bool,
    ) -> EntityResult<()> {
        let endpoint = self.sub_endpoint("set data source access", &format!("data_sources/{data_source_id}"))?;
        client.post(&endpoint, Some(json!({"view_only": view_only}))).await?;
        Ok(())
    }

    /// Revoke access to a data source
    pub async fn remove_data_source(&self, client: &ApiClient, data_source_id: i64) -> EntityResult<()> {
        let endpoint = self.sub_endpoint("remove data source", &format!("data_sources/{data_source_id}"))?;
        client.delete(&endpoint).await?;
        Ok(())
    }

    /// Add a member
    pub async fn add_member(&self, client: &ApiClient, user_id: i64) -> EntityResult<()> {
        let endpoint = self.sub_endpoint("add member", "members")?;
        client.post(&endpoint, Some(json!({"user_id": user_id}))).await?;
        Ok(())
    }

    /// Remove a member
    pub async fn remove_member(&self, client: &ApiClient, user_id: i64) -> EntityResult<()> {
        let endpoint = self.sub_endpoint("remove member", &format!("members/{user_id}"))?;
        client.delete(&endpoint).await?;
        Ok(())
    }
}

impl_structured!(Group, GROUP_SCHEMA);

impl Entity for Group {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Readable for Group {
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }
}

impl Listable for Group {}
impl Writable for Group {}
impl Deletable for Group {}
