//! Users

use serde::{Deserialize, Serialize};
use tenantdash_schema::{FieldKind, FieldSpec, Schema, Structured, UnknownFields};

use crate::entity::{Deletable, Entity, PaginatedListable, Readable, Writable};

/// Wire schema of [`User`]
pub static USER_SCHEMA: Schema = Schema {
    name: "User",
    fields: &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("email", FieldKind::Email),
        FieldSpec::optional("id", FieldKind::Integer),
        FieldSpec::optional("auth_type", FieldKind::String),
        FieldSpec::optional("is_disabled", FieldKind::Boolean),
        FieldSpec::optional("profile_image_url", FieldKind::String),
        FieldSpec::optional("is_invitation_pending", FieldKind::Boolean),
        FieldSpec::optional("created_at", FieldKind::DateTime),
        FieldSpec::optional("disabled_at", FieldKind::DateTime),
        FieldSpec::optional("updated_at", FieldKind::DateTime),
        FieldSpec::optional("is_email_verified", FieldKind::Boolean),
        FieldSpec::optional("active_at", FieldKind::DateTime),
        FieldSpec::optional("api_key", FieldKind::String),
        FieldSpec::optional("group_ids", FieldKind::List(&FieldKind::Integer)),
        FieldSpec::optional(
            "groups",
            FieldKind::List(&FieldKind::OneOf(&[FieldKind::Integer, FieldKind::AnyObject])),
        )
        .load_only(),
    ],
};

/// Group summary embedded in a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group id
    pub id: Option<i64>,
    /// Group name
    pub name: Option<String>,
}

/// A user's group, as an id or a summary object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupRef {
    /// Bare id
    Id(i64),
    /// Summary object
    Summary(GroupSummary),
}

impl GroupRef {
    /// Group id, if known
    #[must_use]
    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Summary(summary) => summary.id,
        }
    }
}

/// A service user
///
/// To change memberships, set `group_ids` and save. `groups` is filled by
/// the server and never sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Display name
    pub name: String,
    /// Login email, unique per service
    pub email: String,
    /// Server-assigned id
    pub id: Option<i64>,
    /// Auth backend
    pub auth_type: Option<String>,
    /// Disabled flag
    pub is_disabled: Option<bool>,
    /// Avatar URL
    pub profile_image_url: Option<String>,
    /// Invitation not yet accepted
    pub is_invitation_pending: Option<bool>,
    /// Creation time (RFC 3339)
    pub created_at: Option<String>,
    /// Disable time (RFC 3339)
    pub disabled_at: Option<String>,
    /// Last update time (RFC 3339)
    pub updated_at: Option<String>,
    /// Email verified
    pub is_email_verified: Option<bool>,
    /// Last activity (RFC 3339)
    pub active_at: Option<String>,
    /// Personal API key
    pub api_key: Option<String>,
    /// Membership ids sent on save
    pub group_ids: Option<Vec<i64>>,
    /// Memberships as reported by the server
    pub groups: Option<Vec<GroupRef>>,
    #[serde(skip)]
    unknown_fields: UnknownFields,
}

impl User {
    /// Create an unsaved user
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}

impl Structured for User {
    fn schema() -> &'static Schema {
        &USER_SCHEMA
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown_fields
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown_fields
    }

    fn after_load(&mut self) {
        if let Some(groups) = self.groups.as_ref().filter(|g| !g.is_empty()) {
            self.group_ids = Some(groups.iter().filter_map(GroupRef::id).collect());
        }
    }
}

impl Entity for User {
    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Readable for User {
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }
}

impl PaginatedListable for User {}
impl Writable for User {}
impl Deletable for User {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_ids_follow_groups() {
        let ids = User::load(&json!({"name": "a", "email": "a@shop.io", "groups": [5, 9]})).unwrap();
        assert_eq!(ids.group_ids, Some(vec![5, 9]));

        let objects = User::load(&json!({
            "name": "a",
            "email": "a@shop.io",
            "groups": [{"id": 5, "name": "default"}],
            "group_ids": [1],
        }))
        .unwrap();
        assert_eq!(objects.group_ids, Some(vec![5]));
    }

    #[test]
    fn empty_groups_keep_group_ids() {
        let user = User::load(&json!({"name": "a", "email": "a@shop.io", "groups": [], "group_ids": [3]})).unwrap();
        assert_eq!(user.group_ids, Some(vec![3]));
    }

    #[test]
    fn groups_are_not_dumped() {
        let user = User::load(&json!({"name": "a", "email": "a@shop.io", "groups": [5]})).unwrap();
        let dumped = user.dump().unwrap();

        assert!(dumped.get("groups").is_none());
        assert_eq!(dumped["group_ids"], json!([5]));
    }

    #[test]
    fn invalid_email_rejected() {
        assert!(User::load(&json!({"name": "a", "email": "not-an-email"})).is_err());
    }
}
