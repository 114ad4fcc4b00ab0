//! Provisioning inputs and results

use crate::error::ProvisionError;
use crate::roster::UserRoster;

/// Which dashboard to clone
///
/// At least one of `slug` and `owner_name` must be set. `owner_tenant_id`
/// is the tenant id baked into the template's query texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSelector {
    /// Template dashboard slug
    pub slug: Option<String>,
    /// Tenant name the template was built for
    pub owner_name: Option<String>,
    /// Tenant id the template was built for
    pub owner_tenant_id: i64,
}

impl TemplateSelector {
    /// Select by slug; the owner is read from the dashboard name
    pub fn by_slug(slug: impl Into<String>, owner_tenant_id: i64) -> Self {
        Self {
            slug: Some(slug.into()),
            owner_name: None,
            owner_tenant_id,
        }
    }

    /// Select by owner name
    pub fn by_owner(owner_name: impl Into<String>, owner_tenant_id: i64) -> Self {
        Self {
            slug: None,
            owner_name: Some(owner_name.into()),
            owner_tenant_id,
        }
    }

    /// Also give the owner name
    #[must_use]
    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    /// Non-blank slug
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        non_blank(self.slug.as_deref())
    }

    /// Non-blank owner name
    #[must_use]
    pub fn owner_name(&self) -> Option<&str> {
        non_blank(self.owner_name.as_deref())
    }

    /// Fail unless a slug or an owner name is present
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.slug().is_none() && self.owner_name().is_none() {
            return Err(ProvisionError::MissingTemplateSelector);
        }
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Everything needed to provision one tenant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSpec {
    /// New tenant's id
    pub tenant_id: i64,
    /// New tenant's display name
    pub tenant_name: String,
    /// Dashboard to clone
    pub template: TemplateSelector,
    /// Users to create or attach
    pub users: UserRoster,
}

impl TenantSpec {
    /// Create spec without users
    pub fn new(tenant_id: i64, tenant_name: impl Into<String>, template: TemplateSelector) -> Self {
        Self {
            tenant_id,
            tenant_name: tenant_name.into(),
            template,
            users: UserRoster::new(),
        }
    }

    /// Set users
    #[must_use]
    pub fn with_users(mut self, users: UserRoster) -> Self {
        self.users = users;
        self
    }
}

/// What a run created or reused
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// New data source
    pub data_source_id: Option<i64>,
    /// Tenant group
    pub group_id: Option<i64>,
    /// Cloned dashboard
    pub dashboard_id: Option<i64>,
    /// Cloned dashboard slug
    pub dashboard_slug: Option<String>,
    /// Users created by this run
    pub created_user_ids: Vec<i64>,
    /// Users that already existed
    pub existing_user_ids: Vec<i64>,
    /// Template queries forked
    pub forked_queries: usize,
    /// Widgets created on the new dashboard
    pub cloned_widgets: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_requires_slug_or_owner() {
        assert!(TemplateSelector::by_slug("dashboard-acme", 42).validate().is_ok());
        assert!(TemplateSelector::by_owner("Acme", 42).validate().is_ok());

        let blank = TemplateSelector::by_slug("  ", 42).with_owner_name("");
        assert!(matches!(blank.validate(), Err(ProvisionError::MissingTemplateSelector)));
        assert!(TemplateSelector::default().validate().is_err());
    }
}
