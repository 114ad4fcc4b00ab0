//! Provisioning configuration and naming rules

use tenantdash_client::models::DataSourceOptions;
use tenantdash_client::DEFAULT_PAGE_SIZE;

/// Capabilities granted to a tenant's group
pub const MERCHANT_GROUP_PERMISSIONS: &str = "{edit_dashboard,view_query,execute_query,schedule_query,\
list_dashboards,list_alerts,list_data_sources}";

/// Capabilities of the service's stock group
pub const DEFAULT_GROUP_PERMISSIONS: &str = "{create_dashboard,create_query,edit_dashboard,edit_query,\
view_query,view_source,execute_query,list_users,schedule_query,list_dashboards,list_alerts,list_data_sources}";

/// Every template dashboard name starts with this
pub const DASHBOARD_PREFIX: &str = "Dashboard - ";

/// Name shared by a tenant's group and data source
///
/// ```
/// # use tenantdash_core::config::tenant_resource_name;
/// assert_eq!(tenant_resource_name("Widgets Co", 99), "Widgets Co (99)");
/// ```
#[must_use]
pub fn tenant_resource_name(tenant_name: &str, tenant_id: i64) -> String {
    format!("{tenant_name} ({tenant_id})")
}

/// Provisioner settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionConfig {
    /// Page size for paginated listings
    pub page_size: usize,
    /// Connection settings of the new data source
    pub data_source_options: Option<DataSourceOptions>,
    /// Permission literal written to the tenant group
    pub group_permissions: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            data_source_options: None,
            group_permissions: MERCHANT_GROUP_PERMISSIONS.to_string(),
        }
    }
}

impl ProvisionConfig {
    /// Set page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set warehouse connection of the new data source
    #[must_use]
    pub fn with_data_source_options(mut self, options: DataSourceOptions) -> Self {
        self.data_source_options = Some(options);
        self
    }

    /// Set group permission literal
    #[must_use]
    pub fn with_group_permissions(mut self, permissions: impl Into<String>) -> Self {
        self.group_permissions = permissions.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merchant_permissions_literal() {
        assert_eq!(
            MERCHANT_GROUP_PERMISSIONS,
            "{edit_dashboard,view_query,execute_query,schedule_query,list_dashboards,list_alerts,list_data_sources}"
        );
        assert!(DEFAULT_GROUP_PERMISSIONS.starts_with("{create_dashboard,"));
        assert!(DEFAULT_GROUP_PERMISSIONS.ends_with(",list_data_sources}"));
    }

    #[test]
    fn defaults() {
        let config = ProvisionConfig::default();
        assert_eq!(config.page_size, 250);
        assert!(config.data_source_options.is_none());
        assert_eq!(config.group_permissions, MERCHANT_GROUP_PERMISSIONS);
    }
}
