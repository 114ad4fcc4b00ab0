//! Tenantdash Core
//!
//! Provisions an isolated analytics workspace for a new tenant and clones a
//! template dashboard onto it.
//!
//! # Core Concepts
//!
//! - [`Provisioner`]: runs validation, access provisioning, dashboard
//!   cloning and archival for one [`TenantSpec`]
//! - [`QueryCloneCache`]: each template query is forked at most once per run
//! - [`SqlExecutor`]: the direct database seam used for permissions and
//!   archival
//!
//! # Example
//!
//! ```rust,ignore
//! use tenantdash_core::prelude::*;
//!
//! let spec = TenantSpec::new(99, "Widgets Co", TemplateSelector::by_owner("Acme", 42))
//!     .with_users("ann@widgets.co,Ann".parse()?);
//! let report = Provisioner::new(client, sql, ProvisionConfig::default(), spec)
//!     .run()
//!     .await?;
//! ```

#![warn(unreachable_pub)]

pub mod cache;
pub mod config;
pub mod error;
pub mod provision;
pub mod roster;
pub mod sql;
pub mod types;

pub use cache::QueryCloneCache;
pub use config::{
    tenant_resource_name, ProvisionConfig, DASHBOARD_PREFIX, DEFAULT_GROUP_PERMISSIONS,
    MERCHANT_GROUP_PERMISSIONS,
};
pub use error::ProvisionError;
pub use provision::Provisioner;
pub use roster::{UserRoster, UserSpec};
pub use sql::{group_permissions_statement, SqlError, SqlExecutor, ARCHIVE_STATEMENT};
pub use types::{ProvisionReport, TemplateSelector, TenantSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ProvisionConfig, ProvisionError, ProvisionReport, Provisioner, SqlError, SqlExecutor,
        TemplateSelector, TenantSpec, UserRoster,
    };
}
