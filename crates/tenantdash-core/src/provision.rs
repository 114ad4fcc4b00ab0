//! Tenant provisioning and dashboard cloning
//!
//! A run goes through these stages, strictly in order:
//!
//! 1. Validate the template selector
//! 2. Provision access: users, group, permissions, data source, grant,
//!    memberships
//! 3. Clone the template dashboard and every widget on it, forking each
//!    template query at most once
//! 4. Archive orphaned queries and dashboards through SQL
//!
//! Any failure aborts the run. Remote records created by earlier stages are
//! left in place; re-running is safe because groups and users are found by
//! name and email, and stale data sources are removed.

use std::sync::Arc;

use futures::TryStreamExt;
use tenantdash_client::models::{Dashboard, DataSource, Group, Query, User, Widget};
use tenantdash_client::{ApiClient, Deletable, EntityError, Listable, PaginatedListable, Readable, Writable};
use tracing::{debug, info, warn};

use crate::cache::QueryCloneCache;
use crate::config::{tenant_resource_name, ProvisionConfig, DASHBOARD_PREFIX};
use crate::error::ProvisionError;
use crate::sql::{group_permissions_statement, SqlExecutor, ARCHIVE_STATEMENT};
use crate::types::{ProvisionReport, TenantSpec};

type Result<T> = std::result::Result<T, ProvisionError>;

/// Provisions one tenant from a template dashboard
///
/// Holds the run-scoped state: the tenant data source once created, the
/// resolved template owner and the fork cache. Use a fresh provisioner per
/// run.
#[derive(Debug)]
pub struct Provisioner {
    client: ApiClient,
    sql: Arc<dyn SqlExecutor>,
    config: ProvisionConfig,
    spec: TenantSpec,
    queries: QueryCloneCache,
    data_source_id: Option<i64>,
    template_owner: Option<String>,
    report: ProvisionReport,
}

impl Provisioner {
    /// Create provisioner for one tenant
    pub fn new(client: ApiClient, sql: Arc<dyn SqlExecutor>, config: ProvisionConfig, spec: TenantSpec) -> Self {
        let template_owner = spec.template.owner_name().map(str::to_string);
        Self {
            client,
            sql,
            config,
            spec,
            queries: QueryCloneCache::new(),
            data_source_id: None,
            template_owner,
            report: ProvisionReport::default(),
        }
    }

    /// Tenant being provisioned
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &TenantSpec {
        &self.spec
    }

    /// Progress so far
    #[inline]
    #[must_use]
    pub fn report(&self) -> &ProvisionReport {
        &self.report
    }

    /// Forks made so far
    #[inline]
    #[must_use]
    pub fn query_cache(&self) -> &QueryCloneCache {
        &self.queries
    }

    /// Run every stage
    pub async fn run(&mut self) -> Result<ProvisionReport> {
        self.validate()?;

        info!(
            tenant = %self.spec.tenant_name,
            tenant_id = self.spec.tenant_id,
            "generating dashboard"
        );
        self.generate_data_source_group_and_users().await?;
        self.clone_dashboard().await?;
        self.archive_old_queries_and_dashboards().await?;
        info!("finished generating dashboard");

        Ok(self.report.clone())
    }

    /// Check the template selector
    pub fn validate(&self) -> Result<()> {
        self.spec.template.validate()
    }

    /// Create the tenant's data source, group and users
    ///
    /// New users end up in the tenant group only; users that already
    /// existed keep their other groups.
    pub async fn generate_data_source_group_and_users(&mut self) -> Result<()> {
        let mut created = Vec::new();
        let mut existing = Vec::new();
        for entry in &self.spec.users {
            let (user, is_new) = self.get_or_create_user(&entry.email, &entry.name).await?;
            if is_new {
                created.push(user);
            } else {
                existing.push(user);
            }
        }

        let resource_name = tenant_resource_name(&self.spec.tenant_name, self.spec.tenant_id);
        let group = self.get_or_create_group(&resource_name).await?;
        let group_id = group.id.ok_or(EntityError::Unsaved {
            entity: "Group",
            operation: "grant access",
        })?;
        let permissions = self.config.group_permissions.clone();
        self.set_group_permissions(group_id, &permissions).await?;

        let data_source = self.create_data_source(&resource_name).await?;
        let data_source_id = data_source.id.ok_or(EntityError::Unsaved {
            entity: "DataSource",
            operation: "grant access",
        })?;

        group.add_data_source(&self.client, data_source_id).await?;
        group.set_data_source_access(&self.client, data_source_id, true).await?;
        info!(group_id, data_source_id, "added data source to group");

        for mut user in existing {
            let group_ids = user.group_ids.get_or_insert_with(Vec::new);
            if group_ids.contains(&group_id) {
                info!(user_id = ?user.id, "existing user is already part of the group");
            } else {
                group_ids.push(group_id);
                user.save(&self.client).await?;
                info!(user_id = ?user.id, "added existing user to group");
            }
            self.report.existing_user_ids.extend(user.id);
        }

        for mut user in created {
            user.group_ids = Some(vec![group_id]);
            user.save(&self.client).await?;
            info!(user_id = ?user.id, "set user group");
            self.report.created_user_ids.extend(user.id);
        }

        self.data_source_id = Some(data_source_id);
        self.report.group_id = Some(group_id);
        self.report.data_source_id = Some(data_source_id);
        Ok(())
    }

    /// Create a user, or find the existing one with this email
    ///
    /// Returns the user and whether it was created. Only a 400 answer is
    /// taken to mean the email is taken; it triggers a search by email.
    pub async fn get_or_create_user(&self, email: &str, name: &str) -> Result<(User, bool)> {
        let mut user = User::new(name, email);
        match user.save(&self.client).await {
            Ok(()) => {
                info!(user_id = ?user.id, "created new user");
                Ok((user, true))
            }
            Err(e) if e.status() == Some(400) => {
                let filters = vec![("q".to_string(), email.to_string())];
                let mut candidates = User::objects_paged(&self.client, self.config.page_size, filters);
                while let Some(candidate) = candidates.try_next().await? {
                    if candidate.email == email {
                        info!(user_id = ?candidate.id, "found existing user");
                        return Ok((candidate, false));
                    }
                }
                warn!(%email, %name, "failed get or create user");
                Err(e.into())
            }
            Err(e) => {
                warn!(%email, %name, error = %e, "failed get or create user");
                Err(e.into())
            }
        }
    }

    /// First group named exactly `name`, created if there is none
    pub async fn get_or_create_group(&self, name: &str) -> Result<Group> {
        if let Some(group) = Group::objects(&self.client)
            .await?
            .into_iter()
            .find(|g| g.name == name)
        {
            info!(group_id = ?group.id, "found existing group");
            return Ok(group);
        }

        let mut group = Group::new(name);
        group.save(&self.client).await?;
        info!(group_id = ?group.id, "created new group");
        Ok(group)
    }

    /// Overwrite a group's permission literal
    pub async fn set_group_permissions(&self, group_id: i64, permissions: &str) -> Result<()> {
        self.sql
            .execute_only(&group_permissions_statement(group_id, permissions))
            .await?;
        debug!(group_id, "set group permissions");
        Ok(())
    }

    /// Create a data source, then delete older ones with the same name
    ///
    /// Deleting a data source removes its queries, so leftovers from an
    /// earlier run take their queries with them. The new one always exists
    /// before any delete is issued.
    pub async fn create_data_source(&self, name: &str) -> Result<DataSource> {
        let mut data_source = DataSource::default();
        data_source.name = name.to_string();
        data_source.options.clone_from(&self.config.data_source_options);
        data_source.save(&self.client).await?;
        info!(data_source_id = ?data_source.id, "created new data source");

        for stale in DataSource::objects(&self.client).await? {
            if stale.id != data_source.id && stale.name == name {
                stale.delete(&self.client).await?;
                info!(data_source_id = ?stale.id, "deleted duplicate data source");
            }
        }

        Ok(data_source)
    }

    /// Clone the template dashboard onto the tenant data source
    pub async fn clone_dashboard(&mut self) -> Result<Dashboard> {
        if self.data_source_id.is_none() {
            return Err(ProvisionError::MissingDataSource);
        }

        let template = self.resolve_template().await?;
        let owner = self.template_owner()?.to_string();

        let mut dashboard = Dashboard::new(template.name.replacen(&owner, &self.spec.tenant_name, 1));
        dashboard.save(&self.client).await?;
        let dashboard_id = dashboard.id.ok_or(EntityError::Unsaved {
            entity: "Dashboard",
            operation: "add widgets",
        })?;
        info!(dashboard_id, slug = ?dashboard.slug, "created new dashboard");

        for widget in template.widgets() {
            self.clone_widget(widget.clone(), dashboard_id).await?;
        }

        dashboard.dashboard_filters_enabled = true;
        dashboard.is_draft = false;
        dashboard.save(&self.client).await?;

        self.report.dashboard_id = dashboard.id;
        self.report.dashboard_slug.clone_from(&dashboard.slug);
        Ok(dashboard)
    }

    /// Find the template and load it with its widgets
    async fn resolve_template(&mut self) -> Result<Dashboard> {
        let selector = self.spec.template.clone();

        if let Some(slug) = selector.slug() {
            let template = Dashboard::get(&self.client, &slug.to_string())
                .await?
                .ok_or_else(|| ProvisionError::TemplateNotFound(slug.to_string()))?;

            if self.template_owner.is_none() {
                let owner = template
                    .name
                    .split(DASHBOARD_PREFIX)
                    .nth(1)
                    .filter(|owner| !owner.is_empty())
                    .ok_or_else(|| ProvisionError::TemplateNameUnparseable(template.name.clone()))?;
                info!(owner, "parsed template owner from dashboard name");
                self.template_owner = Some(owner.to_string());
            }
            return Ok(template);
        }

        let owner = selector.owner_name().ok_or(ProvisionError::MissingTemplateSelector)?;
        let wanted = format!("{DASHBOARD_PREFIX}{owner}");
        let filters = vec![("q".to_string(), wanted.clone())];
        let mut candidates = Dashboard::objects_paged(&self.client, self.config.page_size, filters);
        while let Some(mut candidate) = candidates.try_next().await? {
            if candidate.name.starts_with(&wanted) {
                candidate.fetch(&self.client).await?;
                info!(slug = ?candidate.slug, "found template dashboard by owner name");
                return Ok(candidate);
            }
        }
        Err(ProvisionError::TemplateNotFound(owner.to_string()))
    }

    fn template_owner(&self) -> Result<&str> {
        self.template_owner
            .as_deref()
            .ok_or(ProvisionError::MissingTemplateSelector)
    }

    /// Recreate a template widget on the new dashboard
    ///
    /// Visualization widgets are pointed at the matching visualization of
    /// the forked query. Text widgets are copied as they are. A widget that
    /// names a visualization the template does not embed is rejected, as
    /// its id would still point at the template tenant's query.
    pub async fn clone_widget(&mut self, mut widget: Widget, new_dashboard_id: i64) -> Result<Widget> {
        if widget.is_text() {
            info!(widget_id = ?widget.id, "cloning text widget");
        } else {
            let original = widget
                .visualization
                .take()
                .ok_or(ProvisionError::DanglingVisualization { widget_id: widget.id })?;
            let source = original
                .query
                .as_ref()
                .ok_or(ProvisionError::DanglingVisualization { widget_id: widget.id })?;
            info!(
                widget_id = ?widget.id,
                query = %source.name,
                visualization = ?original.name,
                "cloning widget"
            );

            let forked = self.get_or_create_new_query(source).await?;
            let matched = original
                .find_match(forked.visualizations())
                .ok_or_else(|| ProvisionError::NoMatchingVisualization {
                    query_id: forked.id.unwrap_or_default(),
                    name: original.name.clone().unwrap_or_default(),
                    kind: original.kind.clone().unwrap_or_default(),
                })?;
            widget.visualization_id = matched.id;
        }

        widget.dashboard_id = new_dashboard_id;
        widget.id = None;
        widget.save(&self.client).await?;
        info!(widget_id = ?widget.id, "created new widget");

        self.report.cloned_widgets += 1;
        Ok(widget)
    }

    /// Fork a template query for the tenant, once per run
    ///
    /// The fork is renamed for the tenant, its text has every occurrence of
    /// the template tenant id replaced, and it is moved to the tenant data
    /// source and published.
    pub async fn get_or_create_new_query(&mut self, source: &Query) -> Result<Query> {
        let source_id = source.id.ok_or(EntityError::Unsaved {
            entity: "Query",
            operation: "fork",
        })?;
        if let Some(forked) = self.queries.get(source_id) {
            debug!(source_id, forked_id = ?forked.id, "reusing forked query");
            return Ok(forked.clone());
        }

        let data_source_id = self.data_source_id.ok_or(ProvisionError::MissingDataSource)?;
        let owner = self.template_owner()?.to_string();

        let mut original = source.clone();
        original.fetch(&self.client).await?;

        let mut forked = original.fork(&self.client).await?;
        info!(existing_id = source_id, new_id = ?forked.id, "forked query");

        forked.name = original.name.replacen(&owner, &self.spec.tenant_name, 1);
        forked.query = original.query.replace(
            &self.spec.template.owner_tenant_id.to_string(),
            &self.spec.tenant_id.to_string(),
        );
        forked.data_source_id = Some(data_source_id);
        forked.is_draft = Some(false);
        forked.save(&self.client).await?;

        self.queries.insert(source_id, forked.clone());
        self.report.forked_queries = self.queries.len();
        Ok(forked)
    }

    /// Archive orphaned queries and the dashboards showing them
    pub async fn archive_old_queries_and_dashboards(&self) -> Result<()> {
        info!("archiving old queries and dashboards");
        self.sql.execute_only(ARCHIVE_STATEMENT).await?;
        Ok(())
    }
}
