//! `tenantdash` command line

mod args;
mod logging;
mod postgres;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::ArgMatches;
use tenantdash_client::{ApiClient, ResourceKind};
use tenantdash_core::{ProvisionReport, Provisioner};
use tracing::{error, info};

use crate::postgres::PostgresSqlExecutor;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = args::command().get_matches();
    logging::init(matches.get_flag("log-json"));

    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let client = ApiClient::new(&args::client_config(matches)?)?;

    match matches.subcommand() {
        Some(("provision", sub)) => provision(client, sub).await,
        Some(("show", sub)) => show(&client, sub).await,
        Some((name, _)) => anyhow::bail!("unknown command {name}"),
        None => anyhow::bail!("a command is required"),
    }
}

async fn provision(client: ApiClient, matches: &ArgMatches) -> anyhow::Result<()> {
    let spec = args::tenant_spec(matches)?;
    let config = args::provision_config(matches);
    let database_url = matches
        .get_one::<String>("database-url")
        .context("--database-url or REDASH_DATABASE_URL is required")?;
    let sql = Arc::new(PostgresSqlExecutor::new(database_url.as_str()));

    let report = Provisioner::new(client, sql, config, spec).run().await?;
    log_report(&report);
    Ok(())
}

/// Success is reported through the log only
fn log_report(report: &ProvisionReport) {
    info!(
        data_source_id = ?report.data_source_id,
        group_id = ?report.group_id,
        dashboard_id = ?report.dashboard_id,
        dashboard = ?report.dashboard_slug,
        created_users = ?report.created_user_ids,
        existing_users = ?report.existing_user_ids,
        forked_queries = report.forked_queries,
        cloned_widgets = report.cloned_widgets,
        "provisioned tenant"
    );
}

async fn show(client: &ApiClient, matches: &ArgMatches) -> anyhow::Result<()> {
    let resource: ResourceKind = matches
        .get_one::<String>("resource")
        .context("resource is required")?
        .parse()?;
    let key = matches.get_one::<String>("key").context("key is required")?;

    match resource.get_raw(client, key).await? {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => anyhow::bail!("{} {key} not found", resource.entity_name()),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_report_goes_to_the_log() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let report = ProvisionReport {
            data_source_id: Some(7),
            group_id: Some(8),
            dashboard_id: Some(12),
            dashboard_slug: Some("dashboard-widgets-co".into()),
            created_user_ids: vec![3],
            existing_user_ids: vec![4],
            forked_queries: 1,
            cloned_widgets: 2,
        };
        tracing::subscriber::with_default(subscriber, || log_report(&report));

        let logged = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(logged.contains("provisioned tenant"));
        assert!(logged.contains("dashboard-widgets-co"));
        assert!(logged.contains("created_users=[3]"));
        assert!(logged.contains("cloned_widgets=2"));
    }
}
