//! Command line definition and settings extraction

use std::time::Duration;

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tenantdash_client::models::DataSourceOptions;
use tenantdash_client::{ClientConfig, DEFAULT_PAGE_SIZE};
use tenantdash_core::{ProvisionConfig, TemplateSelector, TenantSpec, UserRoster};

pub(crate) fn command() -> Command {
    Command::new("tenantdash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Provision tenant workspaces on the BI service")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .env("REDASH_BASE_URL")
                .global(true)
                .help("BI service base URL"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .env("REDASH_API_KEY")
                .hide_env_values(true)
                .global(true)
                .help("BI service API key"),
        )
        .arg(
            Arg::new("timeout-secs")
                .long("timeout-secs")
                .default_value("30")
                .value_parser(value_parser!(u64))
                .global(true)
                .help("Per-request timeout in seconds"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("provision")
                .about("Create a tenant's data source, group and users, then clone the template dashboard")
                .arg(
                    Arg::new("tenant-id")
                        .long("tenant-id")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("New tenant id"),
                )
                .arg(
                    Arg::new("tenant-name")
                        .long("tenant-name")
                        .required(true)
                        .help("New tenant name"),
                )
                .arg(
                    Arg::new("template-slug")
                        .long("template-slug")
                        .help("Slug of the template dashboard"),
                )
                .arg(
                    Arg::new("template-owner")
                        .long("template-owner")
                        .help("Tenant name the template dashboard was built for"),
                )
                .arg(
                    Arg::new("template-tenant-id")
                        .long("template-tenant-id")
                        .required(true)
                        .value_parser(value_parser!(i64))
                        .help("Tenant id used in the template's queries"),
                )
                .arg(
                    Arg::new("users")
                        .long("users")
                        .default_value("")
                        .help("Users to provision: email,name;email,name"),
                )
                .arg(
                    Arg::new("page-size")
                        .long("page-size")
                        .default_value("250")
                        .value_parser(value_parser!(usize))
                        .help("Page size for listings"),
                )
                .arg(
                    Arg::new("database-url")
                        .long("database-url")
                        .env("REDASH_DATABASE_URL")
                        .hide_env_values(true)
                        .required(true)
                        .help("BI service metadata database"),
                )
                .arg(Arg::new("redshift-host").long("redshift-host").env("REDSHIFT_HOST"))
                .arg(
                    Arg::new("redshift-port")
                        .long("redshift-port")
                        .env("REDSHIFT_PORT")
                        .value_parser(value_parser!(i64)),
                )
                .arg(Arg::new("redshift-user").long("redshift-user").env("REDSHIFT_USER"))
                .arg(
                    Arg::new("redshift-password")
                        .long("redshift-password")
                        .env("REDSHIFT_PASSWORD")
                        .hide_env_values(true),
                )
                .arg(Arg::new("redshift-dbname").long("redshift-dbname").env("REDSHIFT_DBNAME")),
        )
        .subcommand(
            Command::new("show")
                .about("Print one raw entity")
                .arg(
                    Arg::new("resource")
                        .required(true)
                        .help("data_sources, groups, users, queries, widgets or dashboards"),
                )
                .arg(Arg::new("key").required(true).help("Id, or slug for dashboards")),
        )
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches.get_one::<String>(id).map(String::as_str)
}

pub(crate) fn client_config(matches: &ArgMatches) -> anyhow::Result<ClientConfig> {
    let base_url = string_arg(matches, "base-url").context("--base-url or REDASH_BASE_URL is required")?;
    let api_key = string_arg(matches, "api-key").context("--api-key or REDASH_API_KEY is required")?;
    let timeout = matches.get_one::<u64>("timeout-secs").copied().unwrap_or(30);
    Ok(ClientConfig::new(base_url, api_key).with_timeout(Duration::from_secs(timeout)))
}

pub(crate) fn tenant_spec(matches: &ArgMatches) -> anyhow::Result<TenantSpec> {
    let tenant_id = *matches.get_one::<i64>("tenant-id").context("--tenant-id is required")?;
    let tenant_name = string_arg(matches, "tenant-name").context("--tenant-name is required")?;
    let template_tenant_id = *matches
        .get_one::<i64>("template-tenant-id")
        .context("--template-tenant-id is required")?;

    let template = TemplateSelector {
        slug: string_arg(matches, "template-slug").map(str::to_string),
        owner_name: string_arg(matches, "template-owner").map(str::to_string),
        owner_tenant_id: template_tenant_id,
    };
    if template.validate().is_err() {
        bail!("one of --template-slug or --template-owner is required");
    }

    let users: UserRoster = string_arg(matches, "users").unwrap_or_default().parse()?;
    Ok(TenantSpec::new(tenant_id, tenant_name, template).with_users(users))
}

pub(crate) fn provision_config(matches: &ArgMatches) -> ProvisionConfig {
    let page_size = matches
        .get_one::<usize>("page-size")
        .copied()
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let config = ProvisionConfig::default().with_page_size(page_size);
    match data_source_options(matches) {
        Some(options) => config.with_data_source_options(options),
        None => config,
    }
}

fn data_source_options(matches: &ArgMatches) -> Option<DataSourceOptions> {
    let host = string_arg(matches, "redshift-host")?;
    let port = matches.get_one::<i64>("redshift-port").copied().unwrap_or(5439);
    Some(DataSourceOptions::new(
        host,
        port,
        string_arg(matches, "redshift-user").unwrap_or_default(),
        string_arg(matches, "redshift-password").unwrap_or_default(),
        string_arg(matches, "redshift-dbname").unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> ArgMatches {
        command().try_get_matches_from(args).unwrap()
    }

    fn provision_args<'a>(extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![
            "tenantdash",
            "--base-url",
            "https://bi.example.com",
            "--api-key",
            "secret",
            "provision",
            "--tenant-id",
            "99",
            "--tenant-name",
            "Widgets Co",
            "--template-tenant-id",
            "42",
            "--database-url",
            "postgres://bi@localhost/bi",
        ];
        args.extend_from_slice(extra);
        args
    }

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_provision_by_slug() {
        let matches = parse(&provision_args(&[
            "--template-slug",
            "dashboard-acme",
            "--users",
            "ann@widgets.co,Ann",
        ]));
        let config = client_config(&matches).unwrap();
        assert_eq!(config.base_url, "https://bi.example.com");
        assert_eq!(config.timeout, Duration::from_secs(30));

        let (_, sub) = matches.subcommand().unwrap();
        let spec = tenant_spec(sub).unwrap();
        assert_eq!(spec.tenant_id, 99);
        assert_eq!(spec.template, TemplateSelector::by_slug("dashboard-acme", 42));
        assert_eq!(spec.users.len(), 1);
    }

    #[test]
    fn test_provision_needs_a_template_selector() {
        let matches = parse(&provision_args(&[]));
        let (_, sub) = matches.subcommand().unwrap();
        assert!(tenant_spec(sub).is_err());
    }

    #[test]
    fn test_bad_roster_rejected() {
        let matches = parse(&provision_args(&["--template-owner", "Acme", "--users", "nobody"]));
        let (_, sub) = matches.subcommand().unwrap();
        assert!(tenant_spec(sub).is_err());
    }

    #[test]
    fn test_data_source_options_need_host() {
        let matches = parse(&provision_args(&[
            "--template-owner",
            "Acme",
            "--redshift-host",
            "warehouse.internal",
            "--redshift-dbname",
            "shops",
            "--page-size",
            "100",
        ]));
        let (_, sub) = matches.subcommand().unwrap();
        let config = provision_config(sub);
        let options = config.data_source_options.unwrap();
        assert_eq!(options.host.as_deref(), Some("warehouse.internal"));
        assert_eq!(options.port, Some(5439));
        assert_eq!(options.dbname.as_deref(), Some("shops"));
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_show_args() {
        let matches = parse(&["tenantdash", "show", "dashboards", "dashboard-acme"]);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "show");
        assert_eq!(string_arg(sub, "resource"), Some("dashboards"));
        assert_eq!(string_arg(sub, "key"), Some("dashboard-acme"));
    }
}
