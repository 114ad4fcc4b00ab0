//! Entity operations against the in-memory BI service

use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tenantdash_client::models::{DataSource, DataSourceOptions, Group, Query, User};
use tenantdash_client::prelude::*;
use tenantdash_client::{ApiResponse, EntityError, HttpMethod, ResourceKind};
use tenantdash_test_utils::{FakeService, ScriptedBackend, DEFAULT_GROUP_ID};

/// Listing 520 records with 250 per page takes three requests
#[tokio::test]
async fn test_paged_listing_walks_all_pages() {
    let fake = FakeService::new();
    let data_source = fake.seed_data_source("warehouse");
    let seeded: Vec<i64> = (0..520)
        .map(|i| fake.seed_query(&format!("q{i}"), data_source, "SELECT 1", &[]).0)
        .collect();

    let queries: Vec<Query> = Query::objects_paged(&fake.client(), 250, Vec::new())
        .try_collect()
        .await
        .unwrap();

    let ids: Vec<i64> = queries.iter().filter_map(|q| q.id).collect();
    assert_eq!(ids, seeded);
    assert_eq!(fake.count_requests(HttpMethod::Get, "queries"), 3);

    let pages: Vec<Option<String>> = fake
        .requests()
        .iter()
        .map(|r| r.query_param("page").map(str::to_string))
        .collect();
    assert_eq!(pages, vec![Some("1".into()), Some("2".into()), Some("3".into())]);
}

/// Nothing is requested until the stream is polled
#[tokio::test]
async fn test_paged_listing_is_lazy() {
    let fake = FakeService::new();
    let stream = User::objects_paged(&fake.client(), 250, Vec::new());
    assert!(fake.requests().is_empty());
    drop(stream);
}

/// Server-only fields survive load, save and reload
#[tokio::test]
async fn test_unknown_fields_round_trip_through_save() {
    let fake = FakeService::new();
    let client = fake.client();

    let mut data_source = DataSource::new("Widgets Co (99)", DataSourceOptions::new("wh", 5439, "u", "p", "shops"));
    data_source.save(&client).await.unwrap();
    assert!(data_source.id.is_some());
    assert_eq!(data_source.dump().unwrap()["supports_auto_limit"], json!(true));

    data_source.name = "Widgets Co (99) renamed".into();
    data_source.save(&client).await.unwrap();

    let update = fake.requests().pop().unwrap();
    let body = update.body.unwrap();
    assert_eq!(body["supports_auto_limit"], json!(true));
    assert_eq!(body["type"], json!("redshift"));
    assert_eq!(data_source.name, "Widgets Co (99) renamed");
}

/// Missing records read as `None`
#[tokio::test]
async fn test_get_missing_is_none() {
    let fake = FakeService::new();
    let client = fake.client();

    assert!(DataSource::get(&client, &999).await.unwrap().is_none());
    assert!(Dashboard::get(&client, &"nope".to_string()).await.unwrap().is_none());
}

/// Widgets cannot be read; the request is never sent
#[tokio::test]
async fn test_widget_read_unsupported() {
    let fake = FakeService::new();

    let result = ResourceKind::Widgets.get_raw(&fake.client(), "1").await;

    assert!(matches!(result, Err(EntityError::Unsupported { .. })));
    assert!(fake.requests().is_empty());
}

/// Raw reads go through the resource registry
#[tokio::test]
async fn test_raw_read_by_resource_name() {
    let fake = FakeService::new();
    let (_, slug) = fake.seed_dashboard("Dashboard - Acme");
    let client = fake.client();

    let kind: ResourceKind = "dashboards".parse().unwrap();
    let raw = kind.get_raw(&client, &slug).await.unwrap().unwrap();
    assert_eq!(raw["name"], json!("Dashboard - Acme"));

    assert!(ResourceKind::Groups.get_raw(&client, "abc").await.is_err());
}

/// Forking copies the query with fresh visualizations
#[tokio::test]
async fn test_fork_copies_visualizations() {
    let fake = FakeService::new();
    let data_source = fake.seed_data_source("warehouse");
    let (query_id, visualization_ids) = fake.seed_query(
        "Acme: Orders",
        data_source,
        "SELECT 1",
        &[("Chart", "CHART", json!({"legend": true}))],
    );
    let client = fake.client();

    let original = Query::get(&client, &query_id).await.unwrap().unwrap();
    let forked = original.fork(&client).await.unwrap();

    assert_ne!(forked.id, original.id);
    assert_eq!(forked.visualizations().len(), 1);
    assert_ne!(forked.visualizations()[0].id, Some(visualization_ids[0]));
    assert!(forked.visualizations()[0].renders_like(Some("Chart"), Some("CHART"), Some(&json!({"legend": true}))));
}

/// Grants and memberships through group sub-resources
#[tokio::test]
async fn test_group_sub_resources() {
    let fake = FakeService::new();
    let client = fake.client();
    let data_source = fake.seed_data_source("warehouse");
    let user = fake.seed_user("Ann", "ann@widgets.co", &[DEFAULT_GROUP_ID]);

    let mut group = Group::new("Widgets Co (99)");
    group.save(&client).await.unwrap();
    let group_id = group.id.unwrap();

    group.add_data_source(&client, data_source).await.unwrap();
    group.set_data_source_access(&client, data_source, true).await.unwrap();
    let granted = group.data_sources(&client).await.unwrap();
    assert_eq!(granted.len(), 1);
    assert_eq!(granted[0].view_only, Some(true));

    group.remove_data_source(&client, data_source).await.unwrap();
    assert!(group.data_sources(&client).await.unwrap().is_empty());

    group.add_member(&client, user).await.unwrap();
    assert_eq!(fake.user_groups(user), vec![DEFAULT_GROUP_ID, group_id]);
    group.remove_member(&client, user).await.unwrap();
    assert_eq!(fake.user_groups(user), vec![DEFAULT_GROUP_ID]);
}

/// Duplicate emails are rejected with a 400
#[tokio::test]
async fn test_duplicate_user_is_client_error() {
    let fake = FakeService::new();
    fake.seed_user("Ann", "ann@widgets.co", &[DEFAULT_GROUP_ID]);

    let err = User::new("Ann", "ann@widgets.co").save(&fake.client()).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(fake.count_requests(HttpMethod::Post, "users"), 1);
}

/// Dropped connections are retried
#[tokio::test]
async fn test_transport_failure_retried() {
    let backend = ScriptedBackend::new();
    backend
        .fail("connection reset")
        .respond(ApiResponse::json(&json!([{"id": 1, "name": "admin"}])));
    let client = backend.client(RetryPolicy::immediate(3));

    let groups = Group::objects(&client).await.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(backend.requests().len(), 2);
}
