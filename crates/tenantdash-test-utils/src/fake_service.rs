//! In-memory stand-in for the BI service REST API
//!
//! Routes the endpoints the client and provisioner use, keeps every record
//! as JSON, and logs each request so tests can assert on traffic.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tenantdash_client::{ApiClient, ApiError, ApiRequest, ApiResponse, HttpBackend, HttpMethod, RetryPolicy};

/// Id of the builtin group every new user joins
pub const DEFAULT_GROUP_ID: i64 = 1;

/// Timestamp stamped on every record
pub const TIMESTAMP: &str = "2024-05-01T12:00:00+00:00";

const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone)]
struct InjectedFailure {
    method: HttpMethod,
    endpoint: String,
    status: u16,
    remaining: usize,
}

#[derive(Debug)]
struct FakeState {
    next_id: i64,
    data_sources: BTreeMap<i64, Value>,
    groups: BTreeMap<i64, Value>,
    grants: BTreeMap<(i64, i64), bool>,
    users: BTreeMap<i64, Value>,
    queries: BTreeMap<i64, Value>,
    visualizations: BTreeMap<i64, (i64, Value)>,
    widgets: BTreeMap<i64, Value>,
    dashboards: BTreeMap<i64, Value>,
    requests: Vec<ApiRequest>,
    failures: Vec<InjectedFailure>,
    fork_copies_visualizations: bool,
}

/// Fake BI service backend
#[derive(Clone)]
pub struct FakeService {
    state: Arc<Mutex<FakeState>>,
}

impl fmt::Debug for FakeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FakeService")
            .field("requests", &state.requests.len())
            .field("next_id", &state.next_id)
            .finish()
    }
}

impl Default for FakeService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeService {
    /// Empty service with only the builtin default group
    pub fn new() -> Self {
        let mut state = FakeState {
            next_id: DEFAULT_GROUP_ID,
            data_sources: BTreeMap::new(),
            groups: BTreeMap::new(),
            grants: BTreeMap::new(),
            users: BTreeMap::new(),
            queries: BTreeMap::new(),
            visualizations: BTreeMap::new(),
            widgets: BTreeMap::new(),
            dashboards: BTreeMap::new(),
            requests: Vec::new(),
            failures: Vec::new(),
            fork_copies_visualizations: true,
        };
        let id = state.allocate();
        state.groups.insert(
            id,
            json!({
                "id": id,
                "name": "default",
                "type": "builtin",
                "permissions": ["view_query"],
                "created_at": TIMESTAMP,
            }),
        );
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Client talking to this service, without retry
    pub fn client(&self) -> ApiClient {
        self.client_with_retry(RetryPolicy::none())
    }

    pub fn client_with_retry(&self, retry: RetryPolicy) -> ApiClient {
        ApiClient::with_backend(Arc::new(self.clone()), retry)
    }

    /// Forks copy the query but none of its visualizations
    pub fn drop_forked_visualizations(&self) {
        self.state.lock().fork_copies_visualizations = false;
    }

    /// Answer the next `times` matching requests with `status`
    pub fn fail_next(&self, method: HttpMethod, endpoint: &str, status: u16, times: usize) {
        self.state.lock().failures.push(InjectedFailure {
            method,
            endpoint: endpoint.to_string(),
            status,
            remaining: times,
        });
    }

    // ---- seeding ----

    pub fn seed_data_source(&self, name: &str) -> i64 {
        let mut state = self.state.lock();
        state.create_data_source(json!({"name": name, "type": "redshift", "options": {}}))
    }

    pub fn seed_group(&self, name: &str) -> i64 {
        let mut state = self.state.lock();
        state.create_group(json!({"name": name}))
    }

    pub fn seed_user(&self, name: &str, email: &str, group_ids: &[i64]) -> i64 {
        let mut state = self.state.lock();
        let id = state.allocate();
        state.users.insert(id, user_record(id, name, email, group_ids));
        id
    }

    /// Seed a query with visualizations `(name, type, options)`
    ///
    /// Returns the query id and the visualization ids in order.
    pub fn seed_query(
        &self,
        name: &str,
        data_source_id: i64,
        text: &str,
        visualizations: &[(&str, &str, Value)],
    ) -> (i64, Vec<i64>) {
        let mut state = self.state.lock();
        let id = state.create_query(json!({
            "name": name,
            "data_source_id": data_source_id,
            "query": text,
            "is_draft": false,
        }));
        let vis_ids = visualizations
            .iter()
            .map(|(vis_name, kind, options)| state.add_visualization(id, vis_name, kind, options.clone()))
            .collect();
        (id, vis_ids)
    }

    /// Seed a dashboard; returns id and slug
    pub fn seed_dashboard(&self, name: &str) -> (i64, String) {
        let mut state = self.state.lock();
        let dashboard = state.create_dashboard(json!({"name": name, "is_draft": false}));
        let id = dashboard["id"].as_i64().unwrap_or_default();
        let slug = dashboard["slug"].as_str().unwrap_or_default().to_string();
        (id, slug)
    }

    /// Seed a widget showing a visualization, or text when `None`
    pub fn seed_widget(&self, dashboard_id: i64, visualization_id: Option<i64>, text: &str) -> i64 {
        let mut state = self.state.lock();
        let widget = state.create_widget(json!({
            "dashboard_id": dashboard_id,
            "visualization_id": visualization_id,
            "text": text,
            "width": 1,
            "options": {"position": {"col": 0, "row": 0, "sizeX": 3, "sizeY": 8}},
        }));
        widget["id"].as_i64().unwrap_or_default()
    }

    // ---- inspection ----

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.lock().requests.clone()
    }

    /// Count requests with this method and exact endpoint
    pub fn count_requests(&self, method: HttpMethod, endpoint: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .count()
    }

    /// Count requests with this method whose endpoint ends with `suffix`
    pub fn count_requests_ending(&self, method: HttpMethod, suffix: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.endpoint.ends_with(suffix))
            .count()
    }

    pub fn data_sources(&self) -> Vec<Value> {
        self.state.lock().data_sources.values().cloned().collect()
    }

    pub fn data_sources_named(&self, name: &str) -> Vec<Value> {
        self.data_sources()
            .into_iter()
            .filter(|d| d["name"] == name)
            .collect()
    }

    pub fn groups(&self) -> Vec<Value> {
        self.state.lock().groups.values().cloned().collect()
    }

    /// View-only flag of a grant, `None` when not granted
    pub fn grant(&self, group_id: i64, data_source_id: i64) -> Option<bool> {
        self.state.lock().grants.get(&(group_id, data_source_id)).copied()
    }

    pub fn user(&self, id: i64) -> Option<Value> {
        self.state.lock().users.get(&id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<Value> {
        self.state
            .lock()
            .users
            .values()
            .find(|u| u["email"] == email)
            .cloned()
    }

    /// Group ids of a user
    pub fn user_groups(&self, id: i64) -> Vec<i64> {
        self.user(id)
            .and_then(|u| u["groups"].as_array().cloned())
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_i64)
            .collect()
    }

    /// Query with its visualizations
    pub fn query(&self, id: i64) -> Option<Value> {
        let state = self.state.lock();
        state.queries.contains_key(&id).then(|| state.query_json(id))
    }

    pub fn queries(&self) -> Vec<Value> {
        let state = self.state.lock();
        state.queries.keys().map(|id| state.query_json(*id)).collect()
    }

    /// Id of the query owning a visualization
    pub fn visualization_query(&self, visualization_id: i64) -> Option<i64> {
        self.state
            .lock()
            .visualizations
            .get(&visualization_id)
            .map(|(query_id, _)| *query_id)
    }

    pub fn dashboards(&self) -> Vec<Value> {
        self.state.lock().dashboards.values().cloned().collect()
    }

    pub fn dashboard_named(&self, name: &str) -> Option<Value> {
        self.dashboards().into_iter().find(|d| d["name"] == name)
    }

    /// Widgets placed on a dashboard, in id order
    pub fn widgets_of(&self, dashboard_id: i64) -> Vec<Value> {
        self.state
            .lock()
            .widgets
            .values()
            .filter(|w| w["dashboard_id"] == dashboard_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HttpBackend for FakeService {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());

        if let Some(status) = state.take_failure(request) {
            return Ok(ApiResponse::new(status, json!({"message": "injected failure"}).to_string()));
        }

        Ok(state.route(request))
    }
}

impl FakeState {
    fn allocate(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn take_failure(&mut self, request: &ApiRequest) -> Option<u16> {
        let failure = self.failures.iter_mut().find(|f| {
            f.remaining > 0 && f.method == request.method && f.endpoint == request.endpoint
        })?;
        failure.remaining -= 1;
        Some(failure.status)
    }

    fn route(&mut self, request: &ApiRequest) -> ApiResponse {
        let parts: Vec<&str> = request.endpoint.trim_matches('/').split('/').collect();
        let body = request.body.clone().unwrap_or_else(|| json!({}));
        let id = |i: usize| parts.get(i).and_then(|s| s.parse::<i64>().ok());

        match (request.method, parts.as_slice()) {
            // data sources
            (HttpMethod::Get, ["data_sources"]) => ok(&Value::Array(self.data_sources.values().cloned().collect())),
            (HttpMethod::Post, ["data_sources"]) => {
                let id = self.create_data_source(body);
                ok(&self.data_sources[&id])
            }
            (HttpMethod::Get, ["data_sources", _]) => found(id(1).and_then(|i| self.data_sources.get(&i))),
            (HttpMethod::Post, ["data_sources", _]) => {
                let Some(record) = id(1).and_then(|i| self.data_sources.get_mut(&i)) else {
                    return not_found();
                };
                merge(record, &body, &["id"]);
                ok(record)
            }
            (HttpMethod::Delete, ["data_sources", _]) => match id(1) {
                Some(i) if self.data_sources.contains_key(&i) => {
                    self.delete_data_source(i);
                    no_content()
                }
                _ => not_found(),
            },

            // groups
            (HttpMethod::Get, ["groups"]) => ok(&Value::Array(self.groups.values().cloned().collect())),
            (HttpMethod::Post, ["groups"]) => {
                let id = self.create_group(body);
                ok(&self.groups[&id])
            }
            (HttpMethod::Get, ["groups", _]) => found(id(1).and_then(|i| self.groups.get(&i))),
            (HttpMethod::Post, ["groups", _]) => {
                let Some(record) = id(1).and_then(|i| self.groups.get_mut(&i)) else {
                    return not_found();
                };
                merge(record, &body, &["id", "type", "permissions"]);
                ok(record)
            }
            (HttpMethod::Delete, ["groups", _]) => match id(1).and_then(|i| self.groups.remove(&i)) {
                Some(_) => no_content(),
                None => not_found(),
            },
            (HttpMethod::Get, ["groups", _, "data_sources"]) => {
                let Some(group_id) = id(1).filter(|i| self.groups.contains_key(i)) else {
                    return not_found();
                };
                let granted: Vec<Value> = self
                    .grants
                    .iter()
                    .filter(|((g, _), _)| *g == group_id)
                    .filter_map(|((_, ds), view_only)| {
                        self.data_sources.get(ds).map(|d| {
                            let mut d = d.clone();
                            d["view_only"] = json!(view_only);
                            d
                        })
                    })
                    .collect();
                ok(&Value::Array(granted))
            }
            (HttpMethod::Post, ["groups", _, "data_sources"]) => {
                let (Some(group_id), Some(ds)) = (id(1), body["data_source_id"].as_i64()) else {
                    return bad_request("data_source_id required");
                };
                if !self.groups.contains_key(&group_id) || !self.data_sources.contains_key(&ds) {
                    return not_found();
                }
                self.grants.insert((group_id, ds), false);
                ok(&self.data_sources[&ds])
            }
            (HttpMethod::Post, ["groups", _, "data_sources", _]) => {
                let key = (id(1).unwrap_or_default(), id(3).unwrap_or_default());
                let Some(flag) = self.grants.get_mut(&key) else {
                    return not_found();
                };
                *flag = body["view_only"].as_bool().unwrap_or(false);
                ok(&self.data_sources[&key.1])
            }
            (HttpMethod::Delete, ["groups", _, "data_sources", _]) => {
                let key = (id(1).unwrap_or_default(), id(3).unwrap_or_default());
                match self.grants.remove(&key) {
                    Some(_) => no_content(),
                    None => not_found(),
                }
            }
            (HttpMethod::Post, ["groups", _, "members"]) => {
                let (Some(group_id), Some(user_id)) = (id(1), body["user_id"].as_i64()) else {
                    return bad_request("user_id required");
                };
                let Some(user) = self.users.get_mut(&user_id) else {
                    return not_found();
                };
                let groups = user["groups"].as_array_mut();
                if let Some(groups) = groups {
                    if !groups.contains(&json!(group_id)) {
                        groups.push(json!(group_id));
                    }
                }
                ok(user)
            }
            (HttpMethod::Delete, ["groups", _, "members", _]) => {
                let (Some(group_id), Some(user_id)) = (id(1), id(3)) else {
                    return not_found();
                };
                let Some(user) = self.users.get_mut(&user_id) else {
                    return not_found();
                };
                if let Some(groups) = user["groups"].as_array_mut() {
                    groups.retain(|g| *g != json!(group_id));
                }
                no_content()
            }

            // users
            (HttpMethod::Get, ["users"]) => {
                let users: Vec<Value> = self
                    .users
                    .values()
                    .filter(|u| matches_filter(request, u, &["email", "name"]))
                    .cloned()
                    .collect();
                page(request, users)
            }
            (HttpMethod::Post, ["users"]) => {
                let (Some(name), Some(email)) = (body["name"].as_str(), body["email"].as_str()) else {
                    return bad_request("name and email required");
                };
                if self.users.values().any(|u| u["email"] == email) {
                    return bad_request("Email already taken.");
                }
                let id = self.allocate();
                let record = user_record(id, name, email, &[DEFAULT_GROUP_ID]);
                self.users.insert(id, record.clone());
                ok(&record)
            }
            (HttpMethod::Get, ["users", _]) => found(id(1).and_then(|i| self.users.get(&i))),
            (HttpMethod::Post, ["users", _]) => {
                let Some(record) = id(1).and_then(|i| self.users.get_mut(&i)) else {
                    return not_found();
                };
                if let Some(group_ids) = body.get("group_ids").filter(|g| g.is_array()) {
                    record["groups"] = group_ids.clone();
                }
                for key in ["name", "email"] {
                    if let Some(value) = body.get(key).filter(|v| v.is_string()) {
                        record[key] = value.clone();
                    }
                }
                ok(record)
            }
            (HttpMethod::Delete, ["users", _]) => match id(1).and_then(|i| self.users.remove(&i)) {
                Some(_) => no_content(),
                None => not_found(),
            },

            // queries
            (HttpMethod::Get, ["queries"]) => {
                let queries: Vec<Value> = self
                    .queries
                    .iter()
                    .filter(|(_, q)| matches_filter(request, q, &["name", "query"]))
                    .map(|(id, _)| self.query_json(*id))
                    .collect();
                page(request, queries)
            }
            (HttpMethod::Post, ["queries"]) => {
                let id = self.create_query(body);
                ok(&self.query_json(id))
            }
            (HttpMethod::Get, ["queries", _]) => match id(1).filter(|i| self.queries.contains_key(i)) {
                Some(i) => ok(&self.query_json(i)),
                None => not_found(),
            },
            (HttpMethod::Post, ["queries", _]) => {
                let Some(query_id) = id(1).filter(|i| self.queries.contains_key(i)) else {
                    return not_found();
                };
                if let Some(record) = self.queries.get_mut(&query_id) {
                    merge(
                        record,
                        &body,
                        &["id", "visualizations", "user", "last_modified_by", "version"],
                    );
                    let version = record["version"].as_i64().unwrap_or(0);
                    record["version"] = json!(version + 1);
                }
                ok(&self.query_json(query_id))
            }
            (HttpMethod::Post, ["queries", _, "fork"]) => match id(1).filter(|i| self.queries.contains_key(i)) {
                Some(source) => {
                    let forked = self.fork_query(source);
                    ok(&self.query_json(forked))
                }
                None => not_found(),
            },
            (HttpMethod::Delete, ["queries", _]) => match id(1).filter(|i| self.queries.contains_key(i)) {
                Some(i) => {
                    self.delete_query(i);
                    no_content()
                }
                None => not_found(),
            },

            // widgets
            (HttpMethod::Post, ["widgets"]) => {
                if !body["dashboard_id"]
                    .as_i64()
                    .is_some_and(|d| self.dashboards.contains_key(&d))
                {
                    return bad_request("unknown dashboard");
                }
                let widget = self.create_widget(body);
                ok(&widget)
            }
            (HttpMethod::Post, ["widgets", _]) => {
                let Some(widget_id) = id(1).filter(|i| self.widgets.contains_key(i)) else {
                    return not_found();
                };
                if let Some(record) = self.widgets.get_mut(&widget_id) {
                    merge(record, &body, &["id", "visualization", "dashboard_id"]);
                }
                ok(&self.widget_json(widget_id))
            }
            (HttpMethod::Delete, ["widgets", _]) => match id(1).and_then(|i| self.widgets.remove(&i)) {
                Some(_) => no_content(),
                None => not_found(),
            },

            // dashboards
            (HttpMethod::Get, ["dashboards"]) => {
                let dashboards: Vec<Value> = self
                    .dashboards
                    .values()
                    .filter(|d| matches_filter(request, d, &["name"]))
                    .cloned()
                    .collect();
                page(request, dashboards)
            }
            (HttpMethod::Post, ["dashboards"]) => {
                let dashboard = self.create_dashboard(body);
                ok(&dashboard)
            }
            (HttpMethod::Get, ["dashboards", slug]) => match self.dashboard_by_slug(slug) {
                Some(i) => ok(&self.dashboard_json(i)),
                None => not_found(),
            },
            (HttpMethod::Post, ["dashboards", _]) => {
                let Some(record) = id(1).and_then(|i| self.dashboards.get_mut(&i)) else {
                    return not_found();
                };
                merge(record, &body, &["id", "slug", "widgets", "layout", "user", "version"]);
                let version = record["version"].as_i64().unwrap_or(0);
                record["version"] = json!(version + 1);
                ok(record)
            }
            (HttpMethod::Delete, ["dashboards", slug]) => match self.dashboard_by_slug(slug) {
                Some(i) => {
                    self.dashboards.remove(&i);
                    self.widgets.retain(|_, w| w["dashboard_id"] != i);
                    no_content()
                }
                None => not_found(),
            },

            _ => not_found(),
        }
    }

    fn create_data_source(&mut self, body: Value) -> i64 {
        let id = self.allocate();
        let mut record = body;
        record["id"] = json!(id);
        if record["type"].is_null() {
            record["type"] = json!("redshift");
        }
        record["paused"] = json!(0);
        record["pause_reason"] = Value::Null;
        record["syntax"] = json!("sql");
        record["supports_auto_limit"] = json!(true);
        self.data_sources.insert(id, record);
        id
    }

    fn delete_data_source(&mut self, id: i64) {
        self.data_sources.remove(&id);
        self.grants.retain(|(_, ds), _| *ds != id);
        let orphaned: Vec<i64> = self
            .queries
            .iter()
            .filter(|(_, q)| q["data_source_id"] == id)
            .map(|(qid, _)| *qid)
            .collect();
        for query_id in orphaned {
            self.delete_query(query_id);
        }
    }

    fn create_group(&mut self, body: Value) -> i64 {
        let id = self.allocate();
        let mut record = body;
        record["id"] = json!(id);
        record["type"] = json!("regular");
        record["permissions"] = json!(["create_dashboard", "create_query", "view_query"]);
        record["created_at"] = json!(TIMESTAMP);
        self.groups.insert(id, record);
        id
    }

    fn create_query(&mut self, body: Value) -> i64 {
        let id = self.allocate();
        let mut record = body;
        strip(&mut record, &["visualizations", "user", "last_modified_by"]);
        record["id"] = json!(id);
        if record["is_archived"].is_null() {
            record["is_archived"] = json!(false);
        }
        record["version"] = json!(1);
        record["created_at"] = json!(TIMESTAMP);
        record["updated_at"] = json!(TIMESTAMP);
        record["runtime"] = json!(0.25);
        self.queries.insert(id, record);
        id
    }

    fn fork_query(&mut self, source: i64) -> i64 {
        let mut record = self.queries[&source].clone();
        let id = self.allocate();
        let name = record["name"].as_str().unwrap_or_default().to_string();
        record["id"] = json!(id);
        record["name"] = json!(format!("Copy of (#{source}) {name}"));
        record["is_draft"] = json!(true);
        record["version"] = json!(1);
        self.queries.insert(id, record);

        if self.fork_copies_visualizations {
            let copies: Vec<Value> = self
                .visualizations
                .values()
                .filter(|(query_id, _)| *query_id == source)
                .map(|(_, v)| v.clone())
                .collect();
            for vis in copies {
                let name = vis["name"].as_str().unwrap_or_default().to_string();
                let kind = vis["type"].as_str().unwrap_or_default().to_string();
                self.add_visualization(id, &name, &kind, vis["options"].clone());
            }
        }
        id
    }

    fn delete_query(&mut self, id: i64) {
        self.queries.remove(&id);
        self.visualizations.retain(|_, (query_id, _)| *query_id != id);
    }

    fn add_visualization(&mut self, query_id: i64, name: &str, kind: &str, options: Value) -> i64 {
        let id = self.allocate();
        self.visualizations.insert(
            id,
            (
                query_id,
                json!({
                    "id": id,
                    "name": name,
                    "type": kind,
                    "options": options,
                    "description": "",
                    "created_at": TIMESTAMP,
                    "updated_at": TIMESTAMP,
                }),
            ),
        );
        id
    }

    fn query_json(&self, id: i64) -> Value {
        let mut record = self.queries.get(&id).cloned().unwrap_or(Value::Null);
        let visualizations: Vec<Value> = self
            .visualizations
            .values()
            .filter(|(query_id, _)| *query_id == id)
            .map(|(_, v)| v.clone())
            .collect();
        record["visualizations"] = Value::Array(visualizations);
        record
    }

    fn create_widget(&mut self, body: Value) -> Value {
        let id = self.allocate();
        let mut record = body;
        strip(&mut record, &["visualization"]);
        record["id"] = json!(id);
        record["created_at"] = json!(TIMESTAMP);
        record["updated_at"] = json!(TIMESTAMP);
        self.widgets.insert(id, record);
        self.widget_json(id)
    }

    fn widget_json(&self, id: i64) -> Value {
        let mut record = self.widgets.get(&id).cloned().unwrap_or(Value::Null);
        if let Some((query_id, vis)) = record["visualization_id"]
            .as_i64()
            .and_then(|v| self.visualizations.get(&v))
        {
            let mut vis = vis.clone();
            vis["query"] = self.query_json(*query_id);
            record["visualization"] = vis;
        }
        record
    }

    fn create_dashboard(&mut self, body: Value) -> Value {
        let id = self.allocate();
        let mut record = body;
        strip(&mut record, &["widgets", "layout"]);
        let name = record["name"].as_str().unwrap_or_default().to_string();
        let mut slug = slugify(&name);
        if self.dashboard_by_slug(&slug).is_some() {
            slug = format!("{slug}-{id}");
        }
        record["id"] = json!(id);
        record["slug"] = json!(slug);
        record["user_id"] = json!(1);
        record["version"] = json!(1);
        record["is_archived"] = json!(false);
        record["created_at"] = json!(TIMESTAMP);
        record["updated_at"] = json!(TIMESTAMP);
        record["public_url"] = Value::Null;
        for (key, default) in [("is_draft", true), ("can_edit", true), ("dashboard_filters_enabled", false)] {
            if record[key].is_null() {
                record[key] = json!(default);
            }
        }
        self.dashboards.insert(id, record.clone());
        record
    }

    fn dashboard_by_slug(&self, slug: &str) -> Option<i64> {
        self.dashboards
            .iter()
            .find(|(_, d)| d["slug"] == slug)
            .map(|(id, _)| *id)
    }

    fn dashboard_json(&self, id: i64) -> Value {
        let mut record = self.dashboards.get(&id).cloned().unwrap_or(Value::Null);
        let widgets: Vec<Value> = self
            .widgets
            .iter()
            .filter(|(_, w)| w["dashboard_id"] == id)
            .map(|(wid, _)| self.widget_json(*wid))
            .collect();
        record["widgets"] = Value::Array(widgets);
        record["layout"] = json!([]);
        record
    }
}

fn user_record(id: i64, name: &str, email: &str, group_ids: &[i64]) -> Value {
    json!({
        "id": id,
        "name": name,
        "email": email,
        "groups": group_ids,
        "auth_type": "password",
        "is_disabled": false,
        "is_invitation_pending": true,
        "is_email_verified": false,
        "profile_image_url": "https://www.gravatar.com/avatar/0",
        "created_at": TIMESTAMP,
        "updated_at": TIMESTAMP,
        "disabled_at": null,
        "active_at": null,
    })
}

fn merge(record: &mut Value, body: &Value, protected: &[&str]) {
    let (Some(record), Some(body)) = (record.as_object_mut(), body.as_object()) else {
        return;
    };
    for (key, value) in body {
        if !protected.contains(&key.as_str()) {
            record.insert(key.clone(), value.clone());
        }
    }
}

fn strip(record: &mut Value, keys: &[&str]) {
    if let Some(map) = record.as_object_mut() {
        for key in keys {
            map.remove(*key);
        }
    }
}

fn matches_filter(request: &ApiRequest, record: &Value, keys: &[&str]) -> bool {
    let Some(q) = request.query_param("q") else {
        return true;
    };
    let needle = q.to_lowercase();
    keys.iter().any(|key| {
        record[*key]
            .as_str()
            .is_some_and(|v| v.to_lowercase().contains(&needle))
    })
}

fn page(request: &ApiRequest, items: Vec<Value>) -> ApiResponse {
    let page: usize = request
        .query_param("page")
        .and_then(|p| p.parse().ok())
        .filter(|p| *p > 0)
        .unwrap_or(1);
    let size: usize = request
        .query_param("page_size")
        .and_then(|p| p.parse().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let count = items.len();
    let results: Vec<Value> = items.into_iter().skip((page - 1) * size).take(size).collect();

    let mut envelope = Map::new();
    envelope.insert("count".into(), json!(count));
    envelope.insert("page".into(), json!(page));
    envelope.insert("page_size".into(), json!(size));
    envelope.insert("results".into(), Value::Array(results));
    ok(&Value::Object(envelope))
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn ok(value: &Value) -> ApiResponse {
    ApiResponse::json(value)
}

fn found(value: Option<&Value>) -> ApiResponse {
    value.map_or_else(not_found, ok)
}

fn no_content() -> ApiResponse {
    ApiResponse::new(204, "")
}

fn not_found() -> ApiResponse {
    ApiResponse::new(404, json!({"message": "Not found"}).to_string())
}

fn bad_request(message: &str) -> ApiResponse {
    ApiResponse::new(400, json!({"message": message}).to_string())
}
