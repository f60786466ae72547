// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

// Integration tests for the Elasticsearch backed services.
// Each test starts an in-process stand-in for the cluster REST API on a random port.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use kbn_server::config::ElasticsearchConfig;
use kbn_server::errors::ApiError;
use kbn_server::models::role::{KibanaPrivileges, RolePayload, SpacePrivileges};
use kbn_server::models::saved_objects::{BulkCreateObject, BulkCreateOptions};
use kbn_server::plugins::canvas::usage::CanvasUsageCollector;
use kbn_server::services::elasticsearch::EsClient;
use kbn_server::services::license::{LicenseService, SecurityLicense};
use kbn_server::services::saved_objects::{EsSavedObjectsRepository, SavedObjectsClient};
use kbn_server::services::security::RoleService;
use kbn_server::services::usage::UsageCollector;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

#[derive(Default)]
struct Cluster {
    roles: HashMap<String, Value>,
    docs: HashMap<String, (u64, Value)>,
    refresh: Vec<String>,
    authorization: Vec<String>,
    security_enabled: bool,
}

type Shared = Arc<Mutex<Cluster>>;

async fn get_role(
    State(cluster): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let mut cluster = cluster.lock().await;
    if let Some(auth) = headers.get("authorization").and_then(|h| h.to_str().ok()) {
        cluster.authorization.push(auth.to_string());
    }
    match cluster.roles.get(&name) {
        Some(role) => (StatusCode::OK, Json(json!({ name: role }))),
        None => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

async fn put_role(
    State(cluster): State<Shared>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if name == "reserved" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {"type": "illegal_argument_exception", "reason": "role [reserved] is reserved"},
                "status": 400
            })),
        );
    }
    cluster.lock().await.roles.insert(name, body);
    (StatusCode::OK, Json(json!({"role": {"created": true}})))
}

async fn bulk(
    State(cluster): State<Shared>,
    Path(index): Path<String>,
    axum::extract::Query(params): axum::extract::Query<HashMap<String, String>>,
    body: String,
) -> Json<Value> {
    let mut cluster = cluster.lock().await;
    cluster
        .refresh
        .push(params.get("refresh").cloned().unwrap_or_default());

    let lines: Vec<Value> = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    let mut items = Vec::new();
    for pair in lines.chunks(2) {
        let (method, meta) = pair[0].as_object().unwrap().iter().next().unwrap();
        let id = meta["_id"].as_str().unwrap().to_string();
        let key = format!("{index}/{id}");

        if method == "create" && cluster.docs.contains_key(&key) {
            items.push(json!({ method.clone(): {
                "_id": id,
                "status": 409,
                "error": {"type": "version_conflict_engine_exception", "reason": "document already exists"}
            }}));
            continue;
        }

        let version = cluster.docs.get(&key).map(|(v, _)| v + 1).unwrap_or(1);
        cluster.docs.insert(key, (version, pair[1].clone()));
        items.push(json!({ method.clone(): {"_id": id, "_version": version, "status": 201}}));
    }

    Json(json!({"took": 1, "errors": false, "items": items}))
}

async fn search(State(cluster): State<Shared>, Path(index): Path<String>) -> Json<Value> {
    let cluster = cluster.lock().await;
    let hits: Vec<Value> = cluster
        .docs
        .iter()
        .filter(|(key, (_, source))| {
            key.starts_with(&format!("{index}/")) && source["type"] == "canvas-workpad"
        })
        .map(|(_, (_, source))| json!({"_source": source}))
        .collect();
    Json(json!({"hits": {"total": hits.len(), "hits": hits}}))
}

async fn xpack(State(cluster): State<Shared>) -> Json<Value> {
    let enabled = cluster.lock().await.security_enabled;
    Json(json!({"features": {"security": {"available": true, "enabled": enabled}}}))
}

async fn start_cluster(security_enabled: bool) -> (Shared, ElasticsearchConfig) {
    let cluster: Shared = Arc::new(Mutex::new(Cluster {
        security_enabled,
        ..Default::default()
    }));

    let app = Router::new()
        .route("/_security/role/{name}", get(get_role).put(put_role))
        .route("/_xpack", get(xpack))
        .route("/{index}/_bulk", post(bulk))
        .route("/{index}/_search", post(search))
        .with_state(cluster.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ElasticsearchConfig {
        url: Url::parse(&format!("http://{addr}")).unwrap(),
        username: Some("elastic".to_string()),
        password: Some("changeme".to_string()),
        shard_timeout_ms: 30_000,
        request_timeout: Duration::from_secs(5),
        api_version: "master".to_string(),
    };
    (cluster, config)
}

fn object(object_type: &str, id: Option<&str>, attributes: Value) -> BulkCreateObject {
    serde_json::from_value(json!({
        "type": object_type,
        "id": id,
        "attributes": attributes,
    }))
    .unwrap()
}

#[tokio::test]
async fn test_put_role_merges_with_stored_applications() {
    let (cluster, config) = start_cluster(true).await;
    cluster.lock().await.roles.insert(
        "analyst".to_string(),
        json!({
            "cluster": ["all"],
            "applications": [
                {"application": "kibana-.kibana", "privileges": ["all"], "resources": ["*"]},
                {"application": "logstash", "privileges": ["read"], "resources": ["pipelines"]}
            ]
        }),
    );

    let es = Arc::new(EsClient::new(&config).unwrap());
    let roles = RoleService::new(es, "kibana-.kibana".to_string());

    let payload = RolePayload {
        kibana: Some(KibanaPrivileges {
            global: Some(vec!["read".to_string()]),
            space: Some(SpacePrivileges(vec![
                ("sales".to_string(), vec!["all".to_string()]),
                ("hr".to_string(), vec!["read".to_string()]),
            ])),
        }),
        ..Default::default()
    };
    roles.put_role("analyst", &payload).await.unwrap();

    let cluster = cluster.lock().await;
    assert_eq!(
        cluster.roles["analyst"],
        json!({
            "applications": [
                {"application": "logstash", "privileges": ["read"], "resources": ["pipelines"]},
                {"application": "kibana-.kibana", "privileges": ["read"], "resources": ["*"]},
                {"application": "kibana-.kibana", "privileges": ["all"], "resources": ["space:sales"]},
                {"application": "kibana-.kibana", "privileges": ["read"], "resources": ["space:hr"]}
            ]
        })
    );
    assert!(cluster
        .authorization
        .iter()
        .all(|auth| auth.starts_with("Basic ")));
}

#[tokio::test]
async fn test_put_role_creates_missing_role() {
    let (cluster, config) = start_cluster(true).await;
    let roles = RoleService::new(
        Arc::new(EsClient::new(&config).unwrap()),
        "kibana-.kibana".to_string(),
    );

    roles.put_role("viewer", &RolePayload::default()).await.unwrap();

    assert_eq!(cluster.lock().await.roles["viewer"], json!({}));
}

#[tokio::test]
async fn test_put_role_surfaces_cluster_error() {
    let (_cluster, config) = start_cluster(true).await;
    let roles = RoleService::new(
        Arc::new(EsClient::new(&config).unwrap()),
        "kibana-.kibana".to_string(),
    );

    let err = roles
        .put_role("reserved", &RolePayload::default())
        .await
        .unwrap_err();

    match err {
        ApiError::Remote { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "role [reserved] is reserved");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_bulk_create_reports_conflicts_without_overwrite() {
    let (cluster, config) = start_cluster(true).await;
    let repository =
        EsSavedObjectsRepository::new(Arc::new(EsClient::new(&config).unwrap()), ".kibana".to_string());

    let first = repository
        .bulk_create(
            vec![
                object("index-pattern", Some("logs"), json!({"title": "logs-*"})),
                object("dashboard", None, json!({"title": "Overview"})),
            ],
            BulkCreateOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(first.saved_objects.len(), 2);
    assert_eq!(first.saved_objects[0].id, "logs");
    assert_eq!(first.saved_objects[0].version, Some(1));
    assert!(!first.saved_objects[1].id.is_empty());

    let second = repository
        .bulk_create(
            vec![object("index-pattern", Some("logs"), json!({"title": "other"}))],
            BulkCreateOptions::default(),
        )
        .await
        .unwrap();
    let conflict = &second.saved_objects[0];
    assert_eq!(conflict.error.as_ref().unwrap().status_code, 409);
    assert!(conflict.attributes.is_none());

    let cluster = cluster.lock().await;
    let (_, stored) = &cluster.docs[".kibana/index-pattern:logs"];
    assert_eq!(stored["index-pattern"]["title"], "logs-*");
    assert_eq!(stored["type"], "index-pattern");
    assert_eq!(cluster.refresh, vec!["wait_for", "wait_for"]);
}

#[tokio::test]
async fn test_bulk_create_overwrites_existing_objects() {
    let (cluster, config) = start_cluster(true).await;
    let repository =
        EsSavedObjectsRepository::new(Arc::new(EsClient::new(&config).unwrap()), ".kibana".to_string());
    let overwrite = BulkCreateOptions { overwrite: true };

    repository
        .bulk_create(vec![object("config", Some("7.0.0"), json!({"theme": "light"}))], overwrite)
        .await
        .unwrap();
    let response = repository
        .bulk_create(vec![object("config", Some("7.0.0"), json!({"theme": "dark"}))], overwrite)
        .await
        .unwrap();

    let saved = &response.saved_objects[0];
    assert!(saved.error.is_none());
    assert_eq!(saved.version, Some(2));
    assert_eq!(
        saved.attributes,
        Some(Map::from_iter([("theme".to_string(), json!("dark"))]))
    );
    assert_eq!(
        cluster.lock().await.docs[".kibana/config:7.0.0"].1["config"]["theme"],
        "dark"
    );
}

#[tokio::test]
async fn test_empty_bulk_create_skips_cluster() {
    let (cluster, config) = start_cluster(true).await;
    let repository =
        EsSavedObjectsRepository::new(Arc::new(EsClient::new(&config).unwrap()), ".kibana".to_string());

    let response = repository
        .bulk_create(Vec::new(), BulkCreateOptions::default())
        .await
        .unwrap();

    assert!(response.saved_objects.is_empty());
    assert!(cluster.lock().await.refresh.is_empty());
}

#[tokio::test]
async fn test_license_refresh_reads_xpack_info() {
    let (cluster, config) = start_cluster(false).await;
    let license = LicenseService::new(Arc::new(EsClient::new(&config).unwrap()));
    assert_eq!(license.current().await, SecurityLicense::Unknown);

    assert_eq!(license.refresh().await, SecurityLicense::Disabled);

    cluster.lock().await.security_enabled = true;
    assert_eq!(license.refresh().await, SecurityLicense::Enabled);
    assert_eq!(license.current().await, SecurityLicense::Enabled);
}

#[tokio::test]
async fn test_canvas_usage_from_stored_workpads() {
    let (_cluster, config) = start_cluster(true).await;
    let es = Arc::new(EsClient::new(&config).unwrap());
    let repository = EsSavedObjectsRepository::new(es.clone(), ".kibana".to_string());
    let collector = CanvasUsageCollector::new(es, ".kibana".to_string());

    assert!(collector.fetch().await.unwrap().is_none());

    repository
        .bulk_create(
            vec![object(
                "canvas-workpad",
                Some("workpad-1"),
                json!({"pages": [{"elements": [{"expression": "demodata | pointseries | render"}]}]}),
            )],
            BulkCreateOptions::default(),
        )
        .await
        .unwrap();

    let usage = collector.fetch().await.unwrap().unwrap();
    assert_eq!(usage["workpads"]["total"], 1);
    assert_eq!(usage["functions"]["total"], 3);
    assert_eq!(
        usage["functions"]["in_use"],
        json!(["demodata", "pointseries", "render"])
    );
}
