//! Publisher runs against the in-memory store and a wiremock sink

mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{record, test_config, MemoryStore};
use serde_json::{json, Value};
use std::time::Duration;
use ticktag::config::{Config, ExportTarget};
use ticktag::error::Error;
use ticktag::publisher::{HttpPublishSink, Publisher};
use ticktag::utils::error::PublishError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCHEDULES_PATH: &str = "data/schedules.json";
const TRIPS_PATH: &str = "data/trips.json";

fn store() -> MemoryStore {
    MemoryStore::new()
        .with_table(
            "Schedules",
            vec![
                record("s1", json!({"Name": "Opening", "Dirty": true})),
                record("s2", json!({"Name": "Finale", "Dirty": false})),
            ],
        )
        .with_table("Trips", vec![record("t1", json!({"Name": "Outbound"}))])
}

fn config(server: &MockServer) -> Config {
    let mut config = test_config();
    config.publisher.sink_url = Some(server.uri());
    config.publisher.sink_token = Some("sink-secret".to_string());
    config.publisher.conflict_backoff_ms = 1;
    config.publisher.max_conflict_retries = 2;
    config.publisher.exports = vec![
        format!("Schedules:Published:{SCHEDULES_PATH}").parse::<ExportTarget>().unwrap(),
        format!("Trips:Published:{TRIPS_PATH}").parse::<ExportTarget>().unwrap(),
    ];
    config
}

fn sink(config: &Config) -> HttpPublishSink {
    HttpPublishSink::from_config(&config.publisher, Duration::from_secs(5))
        .unwrap()
        .unwrap()
}

fn dirty(store: &MemoryStore, table: &str, id: &str) -> Value {
    store
        .record(table, id)
        .and_then(|r| r.fields.get("Dirty").cloned())
        .unwrap_or(Value::Null)
}

async fn mount_preflight(server: &MockServer, changed: Value, times: u64) {
    Mock::given(method("POST"))
        .and(path("/preflight"))
        .and(header("authorization", "Bearer sink-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "changed": changed })))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_commits_changed_dirty_exports() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([SCHEDULES_PATH]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .and(body_partial_json(json!({"force": false})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let config = config(&server);
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(false).await.unwrap();

    assert_eq!(report.rendered.len(), 2);
    assert_eq!(report.candidates, vec![SCHEDULES_PATH]);
    assert_eq!(report.committed, vec![SCHEDULES_PATH]);
    assert_eq!(report.cleared, 1);
    assert_eq!(dirty(&store, "Schedules", "s1"), json!(false));

    let requests = server.received_requests().await.unwrap();
    let preflight: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(preflight["files"].as_array().unwrap().len(), 1);
    assert_eq!(preflight["files"][0]["path"], json!(SCHEDULES_PATH));
    assert_eq!(preflight["files"][0]["sha256"].as_str().unwrap().len(), 64);

    let commit: Value = serde_json::from_slice(&requests[1].body).unwrap();
    let file = &commit["files"][0];
    assert_eq!(file["contentType"], json!("application/json"));
    let content = STANDARD.decode(file["content"].as_str().unwrap()).unwrap();
    let doc: Value = serde_json::from_slice(&content).unwrap();
    assert_eq!(
        doc,
        json!([{"Name": "Opening", "id": "s1"}, {"Name": "Finale", "id": "s2"}])
    );
}

#[tokio::test]
async fn test_unchanged_candidates_skip_commit_but_clear_flags() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store();
    let config = config(&server);
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(false).await.unwrap();

    assert!(report.committed.is_empty());
    assert_eq!(report.cleared, 1);
    assert_eq!(dirty(&store, "Schedules", "s1"), json!(false));
}

#[tokio::test]
async fn test_nothing_dirty_publishes_nothing() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([]), 0).await;

    let store = MemoryStore::new()
        .with_table("Schedules", vec![record("s1", json!({"Dirty": false}))])
        .with_table("Trips", vec![]);
    let config = config(&server);
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(false).await.unwrap();

    assert!(report.candidates.is_empty());
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_force_commits_everything_without_preflight() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([]), 0).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .and(body_partial_json(json!({"force": true})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let config = config(&server);
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(true).await.unwrap();

    assert_eq!(report.committed, vec![SCHEDULES_PATH, TRIPS_PATH]);
    assert_eq!(report.cleared, 1);
}

#[tokio::test]
async fn test_conflict_is_retried() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([SCHEDULES_PATH]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(409))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let config = config(&server);
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(false).await.unwrap();
    assert_eq!(report.committed, vec![SCHEDULES_PATH]);
}

#[tokio::test]
async fn test_persistent_conflict_fails_and_keeps_flags() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([SCHEDULES_PATH]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(409))
        .expect(3)
        .mount(&server)
        .await;

    let store = store();
    let config = config(&server);
    let sink = sink(&config);

    let err = Publisher::new(&store, &sink, &config).run(false).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Publish(PublishError::ConflictRetriesExhausted(3))
    ));
    assert_eq!(dirty(&store, "Schedules", "s1"), json!(true));
}

#[tokio::test]
async fn test_other_commit_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([SCHEDULES_PATH]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad path"))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let config = config(&server);
    let sink = sink(&config);

    let err = Publisher::new(&store, &sink, &config).run(false).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Publish(PublishError::Status { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_dry_run_neither_commits_nor_clears() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([SCHEDULES_PATH]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store();
    let mut config = config(&server);
    config.publisher.dry_run = true;
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(false).await.unwrap();

    assert_eq!(report.candidates, vec![SCHEDULES_PATH]);
    assert!(report.committed.is_empty());
    assert_eq!(report.cleared, 0);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_without_dirty_field_every_export_is_a_candidate() {
    let server = MockServer::start().await;
    mount_preflight(&server, json!([TRIPS_PATH]), 1).await;
    Mock::given(method("POST"))
        .and(path("/commit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store();
    let mut config = config(&server);
    config.publisher.dirty_field = None;
    let sink = sink(&config);

    let report = Publisher::new(&store, &sink, &config).run(false).await.unwrap();

    assert_eq!(report.candidates, vec![SCHEDULES_PATH, TRIPS_PATH]);
    assert_eq!(report.committed, vec![TRIPS_PATH]);
    assert_eq!(report.cleared, 0);
}
