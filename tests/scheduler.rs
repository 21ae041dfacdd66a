mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::MemoryStore;
use treasury_auction_ingest::models::{RunType, UpdateStatus};
use treasury_auction_ingest::services::cache::SnapshotCache;
use treasury_auction_ingest::services::pipeline::Pipeline;
use treasury_auction_ingest::services::scheduler::{Scheduler, TriggerOutcome};
use treasury_auction_ingest::services::treasury::{FetchClient, FetchQuery};

fn body() -> serde_json::Value {
    json!({
        "securityList": [{
            "cusip": "912797KA4",
            "securityType": "Bill",
            "auctionDate": "2024-06-10T00:00:00",
            "bidToCoverRatio": "2.6"
        }]
    })
}

fn scheduler(server: &MockServer, store: Arc<MemoryStore>, dir: &tempfile::TempDir) -> Arc<Scheduler<MemoryStore>> {
    let pipeline = Pipeline::new(
        store,
        FetchClient::new(server.uri()).unwrap(),
        SnapshotCache::new(dir.path().join("cache.json")),
        FetchQuery {
            start_date: None,
            end_date: None,
            page_size: 100,
            max_records: 1_000,
        },
    );
    Arc::new(Scheduler::new(Arc::new(pipeline), "0 0 18 * * *"))
}

#[tokio::test]
async fn trigger_while_running_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let scheduler = scheduler(&server, store.clone(), &dir);

    let _held = scheduler.latch().try_begin().unwrap();
    let outcome = scheduler.trigger(RunType::Scheduled).await;
    assert!(matches!(outcome, TriggerOutcome::Skipped));
    assert!(store.updates().is_empty());
}

#[tokio::test]
async fn overlapping_triggers_run_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body())
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let scheduler = scheduler(&server, store.clone(), &dir);

    let first = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.trigger(RunType::Scheduled).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = scheduler.trigger(RunType::Scheduled).await;

    assert!(matches!(second, TriggerOutcome::Skipped));
    assert!(matches!(first.await.unwrap(), TriggerOutcome::Finished(_)));
    assert_eq!(store.updates().len(), 1);
    assert!(!scheduler.latch().is_running());
}

#[tokio::test]
async fn failed_run_returns_to_idle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let scheduler = scheduler(&server, store.clone(), &dir);

    match scheduler.trigger(RunType::Scheduled).await {
        TriggerOutcome::Finished(report) => assert_eq!(report.status, UpdateStatus::Failed),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(!scheduler.latch().is_running());
    assert!(scheduler.latch().try_begin().is_some());
}

#[tokio::test]
async fn initial_load_runs_only_on_empty_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body()))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let scheduler = scheduler(&server, store.clone(), &dir);

    match scheduler.initial_load().await {
        Some(TriggerOutcome::Finished(report)) => {
            assert_eq!(report.status, UpdateStatus::Success);
            assert_eq!(report.counts.records_inserted, 1);
        }
        other => panic!("expected an initial run, got {:?}", other),
    }

    assert!(scheduler.initial_load().await.is_none());
    assert_eq!(store.updates().len(), 1);
    assert_eq!(store.updates()[0].run_type.as_deref(), Some("initial"));
}
