//! Integration tests for the collector
//!
//! These tests use wiremock to stand in for the search API and a temporary
//! SQLite database as the shared store, and drive full collection cycles
//! end-to-end.

use search_harvest::collector::{Coordinator, LoopState, Tick};
use search_harvest::config::{
    CatalogConfig, CollectorConfig, Config, RateLimitConfig, SearchConfig, StorageConfig,
};
use search_harvest::output::load_report;
use search_harvest::state::{TermCursor, DRAINED_SCORE};
use search_harvest::storage::{load_cursor, SharedState, LEDGER_KEY, RESULTS_KEY, TERMS_KEY};
use search_harvest::HarvestError;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server_uri: &str, db_path: &str, terms: &[&str], quota: u32) -> Config {
    Config {
        search: SearchConfig {
            base_url: format!("{}/search", server_uri),
            bearer_token_env: None,
            term_prefix: "#".to_string(),
            result_type: "recent".to_string(),
            page_size: 100,
            timeout_secs: 5,
        },
        rate_limit: RateLimitConfig {
            quota,
            window_minutes: 15,
            throttle_backoff_secs: 1,
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        catalog: CatalogConfig {
            path: None,
            terms: terms.iter().map(|t| t.to_string()).collect(),
        },
        collector: CollectorConfig::default(),
    }
}

fn statuses(ids: &[u64]) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "text": format!("item {}", id)}))
        .collect();
    json!({ "statuses": items })
}

fn db_path(dir: &TempDir) -> String {
    dir.path().join("harvest.db").to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_first_empty_fetch_marks_term_drained() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#rust"))
        .and(query_param("result_type", "recent"))
        .and(query_param("count", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &db_path(&dir), &["rust"], 10);
    let mut coordinator = Coordinator::new(&config).expect("Failed to create coordinator");

    let log = match coordinator.tick().await {
        Tick::Collected(log) => log,
        other => panic!("expected a collected tick, got {:?}", other),
    };

    assert_eq!(log.scenario, "base");
    assert_eq!(log.item_count, 0);
    assert_eq!(log.score, DRAINED_SCORE);

    let cursor = load_cursor(coordinator.store(), "rust").unwrap();
    assert_eq!(cursor.success, Some(true));
    assert_eq!(cursor.newest_id, None);
    assert_eq!(coordinator.store().list_len(LEDGER_KEY).unwrap(), 1);
    assert_eq!(coordinator.store().set_cardinality(TERMS_KEY).unwrap(), 1);
}

#[tokio::test]
async fn test_gap_is_resumed_after_restart() {
    let mock_server = MockServer::start().await;

    // Mounted first so they win over the unbounded first-page mock
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("max_id", "900"))
        .and(query_param("since_id", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[890, 700])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("since_id", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[1000, 900])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[500, 450])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &db_path(&dir), &["rust"], 10);

    {
        let mut coordinator = Coordinator::new(&config).unwrap();
        assert!(matches!(coordinator.tick().await, Tick::Collected(_)));

        // 900 > 500: the fetch did not reach back to the high-water mark
        match coordinator.tick().await {
            Tick::Collected(log) => {
                assert_eq!(log.scenario, "current_fail_last_success");
                assert_eq!(log.score, 1000);
            }
            other => panic!("expected a collected tick, got {:?}", other),
        }
    }

    // A fresh process picks the gap up from the persisted cursor
    let mut coordinator = Coordinator::new(&config).unwrap();
    match coordinator.tick().await {
        Tick::Collected(log) => {
            assert!(log.query.contains("max_id=900&since_id=500"));
            assert_eq!(log.scenario, "current_fail_last_fail");
            assert_eq!(
                log.after,
                TermCursor {
                    newest_id: Some(500),
                    oldest_id: Some(700),
                    last_success: Some(1000),
                    success: Some(false),
                }
            );
        }
        other => panic!("expected a collected tick, got {:?}", other),
    }

    let report = load_report(coordinator.store()).unwrap();
    assert_eq!(report.results, 6);
    assert_eq!(report.ledger_len, 3);
    assert_eq!(report.gapped_terms(), 1);
}

#[tokio::test]
async fn test_results_carry_term_and_payload() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[42])))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &db_path(&dir), &["tokio"], 10);
    let mut coordinator = Coordinator::new(&config).unwrap();
    assert!(matches!(coordinator.tick().await, Tick::Collected(_)));

    let records = coordinator.store().list_range(RESULTS_KEY, 0, 10).unwrap();
    assert_eq!(records.len(), 1);
    let record: Value = serde_json::from_str(&records[0]).unwrap();
    assert_eq!(record["id"], 42);
    assert_eq!(record["text"], "item 42");
    assert_eq!(record["search_term"], "tokio");
}

#[tokio::test]
async fn test_quota_exhaustion_throttles_without_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[1])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &db_path(&dir), &["rust"], 1);
    let mut coordinator = Coordinator::new(&config).unwrap();

    assert!(matches!(coordinator.tick().await, Tick::Collected(_)));
    assert!(matches!(coordinator.tick().await, Tick::Throttled));
    assert!(matches!(coordinator.tick().await, Tick::Throttled));
    assert_eq!(coordinator.state(), LoopState::Throttled);
    assert_eq!(coordinator.store().list_len(LEDGER_KEY).unwrap(), 1);
}

#[tokio::test]
async fn test_server_error_leaves_cursor_untouched() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("since_id", "500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[500])))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), &db_path(&dir), &["rust"], 10);
    let mut coordinator = Coordinator::new(&config).unwrap();

    assert!(matches!(coordinator.tick().await, Tick::Collected(_)));
    let before = load_cursor(coordinator.store(), "rust").unwrap();

    match coordinator.tick().await {
        Tick::Failed(HarvestError::Search(e)) => {
            assert!(e.to_string().contains("500"));
        }
        other => panic!("expected a failed tick, got {:?}", other),
    }

    assert_eq!(load_cursor(coordinator.store(), "rust").unwrap(), before);
    assert_eq!(coordinator.store().list_len(RESULTS_KEY).unwrap(), 1);
    // The failed attempt still spent quota
    assert_eq!(coordinator.store().list_len(LEDGER_KEY).unwrap(), 2);
    assert_eq!(coordinator.stats().failed_iterations, 1);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[7])))
        .expect(1)
        .mount(&mock_server)
        .await;

    std::env::set_var("SEARCH_HARVEST_IT_TOKEN", "s3cret");
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), &db_path(&dir), &["rust"], 10);
    config.search.bearer_token_env = Some("SEARCH_HARVEST_IT_TOKEN".to_string());

    let mut coordinator = Coordinator::new(&config).unwrap();
    assert!(matches!(coordinator.tick().await, Tick::Collected(_)));
}

#[tokio::test]
async fn test_lowest_score_term_is_collected_first() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#gapped"))
        .and(query_param("since_id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[30, 20])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#gapped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[10])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "#quiet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(statuses(&[])))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &mock_server.uri(),
        &db_path(&dir),
        &["gapped", "quiet"],
        10,
    );
    let mut coordinator = Coordinator::new(&config).unwrap();

    let mut order = Vec::new();
    for _ in 0..4 {
        match coordinator.tick().await {
            Tick::Collected(log) => order.push(log.term),
            other => panic!("expected a collected tick, got {:?}", other),
        }
    }

    // Both start unscored and drain on their first fetch; "gapped" then opens
    // a gap (20 > 10) and keeps priority over the drained "quiet".
    assert_eq!(order, vec!["gapped", "quiet", "gapped", "gapped"]);
}
