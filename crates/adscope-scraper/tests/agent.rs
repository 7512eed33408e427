//! Integration tests for `AgentClient` and `SnapshotSource`.

use std::path::PathBuf;

use adscope_core::{ScrapeOracle, ScrapeRequest};
use adscope_scraper::{AgentClient, SnapshotSource};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(max_items: usize) -> ScrapeRequest {
    ScrapeRequest {
        brand: "Acme".to_string(),
        region: "FR".to_string(),
        max_items,
    }
}

fn temp_snapshot(name: &str, contents: &str) -> PathBuf {
    temp_file(name, "json", contents)
}

fn temp_file(name: &str, ext: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "adscope-snapshot-{}-{name}.{ext}",
        std::process::id()
    ));
    std::fs::write(&path, contents).expect("write snapshot");
    path
}

#[tokio::test]
async fn scrape_posts_task_and_parses_final_result() {
    let server = MockServer::start().await;

    let final_result = "Done!\n```json\n{\"brand\": \"Acme\", \"ads\": [\
        {\"library_id\": \"111\", \"primary_text\": \"Buy now\", \"headline\": \"Sale\", \"format\": \"Video\"},\
        {\"library_id\": \"222\", \"primary_text\": \"Spring\", \"headline\": \"New\"}\
    ]}\n```";

    Mock::given(method("POST"))
        .and(path("/run"))
        .and(body_partial_json(serde_json::json!({
            "start_url": "https://www.facebook.com/ads/library/?active_status=active&ad_type=all&country=FR&q=Acme"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "final_result": final_result,
            "extracted_content": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AgentClient::new(&server.uri(), 30).expect("client");
    let records = client.scrape(&request(10)).await.expect("scrape succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].source_id, "111");
    assert_eq!(records[0].format.as_str(), "video");
    assert_eq!(records[1].headline, "New");
}

#[tokio::test]
async fn scrape_falls_back_to_extracted_blocks_and_caps() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "final_result": null,
            "extracted_content": [
                "scrolled 5 times",
                "{\"ads\": [{\"primary_text\": \"a\"}, {\"primary_text\": \"b\"}, {\"primary_text\": \"c\"}]}"
            ]
        })))
        .mount(&server)
        .await;

    let client = AgentClient::new(&server.uri(), 30).expect("client");
    let records = client.scrape(&request(2)).await.expect("scrape succeeds");
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn unusable_run_is_an_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "final_result": "The page required a login."
        })))
        .mount(&server)
        .await;

    let client = AgentClient::new(&server.uri(), 30).expect("client");
    let records = client.scrape(&request(10)).await.expect("scrape succeeds");
    assert!(records.is_empty());
}

#[tokio::test]
async fn server_error_is_retriable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = AgentClient::new(&server.uri(), 30).expect("client");
    let err = client.scrape(&request(10)).await.unwrap_err();
    assert!(err.retriable);
    assert!(err.detail.contains("503"), "detail: {}", err.detail);
}

#[tokio::test]
async fn client_error_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/run"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = AgentClient::new(&server.uri(), 30).expect("client");
    let err = client.scrape(&request(10)).await.unwrap_err();
    assert!(!err.retriable);
}

#[tokio::test]
async fn snapshot_replays_saved_document() {
    let path = temp_snapshot(
        "replay",
        r#"{"brand": "Acme", "market": "FR", "ads": [
            {"id": 1, "primary_text": "Buy Now", "headline": "Sale", "first_seen": "2025-03-10"},
            {"id": 2, "primary_text": "", "headline": ""},
            {"id": 3, "primary_text": "Spring", "headline": "New"}
        ]}"#,
    );

    let source = SnapshotSource::new(&path);
    let records = source.scrape(&request(10)).await.expect("replay succeeds");
    std::fs::remove_file(&path).ok();

    let ids: Vec<&str> = records.iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
    assert_eq!(
        records[0].first_seen.map(|d| d.to_string()).as_deref(),
        Some("2025-03-10")
    );
}

#[tokio::test]
async fn missing_snapshot_is_fatal() {
    let source = SnapshotSource::new("/nonexistent/adscope/snapshot.json");
    let err = source.scrape(&request(10)).await.unwrap_err();
    assert!(!err.retriable);
    assert!(err.detail.contains("could not read snapshot"));
}

#[tokio::test]
async fn snapshot_without_ads_is_fatal() {
    let path = temp_snapshot("noads", r#"{"brand": "Acme", "error": "timeout"}"#);
    let err = SnapshotSource::new(&path)
        .scrape(&request(10))
        .await
        .unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(!err.retriable);
}

#[tokio::test]
async fn csv_snapshot_replays_rows() {
    let path = temp_file(
        "rows",
        "CSV",
        "Library ID,Headline,Primary Text,Format\n\
         501,Sale,Buy Now,Carousel\n\
         502,,,\n\
         503,New,Spring,video\n",
    );

    let records = SnapshotSource::new(&path)
        .scrape(&request(10))
        .await
        .expect("replay succeeds");
    std::fs::remove_file(&path).ok();

    let ids: Vec<&str> = records.iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["501", "503"]);
    assert_eq!(records[0].format.as_str(), "carousel");
}

#[tokio::test]
async fn malformed_csv_snapshot_is_fatal() {
    let path = temp_file("bad", "csv", "Headline,Primary Text\nSale,Buy now,extra\n");
    let err = SnapshotSource::new(&path)
        .scrape(&request(10))
        .await
        .unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(!err.retriable);
}
