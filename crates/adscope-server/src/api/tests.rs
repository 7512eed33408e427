use std::sync::atomic::{AtomicU32, Ordering};

use adscope_core::{JudgmentOracle, OracleError, RawAdRecord, ScrapeOracle, ScrapeRequest};
use adscope_pipeline::PipelineSettings;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;
use uuid::Uuid;

use super::*;

struct FixedScraper;

#[async_trait]
impl ScrapeOracle for FixedScraper {
    async fn scrape(&self, _request: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
        Ok(vec![
            RawAdRecord::new("a1", "Buy Now", "Sale"),
            RawAdRecord::new("a2", "Spring is here", "New season"),
            RawAdRecord::new("a3", "Buy Now", "Sale"),
        ])
    }
}

struct StalledScraper;

#[async_trait]
impl ScrapeOracle for StalledScraper {
    async fn scrape(&self, _request: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
        std::future::pending().await
    }
}

struct FatalScraper;

#[async_trait]
impl ScrapeOracle for FatalScraper {
    async fn scrape(&self, _request: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
        Err(OracleError::fatal("agent rejected credentials"))
    }
}

struct FixedJudge {
    calls: AtomicU32,
}

#[async_trait]
impl JudgmentOracle for FixedJudge {
    async fn judge(&self, _prompt: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"hook_type": "urgency", "funnel_stage": "BOFU", "score": 7, "key_insight": "scarcity"}"#.to_string())
    }
}

fn app_with(scraper: Arc<dyn ScrapeOracle>) -> Router {
    let pipeline = Pipeline::new(
        scraper,
        Arc::new(FixedJudge {
            calls: AtomicU32::new(0),
        }),
        PipelineSettings::default(),
    );
    build_app(AppState {
        pipeline: Arc::new(pipeline),
        jobs: JobStore::new(),
        defaults: RunDefaults {
            max_items: 10,
            run_timeout: Duration::from_secs(60),
        },
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

fn post_analysis(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/analyses")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_analysis(id: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/api/v1/analyses/{id}"))
        .body(Body::empty())
        .expect("request")
}

fn delete_analysis(id: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/analyses/{id}"))
        .body(Body::empty())
        .expect("request")
}

/// Polls a job until it leaves `running`.
async fn wait_until_settled(app: &Router, id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let (status, json) = send(app, get_analysis(id)).await;
        assert_eq!(status, StatusCode::OK);
        if json["data"]["status"] != "running" {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never settled");
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_unknown_code_maps_to_internal_error() {
    let response = ApiError::new("req-1", "boom", "unexpected").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_returns_ok_and_echoes_request_id() {
    let app = app_with(Arc::new(FixedScraper));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-42")
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-42");
}

#[tokio::test]
async fn create_then_poll_completed_analysis() {
    let app = app_with(Arc::new(FixedScraper));

    let (status, json) = send(
        &app,
        post_analysis(&serde_json::json!({"brand": "Acme", "region": "us"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["region"], "US");
    assert_eq!(json["data"]["maxItems"], 10);
    let id = json["data"]["id"].as_str().expect("job id").to_string();

    let job = wait_until_settled(&app, &id).await;
    assert_eq!(job["status"], "completed");
    assert!(job.get("failure").is_none());
    let summary = &job["report"]["summary"];
    assert_eq!(summary["totalAnalyzed"], 2);
    assert_eq!(summary["dominantFunnelStage"], "conversion");
    assert_eq!(job["report"]["rawRecordCount"], 3);
}

#[tokio::test]
async fn blank_brand_is_a_validation_error() {
    let app = app_with(Arc::new(FixedScraper));
    let (status, json) = send(&app, post_analysis(&serde_json::json!({"brand": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn zero_max_items_is_a_validation_error() {
    let app = app_with(Arc::new(FixedScraper));
    let (status, json) = send(
        &app,
        post_analysis(&serde_json::json!({"brand": "Acme", "maxItems": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn unknown_or_malformed_id_is_not_found() {
    let app = app_with(Arc::new(FixedScraper));

    let (status, json) = send(&app, get_analysis(&Uuid::new_v4().to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");

    let (status, _) = send(&app, get_analysis("not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, delete_analysis(&Uuid::new_v4().to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn fatal_extraction_error_marks_job_failed() {
    let app = app_with(Arc::new(FatalScraper));
    let (_, json) = send(&app, post_analysis(&serde_json::json!({"brand": "Acme"}))).await;
    let id = json["data"]["id"].as_str().expect("job id").to_string();

    let job = wait_until_settled(&app, &id).await;
    assert_eq!(job["status"], "failed");
    assert_eq!(job["failure"]["stage"], "extraction");
    assert!(job["failure"]["detail"]
        .as_str()
        .is_some_and(|d| d.contains("agent rejected credentials")));
    assert!(job.get("report").is_none());
}

#[tokio::test]
async fn delete_cancels_running_job() {
    let app = app_with(Arc::new(StalledScraper));
    let (_, json) = send(&app, post_analysis(&serde_json::json!({"brand": "Acme"}))).await;
    let id = json["data"]["id"].as_str().expect("job id").to_string();

    let (status, json) = send(&app, delete_analysis(&id)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["data"]["id"], id.as_str());

    let job = wait_until_settled(&app, &id).await;
    assert_eq!(job["status"], "cancelled");
    assert_eq!(job["failure"]["stage"], "extraction");
    assert_eq!(job["failure"]["detail"], "cancelled");

    let (status, json) = send(&app, delete_analysis(&id)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");
}
