//! HTTP API exercised through the router with `oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use cardiosense_advisor::AdvisorService;
use cardiosense_common::LlmConfig;
use cardiosense_llm::mock::{MockBackend, MockReply};
use cardiosense_llm::{ProviderChain, RetryPolicy};
use cardiosense_scoring::RiskEngine;
use cardiosense_test_utils::{high_risk_patient, low_risk_patient, patient_json, synthetic_cohort};
use cardiosense_web::history::HistoryStore;
use cardiosense_web::history_db::SqliteHistory;
use cardiosense_web::{build_router, AppState};

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_millis(50),
        max_retries: 0,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
    }
}

fn app_with_history(chain: ProviderChain, history: HistoryStore) -> Router {
    let advisor = AdvisorService::new(&LlmConfig::default(), Arc::new(chain), Arc::new(RiskEngine::default()));
    build_router(AppState::new(Arc::new(advisor), history))
}

fn app_with(chain: ProviderChain) -> Router {
    app_with_history(chain, HistoryStore::in_memory(500, 1_000))
}

fn app() -> Router {
    app_with(ProviderChain::new(fast_policy()))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_of(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let response = app().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_of(response).await;
    assert_eq!(json["status"], "running");
    assert!(json["endpoints"].as_array().unwrap().len() >= 8);
}

#[tokio::test]
async fn test_predict_high_risk_patient() {
    let response = app()
        .oneshot(post_json("/api/predict", patient_json(&high_risk_patient())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_of(response).await;
    let level = json["risk_level"].as_str().unwrap();
    assert!(level == "high" || level == "very-high");
    let score = json["risk_score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert_eq!(json["model_predictions"].as_object().unwrap().len(), 19);
    assert_eq!(json["confidence_interval"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_predict_accepts_legacy_field_names() {
    let app = app();
    let legacy = serde_json::json!({ "age": 30, "systolicBP": 110, "totalCholesterol": 160 });
    let current = serde_json::json!({ "age": 30, "systolicBp": 110, "totalCholesterol": 160 });

    let response = app.clone().oneshot(post_json("/api/predict", legacy)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let legacy = json_of(response).await;
    let current = json_of(app.oneshot(post_json("/api/predict", current)).await.unwrap()).await;
    assert_eq!(legacy["risk_score"], current["risk_score"]);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_batch_predict_counts() {
    let patients: Vec<_> = synthetic_cohort(25, 3).iter().map(patient_json).collect();
    let response = app()
        .oneshot(post_json("/api/batch-predict", serde_json::json!({ "patients": patients })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_of(response).await;
    assert_eq!(json["count"], 25);
    assert_eq!(json["predictions"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_oversized_batch_is_rejected() {
    let patients = vec![serde_json::json!({}); 1_001];
    let response = app()
        .oneshot(post_json("/api/batch-predict", serde_json::json!({ "patients": patients })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_projection_returns_three_scenarios() {
    let mut patient = patient_json(&high_risk_patient());
    patient["trend"] = serde_json::json!("worsening");
    let response = app().oneshot(post_json("/api/projection", patient)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_of(response).await;
    assert_eq!(json["projection"]["trend"], "worsening");
    assert_eq!(json["projection"]["points"].as_array().unwrap().len(), 3);
    assert_eq!(json["scenarios"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_recommendations_fall_back_when_providers_fail() {
    let chain = ProviderChain::new(fast_policy())
        .with_backend(Arc::new(MockBackend::always("gemini", MockReply::ServerError(500))))
        .with_backend(Arc::new(MockBackend::always("openai", MockReply::Malformed)));
    let body = serde_json::json!({
        "patient": patient_json(&high_risk_patient()),
        "request_type": "comprehensive"
    });

    let response = app_with(chain).oneshot(post_json("/api/recommendations", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_of(response).await;
    assert_eq!(json["source"], "fallback");
    assert!(!json["disclaimer"].as_str().unwrap().is_empty());
    assert!(!json["suggestions"]["diet"].as_array().unwrap().is_empty());
    assert!(!json["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_history_is_recorded_per_user_most_recent_first() {
    let app = app();

    for patient in [low_risk_patient(), high_risk_patient()] {
        let mut request = post_json("/api/predict", patient_json(&patient));
        request.headers_mut().insert("x-user-id", "user-42".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    // Anonymous predictions are not recorded
    app.clone()
        .oneshot(post_json("/api/predict", patient_json(&low_risk_patient())))
        .await
        .unwrap();

    let json = json_of(app.clone().oneshot(get("/api/history/user-42")).await.unwrap()).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["history"][0]["input"]["age"], 65.0);
    assert_eq!(json["history"][1]["input"]["age"], 30.0);

    let limited = json_of(app.clone().oneshot(get("/api/history/user-42?limit=1")).await.unwrap()).await;
    assert_eq!(limited["count"], 1);

    let health = json_of(app.oneshot(get("/api/health")).await.unwrap()).await;
    assert_eq!(health["total_predictions"], 3);
    assert_eq!(health["history_entries"], 2);
    assert_eq!(health["history_users"], 1);
    assert_eq!(health["history_persistent"], false);
}

#[tokio::test]
async fn test_history_limit_zero_is_bad_request() {
    let response = app().oneshot(get("/api/history/user-42?limit=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_history_served_from_database_after_cache_eviction() {
    let db = SqliteHistory::in_memory(500).await.unwrap();
    let app = app_with_history(ProviderChain::new(fast_policy()), HistoryStore::with_database(db, 500, 1));

    for user in ["user-1", "user-2"] {
        let mut request = post_json("/api/predict", patient_json(&high_risk_patient()));
        request.headers_mut().insert("x-user-id", user.parse().unwrap());
        assert_eq!(app.clone().oneshot(request).await.unwrap().status(), StatusCode::OK);
    }

    let json = json_of(app.clone().oneshot(get("/api/history/user-1")).await.unwrap()).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["history"][0]["input"]["age"], 65.0);

    let health = json_of(app.oneshot(get("/api/health")).await.unwrap()).await;
    assert_eq!(health["history_users"], 1);
    assert_eq!(health["history_persistent"], true);
}

#[tokio::test]
async fn test_event_stream_pushes_predictions() {
    let app = app();
    let response = app.clone().oneshot(get("/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"), "got {content_type}");
    let mut body = response.into_body();

    let predicted = app
        .oneshot(post_json("/api/predict", patient_json(&low_risk_patient())))
        .await
        .unwrap();
    assert_eq!(predicted.status(), StatusCode::OK);

    let mut text = String::new();
    while !text.contains("event: prediction") {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("no event within 5s")
            .expect("event stream ended")
            .unwrap();
        if let Ok(data) = frame.into_data() {
            text.push_str(&String::from_utf8_lossy(&data));
        }
    }
    assert!(text.contains("\"type\":\"prediction_made\""), "got {text}");
}

#[tokio::test]
async fn test_health_reports_models_and_providers() {
    let chain = ProviderChain::new(fast_policy()).with_backend(Arc::new(MockBackend::new("gemini")));
    let json = json_of(app_with(chain).oneshot(get("/api/health")).await.unwrap()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_count"], 19);
    assert_eq!(json["llm_enabled"], true);
    assert_eq!(json["providers"][0]["name"], "gemini");
}

#[tokio::test]
async fn test_model_info_weights_are_normalised() {
    let json = json_of(app().oneshot(get("/api/model-info")).await.unwrap()).await;
    let models = json["models"].as_array().unwrap();
    assert_eq!(models.len(), 19);
    let total: f64 = models.iter().map(|m| m["normalised"].as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-6);
    assert_eq!(json["thresholds"]["high"], 20.0);
}
