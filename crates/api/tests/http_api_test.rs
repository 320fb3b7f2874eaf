//! HTTP surface tests against the router, heuristic backend,
//! in-memory SQLite.

use std::sync::Arc;

use api::{create_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use classifier::Classifier;
use serde_json::{json, Value};
use storage::ResultRepository;
use tower::ServiceExt;

async fn test_state() -> Arc<AppState> {
    let repository = ResultRepository::memory().await.unwrap();
    Arc::new(AppState::new(
        Arc::new(Classifier::heuristic()),
        repository,
        "heuristic",
    ))
}

fn post_classification(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classification-data/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn classify_valid_sample() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(post_classification(json!({
            "serialNumber": "WQ-100",
            "values": [8.0, 7.5, 30.0, 20.0]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["serialNumber"], "WQ-100");
    assert_eq!(body["class_name"], "Clean");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&confidence));
}

#[tokio::test]
async fn classify_wrong_arity_rejected_without_persisting() {
    let state = test_state().await;
    let app = create_router(state.clone());

    let response = app
        .oneshot(post_classification(json!({
            "serialNumber": "WQ-100",
            "values": [8.0, 7.5, 30.0]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());

    // No row may exist after a validation failure
    assert_eq!(state.repository.result_count().await.unwrap(), 0);
}

#[tokio::test]
async fn classify_empty_serial_rejected() {
    let state = test_state().await;
    let app = create_router(state.clone());

    let response = app
        .oneshot(post_classification(json!({
            "serialNumber": "   ",
            "values": [8.0, 7.5, 30.0, 20.0]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.repository.result_count().await.unwrap(), 0);
}

#[tokio::test]
async fn classify_non_numeric_value_rejected() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(post_classification(json!({
            "serialNumber": "WQ-100",
            "values": [8.0, "seven", 30.0, 20.0]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lookup_unknown_serial_is_404() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app
        .oneshot(get("/get-result/?serialNumber=WQ-404"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn lookup_without_filter_on_empty_table_is_empty_list() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app.oneshot(get("/get-result/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn classify_then_lookup_returns_most_recent_label() {
    let state = test_state().await;
    let app = create_router(state);

    // Clean sample, then an acidic one for the same device
    let first = app
        .clone()
        .oneshot(post_classification(json!({
            "serialNumber": "WQ-7",
            "values": [8.0, 7.5, 30.0, 20.0]
        })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(post_classification(json!({
            "serialNumber": "WQ-7",
            "values": [8.0, 4.0, 30.0, 20.0]
        })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let response = app
        .oneshot(get("/get-result/?serialNumber=WQ-7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["serialNumber"], "WQ-7");
    assert_eq!(body["result"], "Low pH");
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn lookup_without_filter_returns_latest_per_device() {
    let state = test_state().await;
    let app = create_router(state);

    for (serial, values) in [
        ("WQ-1", [8.0, 7.5, 30.0, 20.0]),
        ("WQ-1", [8.0, 7.5, 50.0, 20.0]),
        ("WQ-2", [2.0, 7.5, 30.0, 20.0]),
    ] {
        let response = app
            .clone()
            .oneshot(post_classification(json!({
                "serialNumber": serial,
                "values": values
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/get-result/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);

    let for_one = rows
        .iter()
        .find(|r| r["serialNumber"] == "WQ-1")
        .unwrap();
    assert_eq!(for_one["result"], "Salt");

    let for_two = rows
        .iter()
        .find(|r| r["serialNumber"] == "WQ-2")
        .unwrap();
    assert_eq!(for_two["result"], "Organic");
}

#[tokio::test]
async fn health_reports_stored_results() {
    let state = test_state().await;
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(post_classification(json!({
            "serialNumber": "WQ-9",
            "values": [8.0, 7.5, 30.0, 20.0]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "heuristic");
    assert_eq!(body["stored_results"], 1);
}
