mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use common::{ScriptedSource, harness};
use daily_word_back::routes;

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn today_word_is_stable_within_a_day() {
    let h = harness("2024-05-10", ScriptedSource::new()).await;

    let (status, first) = get_json(routes::router(h.state.clone()), "/today-word").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["date"], "2024-05-10");
    assert_eq!(first["word"], "word1");
    assert_eq!(first["meaning"], "meaning of word1");
    assert_eq!(first["example"], "an example using word1");
    assert!(first.get("phonetic").is_none());

    let (_, second) = get_json(routes::router(h.state.clone()), "/today-word").await;
    assert_eq!(second, first);
    assert_eq!(h.source.calls(), 1);
}

#[tokio::test]
async fn next_day_acquires_a_new_word() {
    let h = harness("2024-05-10", ScriptedSource::new()).await;
    get_json(routes::router(h.state.clone()), "/today-word").await;

    h.clock.set(common::day("2024-05-11"));
    let (_, body) = get_json(routes::router(h.state.clone()), "/today-word").await;

    assert_eq!(body["date"], "2024-05-11");
    assert_eq!(body["word"], "word2");
    assert_eq!(h.source.calls(), 2);
}

#[tokio::test]
async fn provider_failure_is_a_500_and_is_retried_next_call() {
    let h = harness("2024-05-10", ScriptedSource::failing()).await;

    let (status, body) = get_json(routes::router(h.state.clone()), "/today-word").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "provider_unavailable");
    assert_eq!(body["details"], "scripted unavailable: upstream down");

    h.source.set_failing(false);
    let (status, body) = get_json(routes::router(h.state.clone()), "/today-word").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["word"], "word2");
}

#[tokio::test]
async fn healthcheck_reports_degraded_without_cloud_store() {
    let h = harness("2024-05-10", ScriptedSource::new()).await;

    let (status, body) = get_json(routes::router(h.state.clone()), "/healthcheck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    h.state.install_cloud_store(common::MemoryCloudStore::new()).await;
    let (_, body) = get_json(routes::router(h.state.clone()), "/healthcheck").await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_lists_the_routes() {
    let h = harness("2024-05-10", ScriptedSource::new()).await;
    let (status, body) = get_json(routes::router(h.state.clone()), "/api-doc/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/today-word", "/session", "/healthcheck"] {
        assert!(body["paths"].get(path).is_some(), "missing {path}");
    }
}
