use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;

use super::*;
use crate::config::Config;
use crate::models::{DetectionRecord, Severity};
use crate::source::SimulatedGenerator;

fn app_with(dashboard: Arc<Dashboard>) -> Router {
    create_router(AppState {
        dashboard,
        config: Config::default(),
    })
}

fn idle_dashboard() -> Arc<Dashboard> {
    let source = DataSource::Simulated(SimulatedGenerator::new(0.0, "Production Unit A"));
    Arc::new(Dashboard::new(source, &Config::default(), Box::new(Silent)))
}

fn record(id: &str, category: &str, location: &str, severity: Severity) -> DetectionRecord {
    DetectionRecord {
        id: id.to_string(),
        timestamp: Utc::now(),
        category: category.to_string(),
        source: None,
        location: location.to_string(),
        severity,
        confidence: None,
        snapshot_ref: None,
    }
}

/// Dashboard holding the given records, left in the Polling state.
fn seeded_dashboard(records: Vec<DetectionRecord>) -> Arc<Dashboard> {
    let dashboard = idle_dashboard();
    dashboard.activate().unwrap();
    let ticket = dashboard.begin_poll().unwrap();
    dashboard.complete_poll(ticket, Ok(records));
    dashboard
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, "GET", uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app_with(idle_dashboard()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["monitoring"], false);
}

#[tokio::test]
async fn test_idle_metrics_show_floor() {
    let (status, body) = get_json(app_with(idle_dashboard()), "/api/v1/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["compliance_rate"], 85.0);
    assert_eq!(body["total_violations"], 0);
    assert_eq!(body["by_category"]["no_helmet"], 0);
    assert_eq!(body["by_severity"]["high"], 0);
}

#[tokio::test]
async fn test_logs_severity_filter() {
    let dashboard = seeded_dashboard(vec![
        record("1", "no_helmet", "Production Unit A", Severity::High),
        record("2", "no_vest", "Loading Dock", Severity::Medium),
        record("3", "fire", "Warehouse", Severity::High),
        record("4", "no_gloves", "Production Unit B", Severity::Low),
        record("5", "smoke", "Warehouse", Severity::Medium),
    ]);

    let (status, body) = get_json(app_with(dashboard), "/api/v1/logs?severity=high").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["matched"], 2);
    assert_eq!(body["high_priority"], 2);
}

#[tokio::test]
async fn test_logs_rejects_oversized_search() {
    let uri = format!("/api/v1/logs?text={}", "x".repeat(300));
    let (status, body) = get_json(app_with(idle_dashboard()), &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_csv_export_download() {
    let dashboard = seeded_dashboard(vec![
        record("1", "no_helmet", "Bay 1", Severity::High),
        record("2", "no_vest", "Bay 2", Severity::Low),
    ]);

    let response = app_with(dashboard)
        .oneshot(
            Request::builder()
                .uri("/api/v1/logs/export?severity=high")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"ppe_violations_"));
    assert!(disposition.ends_with(".csv\""));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Timestamp,Violation Type,Location,Severity");
    assert!(lines[1].ends_with(",no_helmet,Bay 1,high"));
}

#[tokio::test]
async fn test_detection_lookup() {
    let dashboard = seeded_dashboard(vec![record("abc", "fire", "Dock", Severity::High)]);

    let (status, body) = get_json(app_with(dashboard.clone()), "/api/v1/detections/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "fire");

    let (status, _) = get_json(app_with(dashboard), "/api/v1/detections/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_alert_feed_after_fresh_detection() {
    let dashboard = seeded_dashboard(vec![record("hot", "fire", "Dock", Severity::High)]);

    let (status, body) = get_json(app_with(dashboard), "/api/v1/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Fire/Smoke Alert");
}

#[tokio::test]
async fn test_retry_while_idle_conflicts() {
    let (status, body) = send(app_with(idle_dashboard()), "POST", "/api/v1/monitoring/retry").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"], "Monitoring is not active");
}

#[tokio::test]
async fn test_start_and_stop_monitoring() {
    let dashboard = idle_dashboard();

    let (status, body) = send(app_with(dashboard.clone()), "POST", "/api/v1/monitoring/start").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["status"]["state"], "polling");

    let (_, body) = send(app_with(dashboard.clone()), "POST", "/api/v1/monitoring/stop").await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["changed"], true);
    assert_eq!(body["status"]["state"], "idle");

    let (_, body) = send(app_with(dashboard), "POST", "/api/v1/monitoring/stop").await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["changed"], false);
}

#[tokio::test]
async fn test_chart_views() {
    let dashboard = seeded_dashboard(vec![record("1", "no_shoes", "Bay", Severity::Low)]);

    let (status, body) = get_json(app_with(dashboard.clone()), "/api/v1/charts/hourly").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buckets"].as_array().unwrap().len(), 12);

    let (status, body) = get_json(app_with(dashboard), "/api/v1/charts/distribution").await;
    assert_eq!(status, StatusCode::OK);
    let shoes = body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["category"] == "no_shoes")
        .unwrap()
        .clone();
    assert_eq!(shoes["value"], 1);
}

#[tokio::test]
async fn test_backend_stats_for_simulated_source() {
    let (status, body) = get_json(app_with(idle_dashboard()), "/api/v1/backend/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "simulated");
    assert!(body["backend"].is_null());
    assert!(body["discrepancy"].is_null());

    let (status, _) = send(app_with(idle_dashboard()), "POST", "/api/v1/backend/test-audio").await;
    assert_eq!(status, StatusCode::ACCEPTED);
}
