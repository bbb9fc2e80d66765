//! Health check endpoint integration tests.
//!
//! These tests verify that the application starts correctly and the health
//! endpoints are accessible without authentication.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_returns_ok() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/health").await;

    // Assert
    assert_status!(response, 200);
    let body = response.text().await.expect("Failed to read response body");
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn health_status_reports_service_and_version() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/health/status").await;

    // Assert
    assert_status!(response, 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"].as_str().unwrap(), "healthy");
    assert_eq!(body["service"].as_str().unwrap(), "turnstile");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn readiness_probe_reports_store_up() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/health/ready").await;

    // Assert
    assert_status!(response, 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"].as_str().unwrap(), "ready");
    assert_eq!(body["checks"]["store"]["status"].as_str().unwrap(), "up");
}

#[tokio::test]
async fn liveness_probe_returns_ok() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/health/live").await;

    assert_status!(response, 200);
}

#[tokio::test]
async fn nonexistent_route_returns_envelope_404() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get_public("/nonexistent-endpoint").await;

    // Assert
    assert_status!(response, 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"].as_bool().unwrap(), false);
    assert_eq!(body["code"].as_str().unwrap(), "NOT_FOUND");
}
