//! Integration tests for the klipconf Web API.
//!
//! These tests require the `web` feature to be enabled:
//! ```bash
//! cargo test --features web web_api
//! ```

#![cfg(feature = "web")]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use klipconf::catalog::Catalog;
use klipconf::web::{create_router, AppState};

mod fixtures;
use fixtures::TEST_CATALOG_JSON;

/// Creates a test AppState over the fixture catalog only.
fn create_test_state() -> AppState {
    let catalog = Catalog::from_json(TEST_CATALOG_JSON).expect("Failed to parse test catalog");
    AppState::new(catalog)
}

/// Helper to make a GET request and parse the JSON response.
async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let app = create_router(state);
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Helper to make a POST request with a JSON body.
async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Session document with every field a strict render needs.
fn complete_session() -> Value {
    json!({
        "mainboard": "test-main",
        "assignments": [
            { "function": "stepper_x", "role": "mainboard", "port": "MOTOR0" },
            { "function": "stepper_y", "role": "mainboard", "port": "MOTOR1" },
            { "function": "stepper_z", "role": "mainboard", "port": "MOTOR2" },
            { "function": "extruder", "role": "mainboard", "port": "MOTOR3" },
            { "function": "extruder_heater", "role": "mainboard", "port": "HE0" },
            { "function": "extruder_thermistor", "role": "mainboard", "port": "T0" },
            { "function": "endstop_x", "role": "mainboard", "port": "STOP0" },
            { "function": "endstop_y", "role": "mainboard", "port": "STOP1" },
            { "function": "endstop_z", "role": "mainboard", "port": "STOP2" }
        ],
        "settings": {
            "kinematics": "corexy",
            "bed_size_x": 300,
            "bed_size_y": 300,
            "extruder_sensor_type": "Generic 3950",
            "mcu_serial": "/dev/serial/by-id/usb-Klipper_test"
        }
    })
}

// ============================================================================
// Health and catalog
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (status, json) = get_json(create_test_state(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["boards"], 2);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_list_boards() {
    let (status, json) = get_json(create_test_state(), "/api/boards").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["boards"][0]["id"], "test-main");
    assert_eq!(json["boards"][1]["id"], "test-tool");
}

#[tokio::test]
async fn test_list_boards_by_role() {
    let (status, json) = get_json(create_test_state(), "/api/boards?role=toolboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["boards"][0]["id"], "test-tool");
    assert_eq!(json["boards"][0]["role"], "toolboard");
}

#[tokio::test]
async fn test_get_board() {
    let (status, json) = get_json(create_test_state(), "/api/boards/test-tool").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "test-tool");
    assert_eq!(json["mcu"], "stm32g0b1");
    assert!(json["ports"].as_array().is_some_and(|p| !p.is_empty()));
}

#[tokio::test]
async fn test_get_board_not_found() {
    let (status, json) = get_json(create_test_state(), "/api/boards/nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Board not found");
    assert!(json["details"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_list_functions() {
    let (status, json) = get_json(create_test_state(), "/api/functions?category=probe").await;

    assert_eq!(status, StatusCode::OK);
    let functions = json.as_array().unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0]["key"], "probe");
    assert_eq!(functions[0]["pullup"], true);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, json) = get_json(create_test_state(), "/api/nothing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Not found");
}

// ============================================================================
// Preview
// ============================================================================

#[tokio::test]
async fn test_preview_placeholder_by_default() {
    let body = json!({
        "version": 1,
        "session": {
            "mainboard": "test-main",
            "assignments": [
                { "function": "stepper_x", "role": "mainboard", "port": "MOTOR0" }
            ]
        }
    });
    let (status, json) = post_json(create_test_state(), "/api/preview", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["version"], 1);
    assert_eq!(json["mode"], "placeholder");
    let printer = json["files"]["printer.cfg"].as_str().unwrap();
    assert!(printer.contains("step_pin: PF13"));
    assert!(printer.contains("REPLACE_PIN"));
    assert!(json["rendered_at"].is_string());
}

#[tokio::test]
async fn test_preview_strict_missing_fields() {
    let body = json!({ "version": 3, "mode": "strict", "session": {} });
    let (status, json) = post_json(create_test_state(), "/api/preview", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["version"], 3);
    assert_eq!(json["kind"], "missing_required_field");
    let details: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d.as_str())
        .collect();
    assert!(details.contains(&"board"));
}

#[tokio::test]
async fn test_preview_strict_complete() {
    let body = json!({ "version": 2, "mode": "strict", "session": complete_session() });
    let (status, json) = post_json(create_test_state(), "/api/preview", body).await;

    assert_eq!(status, StatusCode::OK);
    let printer = json["files"]["printer.cfg"].as_str().unwrap();
    assert!(printer.contains("kinematics: corexy"));
    assert!(!printer.contains("REPLACE_PIN"));
    assert!(json["issues"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_preview_reports_skipped_entries() {
    let body = json!({
        "session": {
            "mainboard": "test-main",
            "assignments": [
                { "function": "stepper_x", "role": "mainboard", "port": "MOTOR0" },
                { "function": "stepper_y", "role": "mainboard", "port": "MOTOR0" }
            ]
        }
    });
    let (status, json) = post_json(create_test_state(), "/api/preview", body).await;

    assert_eq!(status, StatusCode::OK);
    let issues = json["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert!(issues[0].as_str().unwrap().contains("stepper_y"));
}

#[tokio::test]
async fn test_preview_keeps_no_state_between_requests() {
    let state = create_test_state();
    let first = json!({ "version": 40, "session": { "mainboard": "test-main" } });
    // A second client (or a reloaded page) starts counting again.
    let second = json!({ "version": 1, "session": { "mainboard": "test-main" } });

    let (status, a) = post_json(state.clone(), "/api/preview", first).await;
    assert_eq!(status, StatusCode::OK);
    let (status, b) = post_json(state, "/api/preview", second).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(a["version"], 40);
    assert_eq!(b["version"], 1);
    assert!(b.get("superseded").is_none());
    assert_eq!(a["files"], b["files"]);
}
