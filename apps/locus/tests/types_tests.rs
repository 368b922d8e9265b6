//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use locus::api::{
    ErrorResponse, HealthResponse, LocalizeResponse, SearchRequest, SearchResponse, status_for,
};
use locus::coordinator::{CoordinatorState, CoordinatorStatus, LocalizationResult};
use locus::workflow::WorkflowStatus;
use locus_core::{
    ErrorKind, FrameId, LocusError, Orientation, Position2, Position3, SearchMatch,
};
use axum::http::StatusCode;
use std::path::PathBuf;

fn localization() -> LocalizationResult {
    LocalizationResult {
        frame_id: FrameId(11),
        position: Position3::new(4.0, -1.0, 0.0),
        orientation: Orientation::new(0.0, 0.0, 1.5708),
        detected_objects: "milk: 2% milk 1L".to_string(),
        confidence: 0.35,
        elapsed_ms: 812,
        image_name: "query.jpg".to_string(),
    }
}

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "locus");
    assert!(!health.version.is_empty());
    assert!(!health.features.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","service":"locus","version":"1.0.0","features":["object_search"]}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.version, "1.0.0");
    assert_eq!(health.features, ["object_search"]);
}

// =============================================================================
// SEARCH TESTS
// =============================================================================

#[test]
fn test_search_request_deserialization() {
    let request: SearchRequest = serde_json::from_str(r#"{"object_name":"2% milk"}"#).unwrap();
    assert_eq!(request.object_name, "2% milk");
    assert!(serde_json::from_str::<SearchRequest>("{}").is_err());
}

#[test]
fn test_search_response_counts_results() {
    let m = SearchMatch {
        frame_id: FrameId(11),
        location: Position2::new(4.0, -1.0),
        objects: vec!["milk: 2% milk 1L".to_string()],
        score: 1400,
        distance_from_user: None,
    };
    let response = SearchResponse::new("2% milk", vec![m]);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["total_matches"], 1);
    assert_eq!(json["results"][0]["frame_id"], 11);
    assert_eq!(json["results"][0]["location"]["x"], 4.0);
    assert!(json["results"][0].get("distance_from_user").is_none());
}

// =============================================================================
// LOCALIZATION TESTS
// =============================================================================

#[test]
fn test_localization_result_shape() {
    let json = serde_json::to_value(localization()).unwrap();

    assert_eq!(json["frame_id"], 11);
    assert_eq!(json["position"]["y"], -1.0);
    assert_eq!(json["orientation"]["yaw"], 1.5708);
    assert_eq!(json["detected_objects"], "milk: 2% milk 1L");
    assert_eq!(json["confidence"], 0.35);
}

#[test]
fn test_localize_response_failure_status() {
    let timeout = LocalizeResponse::failed("a.jpg", &LocusError::EngineTimeout { seconds: 60 });
    assert!(!timeout.success);
    assert_eq!(timeout.status, WorkflowStatus::LocalizationTimeout);
    assert!(timeout.localization.is_none());

    let ok = LocalizeResponse::ok("a.jpg", localization());
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["status"], "completed");
    assert!(json.get("error").is_none());
}

#[test]
fn test_coordinator_status_serialization() {
    let status = CoordinatorStatus {
        initialized: true,
        state: CoordinatorState::Busy,
        store_path: PathBuf::from("database.db"),
        requests_served: 7,
    };
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["state"], "busy");
    assert_eq!(json["requests_served"], 7);
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[test]
fn test_error_kinds_map_to_http_status() {
    assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(
        status_for(ErrorKind::ServiceUnavailable),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        status_for(ErrorKind::SearchFailure),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_error_response_from_error() {
    let body = ErrorResponse::from_error(&LocusError::InvalidImage("too big".to_string()));
    let json = serde_json::to_value(&body).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "validation");
    assert_eq!(json["error"], "Invalid image: too big");
}
