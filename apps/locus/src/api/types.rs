//! # API Request/Response Types
//!
//! JSON bodies for the HTTP API. The workflow endpoint returns
//! [`WorkflowResult`](crate::workflow::WorkflowResult) directly.

use crate::coordinator::{CoordinatorStatus, LocalizationResult};
use crate::workflow::WorkflowStatus;
use axum::http::StatusCode;
use locus_core::{ErrorKind, LocusError, SearchMatch};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Features advertised by `/health`.
pub const FEATURES: &[&str] = &[
    "object_search",
    "localization",
    "navigation_guidance",
    "clock_face_directions",
];

/// Routes listed by `/status`.
pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /status",
    "POST /search",
    "POST /localize",
    "POST /search-and-localize",
];

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub features: Vec<String>,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "locus".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: FEATURES.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Service status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `None` when no recognition engine is available.
    pub coordinator: Option<CoordinatorStatus>,
    pub store_path: PathBuf,
    pub store_exists: bool,
    /// `None` when the store could not be counted.
    pub frame_count: Option<usize>,
    pub endpoints: Vec<String>,
}

// =============================================================================
// SEARCH REQUEST/RESPONSE
// =============================================================================

/// Object search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub object_name: String,
}

/// Object search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub search_term: String,
    pub results: Vec<SearchMatch>,
    pub total_matches: usize,
}

impl SearchResponse {
    pub fn new(search_term: impl Into<String>, results: Vec<SearchMatch>) -> Self {
        Self {
            success: true,
            search_term: search_term.into(),
            total_matches: results.len(),
            results,
        }
    }
}

// =============================================================================
// LOCALIZE RESPONSE
// =============================================================================

/// Result of localizing the configured test image.
///
/// Engine outcomes are reported through `status`, not the HTTP code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizeResponse {
    pub success: bool,
    pub image: String,
    pub status: WorkflowStatus,
    pub localization: Option<LocalizationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LocalizeResponse {
    pub fn ok(image: impl Into<String>, localization: LocalizationResult) -> Self {
        Self {
            success: true,
            image: image.into(),
            status: WorkflowStatus::Completed,
            localization: Some(localization),
            error: None,
        }
    }

    pub fn failed(image: impl Into<String>, error: &LocusError) -> Self {
        Self {
            success: false,
            image: image.into(),
            status: WorkflowStatus::for_localization_error(error),
            localization: None,
            error: Some(error.to_string()),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every 4xx/5xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub kind: ErrorKind,
    pub error: String,
}

impl ErrorResponse {
    pub fn from_error(error: &LocusError) -> Self {
        Self {
            success: false,
            kind: error.kind(),
            error: error.to_string(),
        }
    }
}

/// HTTP status for an error class.
pub const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::EngineTimeout
        | ErrorKind::EngineFailure
        | ErrorKind::Resolution
        | ErrorKind::SearchFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
