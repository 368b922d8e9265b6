//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    images::{ImageUpload, choose_source, first_test_image},
    types::{
        ENDPOINTS, ErrorResponse, HealthResponse, LocalizeResponse, SearchRequest,
        SearchResponse, StatusResponse, status_for,
    },
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use locus_core::{ErrorKind, LocusError};
use std::sync::Arc;

/// Convert an error into its JSON response.
pub fn error_response(error: &LocusError) -> Response {
    let status = status_for(error.kind());
    if status.is_server_error() {
        tracing::error!(kind = ?error.kind(), error = %error, "request failed");
    } else {
        tracing::debug!(kind = ?error.kind(), error = %error, "request rejected");
    }
    (status, Json(ErrorResponse::from_error(error))).into_response()
}

fn coordinator_unavailable() -> LocusError {
    LocusError::ServiceUnavailable("localization coordinator is not initialized".to_string())
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Coordinator and store status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = Arc::clone(state.workflow.store());
    let frame_count = match tokio::task::spawn_blocking(move || store.frame_count()).await {
        Ok(Ok(count)) => Some(count),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "frame count unavailable");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "frame count task failed");
            None
        }
    };

    let response = StatusResponse {
        coordinator: state.workflow.coordinator().map(|c| c.status()),
        store_exists: state.store_path.is_file(),
        store_path: state.store_path.clone(),
        frame_count,
        endpoints: ENDPOINTS.iter().map(|e| (*e).to_string()).collect(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// SEARCH HANDLER
// =============================================================================

/// Search the map for an object.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    match state.workflow.search(&request.object_name).await {
        Ok(results) => {
            let response = SearchResponse::new(request.object_name.trim(), results);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// LOCALIZE HANDLER
// =============================================================================

/// Localize the first image of the configured test image directory.
pub async fn localize_handler(State(state): State<AppState>) -> Response {
    let Some(coordinator) = state.workflow.coordinator() else {
        return error_response(&coordinator_unavailable());
    };
    let Some(dir) = state.test_image_dir.as_deref() else {
        return error_response(&LocusError::NotFound(
            "no test image directory configured".to_string(),
        ));
    };
    let image = match first_test_image(dir) {
        Ok(image) => image,
        Err(e) => return error_response(&e),
    };
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match coordinator.localize(&image).await {
        Ok(localization) => {
            (StatusCode::OK, Json(LocalizeResponse::ok(name, localization))).into_response()
        }
        Err(e) if e.kind() == ErrorKind::Validation => error_response(&e),
        Err(e) => {
            tracing::warn!(image = %name, error = %e, "test image localization failed");
            (StatusCode::OK, Json(LocalizeResponse::failed(name, &e))).into_response()
        }
    }
}

// =============================================================================
// SEARCH AND LOCALIZE HANDLER
// =============================================================================

/// Parsed `multipart/form-data` body of `/search-and-localize`.
#[derive(Debug, Default)]
struct WorkflowForm {
    object_name: Option<String>,
    file: Option<ImageUpload>,
    base64: Option<ImageUpload>,
    include_timing: bool,
}

async fn read_form(mut multipart: Multipart, max_image_bytes: usize) -> Result<WorkflowForm, LocusError> {
    let mut form = WorkflowForm::default();
    let malformed = |e: axum::extract::multipart::MultipartError| {
        LocusError::InvalidInput(format!("malformed form body: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "object_name" => form.object_name = Some(field.text().await.map_err(malformed)?),
            "image" => {
                if form.file.is_some() {
                    return Err(LocusError::InvalidImage(
                        "more than one image file".to_string(),
                    ));
                }
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                form.file = Some(ImageUpload::from_file(
                    content_type.as_deref(),
                    bytes.to_vec(),
                    max_image_bytes,
                )?);
            }
            "image_base64" => {
                let text = field.text().await.map_err(malformed)?;
                if !text.trim().is_empty() {
                    form.base64 = Some(ImageUpload::from_base64(&text, max_image_bytes)?);
                }
            }
            "include_timing" => {
                let text = field.text().await.map_err(malformed)?;
                form.include_timing = matches!(
                    text.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes" | "on"
                );
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}

/// Search, localize the uploaded image and guide to the nearest match.
pub async fn search_and_localize_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    if state.workflow.coordinator().is_none() {
        return error_response(&coordinator_unavailable());
    }

    let form = match read_form(multipart, state.max_image_bytes).await {
        Ok(form) => form,
        Err(e) => return error_response(&e),
    };
    let object_name = match form.object_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return error_response(&LocusError::InvalidQuery(
                "object_name is required".to_string(),
            ));
        }
    };
    let image = match choose_source(form.file, form.base64) {
        Ok(image) => image,
        Err(e) => return error_response(&e),
    };
    let spilled = match image.persist() {
        Ok(file) => file,
        Err(e) => return error_response(&e),
    };

    let result = state
        .workflow
        .run(&object_name, spilled.path(), form.include_timing)
        .await;

    if let Err(e) = spilled.close() {
        tracing::warn!(error = %e, "failed to remove upload file");
    }

    (StatusCode::OK, Json(result)).into_response()
}
