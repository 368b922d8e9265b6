//! # Localization Coordinator
//!
//! Owns the single recognition engine slot. Every call to
//! [`LocalizationCoordinator::localize`] queues on one FIFO mutex, gets a
//! fresh temporary workspace holding a copy of the query image, runs the
//! engine with a hard timeout, parses its report and resolves the accepted
//! frame to its optimized global pose.
//!
//! ## State
//!
//! Idle while the mutex is free, Busy while a run holds it. The workspace
//! is removed before the mutex is released on every path, including
//! timeouts.

pub mod engine;

use crate::config::LocusConfig;
use engine::{EngineCommand, program_available};
use locus_core::engine_output;
use locus_core::pose::{ResolvedPose, decode_transform};
use locus_core::{FrameId, LocusError, MapStore, Orientation, Position3, resolve_global_pose};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WORKSPACE_PREFIX: &str = "locus-req-";

// =============================================================================
// RESULT TYPES
// =============================================================================

/// A resolved localization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationResult {
    pub frame_id: FrameId,
    pub position: Position3,
    pub orientation: Orientation,
    /// `"<class>: <notes>"` per object, joined by `" •• "`.
    pub detected_objects: String,
    /// Hypothesis score reported by the engine.
    pub confidence: f64,
    /// Wall time of the whole call, including queueing on the lock.
    pub elapsed_ms: u64,
    pub image_name: String,
}

/// Coordinator lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Busy,
}

/// Point-in-time view for `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub initialized: bool,
    pub state: CoordinatorState,
    pub store_path: PathBuf,
    pub requests_served: u64,
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Single-flight access to the recognition engine.
pub struct LocalizationCoordinator {
    command: EngineCommand,
    store_path: PathBuf,
    store: Arc<dyn MapStore>,
    workspace_root: Option<PathBuf>,
    slot: Mutex<()>,
    requests_served: AtomicU64,
}

impl std::fmt::Debug for LocalizationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationCoordinator")
            .field("command", &self.command)
            .field("store_path", &self.store_path)
            .field("workspace_root", &self.workspace_root)
            .finish()
    }
}

impl LocalizationCoordinator {
    pub fn new(
        command: EngineCommand,
        store_path: impl Into<PathBuf>,
        store: Arc<dyn MapStore>,
        workspace_root: Option<PathBuf>,
    ) -> Self {
        Self {
            command,
            store_path: store_path.into(),
            store,
            workspace_root,
            slot: Mutex::new(()),
            requests_served: AtomicU64::new(0),
        }
    }

    /// Build from configuration.
    ///
    /// Returns `ServiceUnavailable` when the engine program cannot be found,
    /// so the server can still start and answer search requests.
    pub fn from_config(config: &LocusConfig, store: Arc<dyn MapStore>) -> Result<Self, LocusError> {
        if !program_available(&config.engine.program) {
            return Err(LocusError::ServiceUnavailable(format!(
                "recognition engine {} not found",
                config.engine.program.display()
            )));
        }
        let command = EngineCommand {
            program: config.engine.program.clone(),
            extra_params: config.engine.extra_params.clone(),
            timeout: Duration::from_secs(config.engine.timeout_secs),
        };
        Ok(Self::new(
            command,
            config.store.path.clone(),
            store,
            config.engine.workspace_root.clone(),
        ))
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn status(&self) -> CoordinatorStatus {
        let state = match self.slot.try_lock() {
            Ok(_guard) => CoordinatorState::Idle,
            Err(_) => CoordinatorState::Busy,
        };
        CoordinatorStatus {
            initialized: true,
            state,
            store_path: self.store_path.clone(),
            requests_served: self.requests_served.load(Ordering::Relaxed),
        }
    }

    /// Localize one image against the map.
    pub async fn localize(&self, image: &Path) -> Result<LocalizationResult, LocusError> {
        let started = Instant::now();
        let image_name = validate_image(image).await?;

        let _slot = self.slot.lock().await;
        let request = self.requests_served.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(request, image = %image_name, "localization started");

        let workspace = self.workspace()?;
        let staged = workspace.path().join(&image_name);
        let outcome = match tokio::fs::copy(image, &staged).await {
            Ok(_) => self.command.run(&self.store_path, workspace.path()).await,
            Err(e) => Err(LocusError::IoError(format!(
                "staging {}: {}",
                image.display(),
                e
            ))),
        };

        if let Err(e) = workspace.close() {
            tracing::warn!(request, error = %e, "failed to remove engine workspace");
        }
        let run = outcome?;

        let report = engine_output::parse(&run.output);
        let Some(candidate) = report.candidate else {
            tracing::info!(
                request,
                best = %report.describe_best(),
                source = ?report.source,
                "no localization match"
            );
            return Err(LocusError::NoMatch {
                best: report.describe_best(),
            });
        };

        let resolved = self.resolve(candidate.frame_id).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            request,
            frame_id = %candidate.frame_id,
            confidence = candidate.score,
            x = resolved.position.x,
            y = resolved.position.y,
            yaw = resolved.orientation.yaw,
            elapsed_ms,
            "localization resolved"
        );

        Ok(LocalizationResult {
            frame_id: resolved.frame_id,
            position: resolved.position,
            orientation: resolved.orientation,
            detected_objects: resolved.objects_text,
            confidence: candidate.score,
            elapsed_ms,
            image_name,
        })
    }

    fn workspace(&self) -> Result<tempfile::TempDir, LocusError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match &self.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| LocusError::IoError(format!("creating engine workspace: {}", e)))
    }

    /// Global pose lookup, with the engine's local transform logged beside it.
    async fn resolve(&self, frame_id: FrameId) -> Result<ResolvedPose, LocusError> {
        let store = Arc::clone(&self.store);
        let joined = tokio::task::spawn_blocking(move || {
            match store.local_transform(frame_id) {
                Ok(Some(data)) => match decode_transform(&data) {
                    Ok(local) => tracing::debug!(
                        frame_id = %frame_id,
                        local_x = local.position.x,
                        local_y = local.position.y,
                        local_yaw = local.orientation.yaw,
                        "engine local transform"
                    ),
                    Err(e) => tracing::debug!(frame_id = %frame_id, error = %e, "local transform unreadable"),
                },
                Ok(None) => {}
                Err(e) => tracing::debug!(frame_id = %frame_id, error = %e, "local transform lookup failed"),
            }
            resolve_global_pose(store.as_ref(), frame_id)
        })
        .await
        .map_err(|e| LocusError::Resolution {
            frame: frame_id,
            reason: format!("resolver task failed: {}", e),
        })?;

        joined.map_err(|e| match e {
            LocusError::FrameNotFound(frame) => LocusError::Resolution {
                frame,
                reason: "no global pose recorded for frame".to_string(),
            },
            other => LocusError::Resolution {
                frame: frame_id,
                reason: other.to_string(),
            },
        })
    }
}

/// Check the image exists and is a regular file; returns its file name.
async fn validate_image(image: &Path) -> Result<String, LocusError> {
    let meta = tokio::fs::metadata(image)
        .await
        .map_err(|_| LocusError::InvalidImage(format!("{} does not exist", image.display())))?;
    if !meta.is_file() {
        return Err(LocusError::InvalidImage(format!(
            "{} is not a file",
            image.display()
        )));
    }
    image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LocusError::InvalidImage(format!("{} has no file name", image.display())))
}
