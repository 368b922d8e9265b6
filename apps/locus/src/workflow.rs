//! # Workflow Orchestrator
//!
//! `search -> localize -> guide` for one request.
//!
//! Search failures end the workflow. An empty search result is a successful
//! answer and stops before the engine is started. Localization failures are
//! reported as a status with the search results kept. Guidance failures are
//! logged and leave `navigation_guidance` empty.

use crate::config::LocusConfig;
use crate::coordinator::{LocalizationCoordinator, LocalizationResult};
use locus_core::pose::round_to;
use locus_core::{
    FrameId, LocusError, MapStore, Navigator, RoutePlan, SearchEngine, SearchMatch,
    SqliteMapStore,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Where a workflow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Completed,
    NoMatches,
    SearchFailed,
    ServiceNotInitialized,
    LocalizationFailed,
    LocalizationTimeout,
    LocalizationError,
}

impl WorkflowStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::NoMatches => "no_matches",
            Self::SearchFailed => "search_failed",
            Self::ServiceNotInitialized => "service_not_initialized",
            Self::LocalizationFailed => "localization_failed",
            Self::LocalizationTimeout => "localization_timeout",
            Self::LocalizationError => "localization_error",
        }
    }

    /// Status for a failed localization.
    pub const fn for_localization_error(error: &LocusError) -> Self {
        match error {
            LocusError::EngineTimeout { .. } => Self::LocalizationTimeout,
            LocusError::NoMatch { .. }
            | LocusError::Resolution { .. }
            | LocusError::FrameNotFound(_) => Self::LocalizationFailed,
            _ => Self::LocalizationError,
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage durations in milliseconds, rounded to 0.1 ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTiming {
    pub search_ms: f64,
    pub localization_ms: f64,
    pub total_ms: f64,
}

/// Everything one workflow run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub success: bool,
    pub search_term: String,
    pub search_results: Vec<SearchMatch>,
    pub localization_results: Option<LocalizationResult>,
    pub navigation_guidance: Option<RoutePlan>,
    pub nearest_frame_id: Option<FrameId>,
    pub total_distance_to_target: Option<f64>,
    pub multiple_frames_found: bool,
    pub total_matches: usize,
    pub workflow_status: WorkflowStatus,
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<WorkflowTiming>,
}

impl WorkflowResult {
    fn new(search_term: &str, status: WorkflowStatus) -> Self {
        Self {
            success: false,
            search_term: search_term.to_string(),
            search_results: Vec::new(),
            localization_results: None,
            navigation_guidance: None,
            nearest_frame_id: None,
            total_distance_to_target: None,
            multiple_frames_found: false,
            total_matches: 0,
            workflow_status: status,
            error_message: None,
            timing: None,
        }
    }

    fn fail(mut self, status: WorkflowStatus) -> Self {
        self.success = false;
        self.workflow_status = status;
        self.error_message = Some(format!("Workflow failed at {} stage", status));
        self
    }
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Shared handles for running workflows.
#[derive(Clone)]
pub struct Workflow {
    store: Arc<dyn MapStore>,
    search: SearchEngine,
    navigator: Navigator,
    coordinator: Option<Arc<LocalizationCoordinator>>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("search", &self.search)
            .field("navigator", &self.navigator)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl Workflow {
    pub fn new(
        store: Arc<dyn MapStore>,
        search: SearchEngine,
        navigator: Navigator,
        coordinator: Option<Arc<LocalizationCoordinator>>,
    ) -> Self {
        Self {
            store,
            search,
            navigator,
            coordinator,
        }
    }

    /// Open the map store and build the coordinator from configuration.
    ///
    /// A missing store is an error. A missing engine only disables
    /// localization.
    pub fn from_config(config: &LocusConfig) -> Result<Self, LocusError> {
        let store: Arc<dyn MapStore> = Arc::new(SqliteMapStore::open(&config.store.path)?);

        let coordinator = match LocalizationCoordinator::from_config(config, Arc::clone(&store)) {
            Ok(c) => Some(Arc::new(c)),
            Err(e) => {
                tracing::warn!(error = %e, "localization disabled");
                None
            }
        };

        Ok(Self::new(
            store,
            SearchEngine::new(config.store.max_prefilter_frames),
            Navigator::new(config.navigation.axis()),
            coordinator,
        ))
    }

    pub fn coordinator(&self) -> Option<&Arc<LocalizationCoordinator>> {
        self.coordinator.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn MapStore> {
        &self.store
    }

    pub const fn navigator(&self) -> Navigator {
        self.navigator
    }

    /// Run the search stage off the async runtime.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchMatch>, LocusError> {
        let store = Arc::clone(&self.store);
        let engine = self.search;
        let query = query.to_string();
        tokio::task::spawn_blocking(move || engine.search(&query, store.as_ref()))
            .await
            .map_err(|e| LocusError::Store(format!("search task failed: {}", e)))?
    }

    /// Search for `query`, localize `image`, and guide to the nearest match.
    pub async fn run(&self, query: &str, image: &Path, include_timing: bool) -> WorkflowResult {
        let started = Instant::now();
        let mut result = WorkflowResult::new(query, WorkflowStatus::Completed);

        let Some(coordinator) = &self.coordinator else {
            tracing::warn!(query, "workflow rejected: coordinator not initialized");
            return result.fail(WorkflowStatus::ServiceNotInitialized);
        };

        let search_started = Instant::now();
        let searched = self.search(query).await;
        let search_elapsed = search_started.elapsed();

        let mut matches = match searched {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(query, error = %e, "workflow search failed");
                let mut failed = result.fail(WorkflowStatus::SearchFailed);
                failed.timing = include_timing.then(|| timing(search_elapsed, Duration::ZERO, started));
                return failed;
            }
        };

        if matches.is_empty() {
            tracing::info!(query, "workflow: no matches, skipping localization");
            result.success = true;
            result.workflow_status = WorkflowStatus::NoMatches;
            result.timing = include_timing.then(|| timing(search_elapsed, Duration::ZERO, started));
            return result;
        }

        let localization_started = Instant::now();
        let localized = coordinator.localize(image).await;
        let localization_elapsed = localization_started.elapsed();

        let localization = match localized {
            Ok(loc) => loc,
            Err(e) => {
                let status = WorkflowStatus::for_localization_error(&e);
                tracing::warn!(query, error = %e, status = %status, "workflow localization failed");
                result.total_matches = matches.len();
                result.search_results = matches;
                let mut failed = result.fail(status);
                failed.timing =
                    include_timing.then(|| timing(search_elapsed, localization_elapsed, started));
                return failed;
            }
        };

        match self.navigator.plan(
            query,
            localization.position.planar(),
            localization.orientation.yaw,
            &mut matches,
        ) {
            Ok(Some(plan)) => {
                result.nearest_frame_id = Some(plan.target_frame_id);
                result.total_distance_to_target = Some(plan.guidance.distance);
                result.multiple_frames_found = plan.multiple_frames_found;
                result.navigation_guidance = Some(plan);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(query, error = %e, "guidance omitted"),
        }

        result.success = true;
        result.total_matches = matches.len();
        result.search_results = matches;
        result.localization_results = Some(localization);
        result.timing = include_timing.then(|| timing(search_elapsed, localization_elapsed, started));

        tracing::info!(
            query,
            matches = result.total_matches,
            nearest_frame = ?result.nearest_frame_id,
            distance = ?result.total_distance_to_target,
            "workflow completed"
        );
        result
    }
}

fn timing(search: Duration, localization: Duration, started: Instant) -> WorkflowTiming {
    WorkflowTiming {
        search_ms: millis(search),
        localization_ms: millis(localization),
        total_ms: millis(started.elapsed()),
    }
}

fn millis(d: Duration) -> f64 {
    round_to(d.as_secs_f64() * 1000.0, 1)
}
