//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::LocusConfig;
use crate::coordinator::engine::program_available;
use crate::workflow::{Workflow, WorkflowResult};
use locus_core::{LocusError, MapStore, SearchEngine, SqliteMapStore};
use serde::Serialize;
use std::path::Path;

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &LocusConfig) -> Result<(), LocusError> {
    println!("Locus Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Store:    {}", config.store.path.display());
    println!("  Engine:   {}", config.engine.program.display());
    println!("  Timeout:  {}s", config.engine.timeout_secs);
    println!();
    println!("Endpoints:");
    for endpoint in api::ENDPOINTS {
        println!("  {}", endpoint);
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(config).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store and engine status.
pub fn cmd_status(config: &LocusConfig, json_mode: bool) -> Result<(), LocusError> {
    let store = SqliteMapStore::open(&config.store.path)?;
    let frame_count = store.frame_count()?;
    let engine_available = program_available(&config.engine.program);

    if json_mode {
        let output = serde_json::json!({
            "store_path": config.store.path.to_string_lossy(),
            "frame_count": frame_count,
            "engine": config.engine.program.to_string_lossy(),
            "engine_available": engine_available,
            "engine_timeout_secs": config.engine.timeout_secs,
            "max_prefilter_frames": config.store.max_prefilter_frames,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Locus Status");
    println!("============");
    println!("Store:            {}", config.store.path.display());
    println!("Frames:           {}", frame_count);
    println!(
        "Engine:           {} ({})",
        config.engine.program.display(),
        if engine_available { "available" } else { "not found" }
    );
    println!("Engine timeout:   {}s", config.engine.timeout_secs);
    println!("Prefilter frames: {}", config.store.max_prefilter_frames);

    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Find an object in the map.
pub fn cmd_search(
    config: &LocusConfig,
    query: &str,
    json_mode: bool,
    verbose: bool,
) -> Result<(), LocusError> {
    let store = SqliteMapStore::open(&config.store.path)?;
    let engine = SearchEngine::new(config.store.max_prefilter_frames);
    let results = engine.search(query, &store)?;

    if json_mode {
        print_json(&api::SearchResponse::new(query.trim(), results));
        return Ok(());
    }

    if results.is_empty() {
        println!("No matches for \"{}\"", query.trim());
        return Ok(());
    }

    println!("{} match(es) for \"{}\":", results.len(), query.trim());
    for m in &results {
        println!(
            "  frame {:>6}  score {:>5}  at ({:.2}, {:.2})",
            m.frame_id, m.score, m.location.x, m.location.y
        );
        let shown = if verbose { m.objects.len() } else { 1 };
        for object in m.objects.iter().take(shown) {
            println!("      {}", object);
        }
    }
    Ok(())
}

// =============================================================================
// LOCALIZE COMMAND
// =============================================================================

/// Localize an image against the map.
pub async fn cmd_localize(
    config: &LocusConfig,
    image: &Path,
    json_mode: bool,
) -> Result<(), LocusError> {
    let workflow = Workflow::from_config(config)?;
    let coordinator = workflow.coordinator().ok_or_else(|| {
        LocusError::ServiceUnavailable(format!(
            "recognition engine {} not found",
            config.engine.program.display()
        ))
    })?;
    let result = coordinator.localize(image).await?;

    if json_mode {
        print_json(&result);
        return Ok(());
    }

    println!("Localized {}", result.image_name);
    println!("  Frame:       {}", result.frame_id);
    println!("  Confidence:  {}", result.confidence);
    println!(
        "  Position:    ({}, {}, {})",
        result.position.x, result.position.y, result.position.z
    );
    println!(
        "  Orientation: roll {} pitch {} yaw {}",
        result.orientation.roll, result.orientation.pitch, result.orientation.yaw
    );
    println!("  Objects:     {}", result.detected_objects);
    println!("  Elapsed:     {} ms", result.elapsed_ms);
    Ok(())
}

// =============================================================================
// NAVIGATE COMMAND
// =============================================================================

/// Search, localize and print directions.
pub async fn cmd_navigate(
    config: &LocusConfig,
    query: &str,
    image: &Path,
    timing: bool,
    json_mode: bool,
) -> Result<(), LocusError> {
    let workflow = Workflow::from_config(config)?;
    let result = workflow.run(query, image, timing).await;

    if json_mode {
        print_json(&result);
    } else {
        print_workflow(&result);
    }

    if result.success {
        Ok(())
    } else {
        Err(LocusError::EngineFailure(
            result
                .error_message
                .unwrap_or_else(|| format!("workflow ended with {}", result.workflow_status)),
        ))
    }
}

fn print_workflow(result: &WorkflowResult) {
    println!("Search \"{}\": {} match(es)", result.search_term, result.total_matches);
    println!("Status: {}", result.workflow_status);

    if let Some(loc) = &result.localization_results {
        println!(
            "You are at frame {} ({}, {}), facing yaw {}",
            loc.frame_id, loc.position.x, loc.position.y, loc.orientation.yaw
        );
    }

    if let Some(plan) = &result.navigation_guidance {
        println!();
        println!("{}", plan.guidance.clock_instruction);
        println!(
            "  Target frame {} at {:.2} m, bearing {:.1} deg ({} o'clock)",
            plan.target_frame_id,
            plan.guidance.distance,
            plan.guidance.bearing,
            plan.guidance.clock_position
        );
        if let Some(message) = &plan.multiple_frames_message {
            println!("  {}", message);
        }
    }

    if let Some(t) = &result.timing {
        println!();
        println!(
            "Timing: search {} ms, localization {} ms, total {} ms",
            t.search_ms, t.localization_ms, t.total_ms
        );
    }
}
