//! Shared fixtures for the app integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use locus::coordinator::LocalizationCoordinator;
use locus::coordinator::engine::EngineCommand;
use locus::workflow::Workflow;
use locus_core::{AxisConvention, MapStore, Navigator, SearchEngine, SqliteMapStore};
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A small grocery aisle written to `dir/aisle.db`.
///
/// - frame 10 at (1.0, -2.0): whole milk
/// - frame 11 at (4.0, -1.0): 2% milk and cereal
/// - frame 12: legacy row without a pose
pub fn grocery_store(dir: &Path) -> PathBuf {
    let path = dir.join("aisle.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE ObjMeta (frame_id INTEGER PRIMARY KEY, metadata_json TEXT);
         CREATE TABLE Node (id INTEGER PRIMARY KEY, pose BLOB);",
    )
    .unwrap();

    let frames = [
        (
            10,
            serde_json::json!({
                "global_pose": {"x": 1.0, "y": -2.0, "z": 0.0, "roll": 0.0, "pitch": 0.0, "yaw": 0.0},
                "objects": [{"class_name": "milk", "notes": "whole milk 1L"}],
            }),
        ),
        (
            11,
            serde_json::json!({
                "global_pose": {"x": 4.0, "y": -1.0, "z": 0.0, "roll": 0.0, "pitch": 0.0, "yaw": 0.0},
                "objects": [
                    {"class_name": "milk", "notes": "2% milk 1L"},
                    {"class_name": "cereal", "notes": "Cheerios family size"},
                ],
            }),
        ),
        (
            12,
            serde_json::json!([{"class_name": "door", "notes": "door to the stockroom"}]),
        ),
    ];
    for (id, meta) in frames {
        conn.execute(
            "INSERT INTO ObjMeta (frame_id, metadata_json) VALUES (?1, ?2)",
            params![id, meta.to_string()],
        )
        .unwrap();
    }
    path
}

/// A store file with no tables; every query fails.
pub fn broken_store(dir: &Path) -> PathBuf {
    let path = dir.join("broken.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE Unrelated (id INTEGER);")
        .unwrap();
    path
}

/// Placeholder JPEG bytes; the fake engines never decode them.
pub fn query_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
    path
}

/// Write an executable `sh` script standing in for the recognition engine.
///
/// `$last` holds the workspace directory inside `body`.
#[cfg(unix)]
pub fn fake_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let script = format!("#!/bin/sh\nfor last; do :; done\n{}\n", body);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn coordinator(
    program: &Path,
    store_path: &Path,
    timeout: Duration,
    workspace_root: Option<PathBuf>,
) -> Arc<LocalizationCoordinator> {
    let store: Arc<dyn MapStore> = Arc::new(SqliteMapStore::open(store_path).unwrap());
    Arc::new(LocalizationCoordinator::new(
        EngineCommand {
            program: program.to_path_buf(),
            extra_params: Vec::new(),
            timeout,
        },
        store_path,
        store,
        workspace_root,
    ))
}

pub fn workflow(store_path: &Path, coordinator: Option<Arc<LocalizationCoordinator>>) -> Workflow {
    let store: Arc<dyn MapStore> = Arc::new(SqliteMapStore::open(store_path).unwrap());
    Workflow::new(
        store,
        SearchEngine::default(),
        Navigator::new(AxisConvention::rtabmap()),
        coordinator,
    )
}

/// Entries left in a workspace root.
pub fn leftovers(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .collect()
}
