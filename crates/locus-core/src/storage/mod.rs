//! # Map Store Access
//!
//! The map store is produced by the mapping pipeline and is read-only here.
//! Per-frame annotations live in `ObjMeta(frame_id, metadata_json)`; the
//! engine's local transforms live in `Node(id, pose)`.
//!
//! Two backends implement [`MapStore`]:
//! - [`SqliteMapStore`]: the deployed SQLite file, one connection per call
//! - [`InMemoryMapStore`]: fixtures for tests and benchmarks, with the same
//!   `LIKE` semantics as SQLite

mod memory;
mod sqlite;

pub use memory::InMemoryMapStore;
pub use sqlite::SqliteMapStore;

use crate::pose::TransformData;
use crate::types::{FrameId, FrameRecord, LocusError};

// =============================================================================
// MAPSTORE TRAIT
// =============================================================================

/// Read-only access to a mapped space.
///
/// Implementations must be safe to call from several threads at once;
/// search and localization share one store handle.
pub trait MapStore: Send + Sync {
    /// Fetch one frame's parsed metadata. `None` when the frame has no row.
    fn frame(&self, frame_id: FrameId) -> Result<Option<FrameRecord>, LocusError>;

    /// Frames whose raw metadata text contains any of `terms`
    /// (SQL `LIKE '%term%'`, ASCII case-insensitive), in frame id order,
    /// at most `limit`. With no terms, the first `limit` frames are returned.
    /// Rows whose metadata cannot be parsed are skipped.
    fn prefilter(&self, terms: &[String], limit: usize) -> Result<Vec<FrameRecord>, LocusError>;

    /// Number of annotated frames.
    fn frame_count(&self) -> Result<usize, LocusError>;

    /// The engine's local transform for a frame, if recorded.
    fn local_transform(&self, frame_id: FrameId) -> Result<Option<TransformData>, LocusError>;
}

// =============================================================================
// LIKE SEMANTICS
// =============================================================================

/// SQLite `LIKE` without an ESCAPE clause: `%` matches any run, `_` one
/// character, ASCII letters compare case-insensitively.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let t: Vec<char> = text.chars().map(|c| c.to_ascii_lowercase()).collect();

    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        match p.get(pi) {
            Some('%') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(c) if *c == '_' || *c == t[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match backtrack {
                Some((star, resume)) => {
                    pi = star + 1;
                    ti = resume + 1;
                    backtrack = Some((star, resume + 1));
                }
                None => return false,
            },
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}

/// Wrap a term as a containment pattern.
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("%{}%", term)
}
