//! # locus-core
//!
//! The synchronous core of Locus - THE LOGIC.
//!
//! This crate turns a mapped space into answers:
//! - `engine_output`: parses the recognition engine's console report
//! - `pose`: decodes stored transforms and resolves authoritative poses
//! - `search`: resolves a free-text object query into ranked frame matches
//! - `guidance`: converts a user pose and a target into spoken directions
//! - `storage`: read-only access to the map store
//!
//! ## Architectural Constraints
//!
//! - No async, no network, no subprocesses (the app crate owns those)
//! - The map store is read-only from here
//! - Every fallible operation returns `Result<T, LocusError>`

// =============================================================================
// MODULES
// =============================================================================

pub mod engine_output;
pub mod guidance;
pub mod pose;
pub mod primitives;
pub mod search;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ErrorKind, FrameId, FrameMetadata, FrameRecord, GlobalPose, LocusError, ObjectAnnotation,
    Orientation, Pose, Position2, Position3,
};

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use engine_output::{GRAMMAR_VERSION, HypothesisMatch, MatchSource, ParsedReport};
pub use guidance::{AxisConvention, NavigationGuidance, Navigator, RoutePlan};
pub use pose::{ResolvedPose, TransformData, decode_transform, resolve_global_pose};
pub use search::{SearchEngine, SearchMatch};
pub use storage::{InMemoryMapStore, MapStore, SqliteMapStore};
