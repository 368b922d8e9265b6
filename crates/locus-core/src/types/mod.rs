//! # Core Type Definitions
//!
//! This module contains the shared types for the Locus core:
//! - Frame identifiers (`FrameId`)
//! - Geometry (`Position2`, `Position3`, `Orientation`, `Pose`)
//! - Store records (`ObjectAnnotation`, `GlobalPose`, `FrameMetadata`)
//! - Error types (`LocusError`, `ErrorKind`)
//!
//! Frames are created when the map is built, outside this system.
//! Everything here is read-only from the core's point of view.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// FRAME IDENTIFIER
// =============================================================================

/// Identifier of a mapped viewpoint (RTAB-Map node id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub i64);

impl FrameId {
    /// Get the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// A planar location in map coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2 {
    pub x: f64,
    pub y: f64,
}

impl Position2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Plain Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(&self, other: &Position2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// A location in map coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Drop the vertical component.
    #[must_use]
    pub const fn planar(&self) -> Position2 {
        Position2 {
            x: self.x,
            y: self.y,
        }
    }
}

/// Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Orientation {
    #[must_use]
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// Position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Position3,
    pub orientation: Orientation,
}

// =============================================================================
// STORE RECORDS
// =============================================================================

/// An object annotated on a frame when the map was built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectAnnotation {
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ObjectAnnotation {
    /// Create an annotation with both fields present.
    #[must_use]
    pub fn new(class_name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            notes: Some(notes.into()),
        }
    }

    /// Class label, or the empty string when absent.
    #[must_use]
    pub fn class_str(&self) -> &str {
        self.class_name.as_deref().unwrap_or("")
    }

    /// Note text, or the empty string when absent.
    #[must_use]
    pub fn notes_str(&self) -> &str {
        self.notes.as_deref().unwrap_or("")
    }
}

/// The optimized pose stored alongside a frame's annotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,
}

impl GlobalPose {
    #[must_use]
    pub const fn position(&self) -> Position3 {
        Position3::new(self.x, self.y, self.z)
    }

    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        Orientation::new(self.roll, self.pitch, self.yaw)
    }
}

/// Parsed contents of a frame's `metadata_json` column.
///
/// Two shapes exist in deployed stores: the current object form
/// `{"global_pose": {...}, "objects": [...]}` and a legacy bare list of
/// objects with no pose.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameMetadata {
    pub global_pose: Option<GlobalPose>,
    pub objects: Vec<ObjectAnnotation>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataShape {
    Current {
        #[serde(default)]
        global_pose: Option<GlobalPose>,
        #[serde(default)]
        objects: Vec<ObjectAnnotation>,
    },
    Legacy(Vec<ObjectAnnotation>),
}

impl FrameMetadata {
    /// Decode a `metadata_json` value. Empty text decodes to empty metadata.
    pub fn from_json(text: &str) -> Result<Self, LocusError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let shape: MetadataShape = serde_json::from_str(text)
            .map_err(|e| LocusError::MetadataDecode(e.to_string()))?;
        Ok(match shape {
            MetadataShape::Current {
                global_pose,
                objects,
            } => Self {
                global_pose,
                objects,
            },
            MetadataShape::Legacy(objects) => Self {
                global_pose: None,
                objects,
            },
        })
    }
}

/// A frame as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame_id: FrameId,
    pub metadata: FrameMetadata,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error classes surfaced to callers.
///
/// Each `LocusError` variant belongs to exactly one class; the HTTP layer
/// maps classes to status codes and the workflow maps them to statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    ServiceUnavailable,
    EngineTimeout,
    EngineFailure,
    Resolution,
    SearchFailure,
}

/// Errors that can occur in the Locus system.
///
/// - No silent failures
/// - Use `Result<T, LocusError>` for fallible operations
/// - Per-request failures are values, never panics
#[derive(Debug, Error)]
pub enum LocusError {
    /// The query is empty or otherwise unusable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A numeric input was not finite.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An image input was missing, conflicting or malformed.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A stored transform could not be decoded.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// No authoritative pose exists for the frame.
    #[error("Frame not found: {0}")]
    FrameNotFound(FrameId),

    /// Some other requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The map store could not be read.
    #[error("Store error: {0}")]
    Store(String),

    /// A frame's metadata JSON is malformed.
    #[error("Metadata decode error: {0}")]
    MetadataDecode(String),

    /// The recognition engine exceeded its wall-clock budget and was killed.
    #[error("Recognition engine timed out after {seconds}s")]
    EngineTimeout { seconds: u64 },

    /// The recognition engine could not be started or its output read.
    #[error("Recognition engine failure: {0}")]
    EngineFailure(String),

    /// The engine ran but reported no candidate above threshold.
    #[error("No localization match (best: {best})")]
    NoMatch { best: String },

    /// The engine's candidate frame could not be resolved to a global pose.
    #[error("Pose resolution failed for frame {frame}: {reason}")]
    Resolution { frame: FrameId, reason: String },

    /// The localization coordinator is not available.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl LocusError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery(_)
            | Self::InvalidInput(_)
            | Self::InvalidImage(_)
            | Self::Config(_) => {
                ErrorKind::Validation
            }
            Self::FrameNotFound(_) | Self::NotFound(_) => ErrorKind::NotFound,
            Self::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            Self::EngineTimeout { .. } => ErrorKind::EngineTimeout,
            Self::EngineFailure(_) | Self::NoMatch { .. } | Self::IoError(_) => {
                ErrorKind::EngineFailure
            }
            Self::Resolution { .. } | Self::InvalidTransform(_) => ErrorKind::Resolution,
            Self::Store(_) | Self::MetadataDecode(_) => ErrorKind::SearchFailure,
        }
    }
}

impl From<rusqlite::Error> for LocusError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
