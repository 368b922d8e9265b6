//! # Fixed Constants
//!
//! Thresholds, scores and limits shared across the Locus core.
//!
//! These values are compiled in. Several of them are display contracts
//! (rounding precision, separators) that clients parse, so changing one is
//! a breaking change.

// =============================================================================
// OUTPUT PARSER
// =============================================================================

/// Minimum hypothesis score for an engine candidate to be accepted.
pub const HYPOTHESIS_THRESHOLD: f64 = 0.005;

// =============================================================================
// POSE RESOLVER
// =============================================================================

/// Decimal places kept for positions (meters).
pub const POSITION_DECIMALS: i32 = 2;

/// Decimal places kept for angles (radians).
pub const ANGLE_DECIMALS: i32 = 5;

/// Separator between rendered objects in a detected-objects string.
pub const OBJECT_SEPARATOR: &str = " •• ";

/// Class label used when an annotation has none.
pub const UNKNOWN_CLASS: &str = "Unknown";

/// Note text used in pose resolution when an annotation has none.
pub const MISSING_NOTES: &str = "No description available";

/// Note text used in search results when an annotation has none.
pub const MISSING_NOTES_SHORT: &str = "No description";

// =============================================================================
// SEARCH ENGINE
// =============================================================================

/// Longest accepted query, in characters.
pub const MAX_QUERY_LENGTH: usize = 200;

/// Maximum number of expanded terms used to build the prefilter.
pub const MAX_EXPANDED_TERMS: usize = 8;

/// Default cap on frames surviving the prefilter.
pub const DEFAULT_MAX_PREFILTER_FRAMES: usize = 50;

/// Words shorter than this are not used as prefilter patterns.
pub const MIN_PREFILTER_WORD_LEN: usize = 2;

/// Similarity needed for a fuzzy primary or modifier match.
pub const FUZZY_THRESHOLD: f64 = 0.8;

/// Similarity needed for the single-word fallback match.
pub const STRICT_FUZZY_THRESHOLD: f64 = 0.9;

/// Primary term equals the class label.
pub const SCORE_EXACT: u32 = 1000;
/// Primary term is a whole word inside the class label.
pub const SCORE_WHOLE_WORD: u32 = 800;
/// Primary term is similar to the class label.
pub const SCORE_FUZZY: u32 = 600;
/// Single-word fallback: whole word of the class label.
pub const SCORE_FALLBACK_WORD: u32 = 500;
/// Single-word fallback: strict similarity to the class label.
pub const SCORE_FALLBACK_FUZZY: u32 = 400;
/// Single-word fallback: generic term leading the note text.
pub const SCORE_FALLBACK_NOTES: u32 = 200;
/// Modifier found as a word of the notes.
pub const SCORE_MODIFIER_NOTES: u32 = 200;
/// Modifier found inside the class label.
pub const SCORE_MODIFIER_CLASS: u32 = 150;
/// Modifier similar to a word of the notes.
pub const SCORE_MODIFIER_FUZZY: u32 = 100;
/// Bonus when every modifier matched.
pub const SCORE_ALL_MODIFIERS: u32 = 300;

/// Generic structural terms allowed to match on note text alone.
pub const GENERIC_TERMS: &[&str] = &["door", "wall", "floor", "light", "chair", "table"];

// =============================================================================
// NAVIGATION GUIDANCE
// =============================================================================

/// Below this distance (meters) the user has arrived.
pub const ARRIVAL_RADIUS: f64 = 0.3;

/// Degrees covered by one clock hour.
pub const DEGREES_PER_HOUR: f64 = 30.0;

/// Message used when the query matched more than one frame.
pub const MULTIPLE_FRAMES_MESSAGE: &str =
    "The object exists in several frames. I will guide you to the nearest frame.";
