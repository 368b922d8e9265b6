//! # Object Search
//!
//! Resolves a free-text object query into ranked matches anchored to map
//! locations. Three stages:
//!
//! 1. **Normalise** the query (`normalize`, `expand`).
//! 2. **Prefilter** frames in the store with substring patterns. This only
//!    shrinks the candidate set.
//! 3. **Score** every object of every surviving frame (`scoring`) and rank.
//!
//! The search is stateless and read-only; it may run concurrently with
//! itself and with localization.

mod lexicon;
mod normalize;
mod scoring;
mod similarity;

pub use normalize::{expand, normalize, prefilter_terms, surface_form, words};
pub use scoring::{ObjectScore, PrimaryTier, QueryTerms, Term, score_object};
pub use similarity::similarity;

use crate::primitives::{
    DEFAULT_MAX_PREFILTER_FRAMES, MAX_QUERY_LENGTH, MISSING_NOTES_SHORT, UNKNOWN_CLASS,
};
use crate::storage::MapStore;
use crate::types::{FrameId, LocusError, ObjectAnnotation, Position2};
use serde::{Deserialize, Serialize};

// =============================================================================
// RESULT TYPE
// =============================================================================

/// One frame that holds at least one object matching the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub frame_id: FrameId,
    pub location: Position2,
    /// Matching objects rendered as `"<class>: <notes>"`, best first.
    pub objects: Vec<String>,
    /// Best object score in this frame.
    pub score: u32,
    /// Meters from the localized user, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_user: Option<f64>,
}

/// Render an annotation for a search result.
pub fn render_object(object: &ObjectAnnotation) -> String {
    format!(
        "{}: {}",
        object.class_name.as_deref().unwrap_or(UNKNOWN_CLASS),
        object.notes.as_deref().unwrap_or(MISSING_NOTES_SHORT)
    )
}

// =============================================================================
// SEARCH ENGINE
// =============================================================================

/// Query-to-match resolver over a [`MapStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEngine {
    max_frames: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PREFILTER_FRAMES)
    }
}

impl SearchEngine {
    /// Create an engine that scores at most `max_frames` prefiltered frames.
    #[must_use]
    pub const fn new(max_frames: usize) -> Self {
        Self { max_frames }
    }

    #[must_use]
    pub const fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Run a query against `store`.
    ///
    /// Returns frames ranked by their best object score. An empty result is
    /// not an error.
    pub fn search<S>(&self, query: &str, store: &S) -> Result<Vec<SearchMatch>, LocusError>
    where
        S: MapStore + ?Sized,
    {
        let query = validate_query(query)?;
        let terms = QueryTerms::parse(query)?;
        let patterns = prefilter_terms(query);
        let frames = store.prefilter(&patterns, self.max_frames)?;

        tracing::debug!(
            query,
            patterns = patterns.len(),
            candidates = frames.len(),
            "search prefilter"
        );

        let mut matches = Vec::new();
        for record in frames {
            let Some(pose) = record.metadata.global_pose else {
                continue;
            };

            let mut scored: Vec<(u32, &ObjectAnnotation)> = record
                .metadata
                .objects
                .iter()
                .map(|o| (score_object(&terms, o).total, o))
                .filter(|(score, _)| *score > 0)
                .collect();
            if scored.is_empty() {
                continue;
            }
            scored.sort_by(|a, b| b.0.cmp(&a.0));

            matches.push(SearchMatch {
                frame_id: record.frame_id,
                location: pose.position().planar(),
                score: scored[0].0,
                objects: scored.iter().map(|(_, o)| render_object(o)).collect(),
                distance_from_user: None,
            });
        }

        matches.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::info!(query, matches = matches.len(), "search complete");
        Ok(matches)
    }
}

/// Search with the default frame cap.
pub fn search<S>(query: &str, store: &S) -> Result<Vec<SearchMatch>, LocusError>
where
    S: MapStore + ?Sized,
{
    SearchEngine::default().search(query, store)
}

fn validate_query(query: &str) -> Result<&str, LocusError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(LocusError::InvalidQuery("query is empty".to_string()));
    }
    if trimmed.chars().count() > MAX_QUERY_LENGTH {
        return Err(LocusError::InvalidQuery(format!(
            "query longer than {MAX_QUERY_LENGTH} characters"
        )));
    }
    Ok(trimmed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryMapStore;
    use crate::types::GlobalPose;

    fn pose(x: f64, y: f64) -> Option<GlobalPose> {
        Some(GlobalPose {
            x,
            y,
            z: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
        })
    }

    fn dairy_store() -> InMemoryMapStore {
        let mut store = InMemoryMapStore::new();
        store.insert_frame(
            FrameId(1),
            pose(1.0, 2.0),
            vec![ObjectAnnotation::new("milk", "whole milk 1L")],
        );
        store.insert_frame(
            FrameId(2),
            pose(3.0, -1.0),
            vec![
                ObjectAnnotation::new("cheese", "cheddar"),
                ObjectAnnotation::new("milk", "2% milk 1L"),
            ],
        );
        store
    }

    #[test]
    fn two_percent_milk_excludes_whole_milk() {
        let results = search("2% milk", &dairy_store()).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].frame_id, FrameId(2));
        assert_eq!(results[0].objects, vec!["milk: 2% milk 1L".to_string()]);
        assert_eq!(results[0].location, Position2::new(3.0, -1.0));
    }

    #[test]
    fn single_word_returns_all_frames() {
        let results = search("milk", &dairy_store()).expect("search");
        let ids: Vec<_> = results.iter().map(|m| m.frame_id).collect();
        assert_eq!(ids, vec![FrameId(1), FrameId(2)]);
    }

    #[test]
    fn frames_ranked_by_best_score() {
        let mut store = InMemoryMapStore::new();
        store.insert_frame(
            FrameId(1),
            pose(0.0, 0.0),
            vec![ObjectAnnotation::new("toilet_paper", "")],
        );
        store.insert_frame(FrameId(2), pose(0.0, 0.0), vec![ObjectAnnotation::new("paper", "")]);
        let results = search("paper", &store).expect("search");
        assert_eq!(results[0].frame_id, FrameId(2));
        assert_eq!(results[1].frame_id, FrameId(1));
    }

    #[test]
    fn frames_without_pose_are_skipped() {
        let mut store = dairy_store();
        store.insert_json(FrameId(3), r#"[{"class_name":"milk","notes":"oat"}]"#);
        let results = search("milk", &store).expect("search");
        assert!(results.iter().all(|m| m.frame_id != FrameId(3)));
    }

    #[test]
    fn missing_fields_render_defaults() {
        let object = ObjectAnnotation {
            class_name: None,
            notes: None,
        };
        assert_eq!(render_object(&object), "Unknown: No description");
    }

    #[test]
    fn no_matches_is_empty_not_error() {
        let results = search("anvil", &dairy_store()).expect("search");
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_queries() {
        assert!(search("   ", &dairy_store()).is_err());
        assert!(search(&"x".repeat(MAX_QUERY_LENGTH + 1), &dairy_store()).is_err());
    }
}
