//! In-memory map store used by tests, benchmarks and fixtures.

use super::{MapStore, contains_pattern, like_matches};
use crate::pose::TransformData;
use crate::types::{
    FrameId, FrameMetadata, FrameRecord, GlobalPose, LocusError, ObjectAnnotation,
};
use std::collections::BTreeMap;

/// A map store held entirely in memory.
///
/// Metadata is kept as raw JSON text so prefiltering sees exactly what the
/// SQLite backend would see.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMapStore {
    metadata: BTreeMap<FrameId, String>,
    transforms: BTreeMap<FrameId, TransformData>,
}

impl InMemoryMapStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw `metadata_json` text for a frame.
    pub fn insert_json(&mut self, frame_id: FrameId, json: impl Into<String>) {
        self.metadata.insert(frame_id, json.into());
    }

    /// Insert a frame in the current metadata shape.
    pub fn insert_frame(
        &mut self,
        frame_id: FrameId,
        pose: Option<GlobalPose>,
        objects: Vec<ObjectAnnotation>,
    ) {
        let json = serde_json::json!({
            "global_pose": pose,
            "objects": objects,
        });
        self.metadata.insert(frame_id, json.to_string());
    }

    /// Record a local transform for a frame.
    pub fn insert_transform(&mut self, frame_id: FrameId, data: TransformData) {
        self.transforms.insert(frame_id, data);
    }

    /// Remove a frame entirely.
    pub fn remove(&mut self, frame_id: FrameId) {
        self.metadata.remove(&frame_id);
        self.transforms.remove(&frame_id);
    }
}

impl MapStore for InMemoryMapStore {
    fn frame(&self, frame_id: FrameId) -> Result<Option<FrameRecord>, LocusError> {
        self.metadata
            .get(&frame_id)
            .map(|json| {
                Ok(FrameRecord {
                    frame_id,
                    metadata: FrameMetadata::from_json(json)?,
                })
            })
            .transpose()
    }

    fn prefilter(&self, terms: &[String], limit: usize) -> Result<Vec<FrameRecord>, LocusError> {
        let patterns: Vec<String> = terms.iter().map(|t| contains_pattern(t)).collect();

        let records = self
            .metadata
            .iter()
            .filter(|(_, json)| patterns.is_empty() || patterns.iter().any(|p| like_matches(p, json)))
            .take(limit)
            .filter_map(|(id, json)| match FrameMetadata::from_json(json) {
                Ok(metadata) => Some(FrameRecord {
                    frame_id: *id,
                    metadata,
                }),
                Err(e) => {
                    tracing::warn!(frame_id = id.value(), error = %e, "Skipping unreadable frame metadata");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    fn frame_count(&self) -> Result<usize, LocusError> {
        Ok(self.metadata.len())
    }

    fn local_transform(&self, frame_id: FrameId) -> Result<Option<TransformData>, LocusError> {
        Ok(self.transforms.get(&frame_id).cloned())
    }
}
