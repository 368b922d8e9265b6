//! # SQLite Map Store
//!
//! Reads the map database produced by the mapping pipeline.
//!
//! Every call opens its own read-only connection and drops it before
//! returning. Connections are never shared between concurrent callers.

use super::{MapStore, contains_pattern};
use crate::pose::TransformData;
use crate::types::{FrameId, FrameMetadata, FrameRecord, LocusError};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params, params_from_iter};
use std::path::{Path, PathBuf};

/// A map store backed by an SQLite file on disk.
#[derive(Debug, Clone)]
pub struct SqliteMapStore {
    path: PathBuf,
}

impl SqliteMapStore {
    /// Point at an existing database file. The file is not opened yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LocusError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LocusError::NotFound(format!(
                "map database '{}' does not exist",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, LocusError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool, LocusError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl MapStore for SqliteMapStore {
    fn frame(&self, frame_id: FrameId) -> Result<Option<FrameRecord>, LocusError> {
        let conn = self.connect()?;
        let json: Option<Option<String>> = conn
            .query_row(
                "SELECT metadata_json FROM ObjMeta WHERE frame_id = ?1",
                params![frame_id.value()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(Some(text)) => Ok(Some(FrameRecord {
                frame_id,
                metadata: FrameMetadata::from_json(&text)?,
            })),
            Some(None) => Ok(Some(FrameRecord {
                frame_id,
                metadata: FrameMetadata::default(),
            })),
            None => Ok(None),
        }
    }

    fn prefilter(&self, terms: &[String], limit: usize) -> Result<Vec<FrameRecord>, LocusError> {
        let conn = self.connect()?;

        let mut sql = String::from("SELECT frame_id, metadata_json FROM ObjMeta");
        if !terms.is_empty() {
            let conditions = vec!["metadata_json LIKE ?"; terms.len()].join(" OR ");
            sql.push_str(" WHERE ");
            sql.push_str(&conditions);
        }
        sql.push_str(" ORDER BY frame_id LIMIT ?");

        let mut values: Vec<rusqlite::types::Value> = terms
            .iter()
            .map(|t| rusqlite::types::Value::Text(contains_pattern(t)))
            .collect();
        values.push(rusqlite::types::Value::Integer(
            i64::try_from(limit).unwrap_or(i64::MAX),
        ));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, json) = row?;
            match FrameMetadata::from_json(json.as_deref().unwrap_or("")) {
                Ok(metadata) => records.push(FrameRecord {
                    frame_id: FrameId(id),
                    metadata,
                }),
                Err(e) => {
                    tracing::warn!(frame_id = id, error = %e, "Skipping unreadable frame metadata");
                }
            }
        }
        Ok(records)
    }

    fn frame_count(&self) -> Result<usize, LocusError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ObjMeta", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn local_transform(&self, frame_id: FrameId) -> Result<Option<TransformData>, LocusError> {
        let conn = self.connect()?;
        if !table_exists(&conn, "Node")? {
            return Ok(None);
        }
        let data = conn
            .query_row(
                "SELECT pose FROM Node WHERE id = ?1",
                params![frame_id.value()],
                |row| {
                    Ok(match row.get_ref(0)? {
                        ValueRef::Blob(bytes) => Some(TransformData::Blob(bytes.to_vec())),
                        ValueRef::Text(text) => Some(TransformData::Text(
                            String::from_utf8_lossy(text).into_owned(),
                        )),
                        _ => None,
                    })
                },
            )
            .optional()?;
        Ok(data.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_store(dir: &TempDir) -> SqliteMapStore {
        let path = dir.path().join("map.db");
        let conn = Connection::open(&path).expect("create");
        conn.execute_batch(
            "CREATE TABLE ObjMeta (frame_id INTEGER PRIMARY KEY, metadata_json TEXT);
             CREATE TABLE Node (id INTEGER PRIMARY KEY, pose BLOB);",
        )
        .expect("schema");
        let rows = [
            (3, r#"{"global_pose":{"x":1,"y":2,"z":0},"objects":[{"class_name":"Milk","notes":"2% milk 1L"}]}"#),
            (1, r#"{"global_pose":{"x":0,"y":0,"z":0},"objects":[{"class_name":"bread","notes":"rye"}]}"#),
            (2, r#"[{"class_name":"milk","notes":"legacy"}]"#),
            (4, "{not json milk"),
        ];
        for (id, json) in rows {
            conn.execute(
                "INSERT INTO ObjMeta (frame_id, metadata_json) VALUES (?1, ?2)",
                params![id, json],
            )
            .expect("insert");
        }
        let pose: Vec<u8> = [1.0f32, 0.0, 0.0, 0.5, 0.25, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        conn.execute("INSERT INTO Node (id, pose) VALUES (3, ?1)", params![pose])
            .expect("node");
        SqliteMapStore::open(&path).expect("open")
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = SqliteMapStore::open(dir.path().join("absent.db")).expect_err("missing");
        assert!(matches!(err, LocusError::NotFound(_)));
    }

    #[test]
    fn frame_reads_both_shapes() {
        let dir = TempDir::new().expect("tempdir");
        let store = build_store(&dir);

        let current = store.frame(FrameId(3)).expect("read").expect("row");
        assert!(current.metadata.global_pose.is_some());
        let legacy = store.frame(FrameId(2)).expect("read").expect("row");
        assert!(legacy.metadata.global_pose.is_none());
        assert!(store.frame(FrameId(99)).expect("read").is_none());
    }

    #[test]
    fn prefilter_is_case_insensitive_and_ordered() {
        let dir = TempDir::new().expect("tempdir");
        let store = build_store(&dir);

        let hits = store
            .prefilter(&["milk".to_string(), "zzz".to_string()], 10)
            .expect("prefilter");
        let ids: Vec<_> = hits.iter().map(|r| r.frame_id).collect();
        // Frame 4 matches but cannot be parsed.
        assert_eq!(ids, vec![FrameId(2), FrameId(3)]);
        assert_eq!(store.frame_count().expect("count"), 4);
    }

    #[test]
    fn local_transform_reads_node_pose() {
        let dir = TempDir::new().expect("tempdir");
        let store = build_store(&dir);

        let data = store.local_transform(FrameId(3)).expect("read").expect("pose");
        let pose = crate::pose::decode_transform(&data).expect("decode");
        assert!((pose.position.x - 0.5).abs() < 1e-6);
        assert!(store.local_transform(FrameId(1)).expect("read").is_none());
    }
}
