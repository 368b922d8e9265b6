//! # Pose Resolver
//!
//! Two jobs:
//!
//! 1. Decode a stored 12-value transform into position and Euler angles.
//!    The value order is `r11 r12 r13 tx ty tz r21 r22 r23 r31 r32 r33`.
//! 2. Resolve the authoritative global pose of a frame from the map store.
//!    The decoded transform is only a local estimate; callers that need a
//!    position to navigate from always go through [`resolve_global_pose`].

use crate::primitives::{
    ANGLE_DECIMALS, MISSING_NOTES, OBJECT_SEPARATOR, POSITION_DECIMALS, UNKNOWN_CLASS,
};
use crate::storage::MapStore;
use crate::types::{FrameId, LocusError, ObjectAnnotation, Orientation, Pose, Position3};
use serde::{Deserialize, Serialize};

const VALUE_COUNT: usize = 12;

// =============================================================================
// RAW TRANSFORM INPUT
// =============================================================================

/// A transform as it can appear in a store column.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformData {
    /// Packed little-endian values, 4 bytes (f32) or 8 bytes (f64) each.
    Blob(Vec<u8>),
    /// Whitespace-separated decimal text.
    Text(String),
}

impl TransformData {
    /// Decode into the 12 logical values.
    pub fn values(&self) -> Result<[f64; VALUE_COUNT], LocusError> {
        match self {
            Self::Blob(bytes) if bytes.len() == VALUE_COUNT * 4 => {
                let mut out = [0.0; VALUE_COUNT];
                for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
                    let raw: [u8; 4] = chunk
                        .try_into()
                        .map_err(|_| LocusError::InvalidTransform("short f32 chunk".into()))?;
                    *slot = f64::from(f32::from_le_bytes(raw));
                }
                Ok(out)
            }
            Self::Blob(bytes) if bytes.len() == VALUE_COUNT * 8 => {
                let mut out = [0.0; VALUE_COUNT];
                for (slot, chunk) in out.iter_mut().zip(bytes.chunks_exact(8)) {
                    let raw: [u8; 8] = chunk
                        .try_into()
                        .map_err(|_| LocusError::InvalidTransform("short f64 chunk".into()))?;
                    *slot = f64::from_le_bytes(raw);
                }
                Ok(out)
            }
            Self::Blob(bytes) => Err(LocusError::InvalidTransform(format!(
                "expected 48 or 96 bytes, got {}",
                bytes.len()
            ))),
            Self::Text(text) => {
                let parsed: Vec<f64> = text
                    .split_whitespace()
                    .map(|t| t.parse::<f64>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| LocusError::InvalidTransform(format!("bad number: {}", e)))?;
                parsed.try_into().map_err(|v: Vec<f64>| {
                    LocusError::InvalidTransform(format!("expected 12 values, got {}", v.len()))
                })
            }
        }
    }
}

// =============================================================================
// ROTATION MATH
// =============================================================================

/// Unit quaternion, scalar last.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// Row-major 3x3 rotation matrix.
pub type Rotation = [[f64; 3]; 3];

/// Convert a rotation matrix to a quaternion.
///
/// Picks the branch (trace, or the dominant diagonal element) whose square
/// root argument is largest, so the divisor never approaches zero.
pub fn quaternion_from_matrix(r: &Rotation) -> Quaternion {
    let [[r11, r12, r13], [r21, r22, r23], [r31, r32, r33]] = *r;
    let trace = r11 + r22 + r33;

    if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        Quaternion {
            w: 0.25 * s,
            x: (r32 - r23) / s,
            y: (r13 - r31) / s,
            z: (r21 - r12) / s,
        }
    } else if r11 > r22 && r11 > r33 {
        let s = (1.0 + r11 - r22 - r33).sqrt() * 2.0;
        Quaternion {
            w: (r32 - r23) / s,
            x: 0.25 * s,
            y: (r12 + r21) / s,
            z: (r13 + r31) / s,
        }
    } else if r22 > r33 {
        let s = (1.0 + r22 - r11 - r33).sqrt() * 2.0;
        Quaternion {
            w: (r13 - r31) / s,
            x: (r12 + r21) / s,
            y: 0.25 * s,
            z: (r23 + r32) / s,
        }
    } else {
        let s = (1.0 + r33 - r11 - r22).sqrt() * 2.0;
        Quaternion {
            w: (r21 - r12) / s,
            x: (r13 + r31) / s,
            y: (r23 + r32) / s,
            z: 0.25 * s,
        }
    }
}

/// Roll/pitch/yaw (ZYX convention) from a quaternion.
pub fn euler_from_quaternion(q: &Quaternion) -> Orientation {
    let roll = (2.0 * (q.w * q.x + q.y * q.z)).atan2(1.0 - 2.0 * (q.x * q.x + q.y * q.y));
    // Clamped: numerical noise at gimbal lock pushes |sinp| past 1.
    let sinp = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0);
    let pitch = sinp.asin();
    let yaw = (2.0 * (q.w * q.z + q.x * q.y)).atan2(1.0 - 2.0 * (q.y * q.y + q.z * q.z));
    Orientation::new(roll, pitch, yaw)
}

/// Decode a stored transform into a local pose estimate.
pub fn decode_transform(data: &TransformData) -> Result<Pose, LocusError> {
    let v = data.values()?;
    if v.iter().any(|x| !x.is_finite()) {
        return Err(LocusError::InvalidTransform("non-finite value".into()));
    }
    let rotation: Rotation = [[v[0], v[1], v[2]], [v[6], v[7], v[8]], [v[9], v[10], v[11]]];
    let orientation = euler_from_quaternion(&quaternion_from_matrix(&rotation));
    Ok(Pose {
        position: Position3::new(v[3], v[4], v[5]),
        orientation,
    })
}

// =============================================================================
// GLOBAL POSE RESOLUTION
// =============================================================================

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Authoritative pose of a frame, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPose {
    pub frame_id: FrameId,
    pub position: Position3,
    pub orientation: Orientation,
    /// `"<class>: <notes>"` per object, joined by `" •• "`.
    pub objects_text: String,
}

/// Render annotations as a single detected-objects string.
pub fn objects_text(objects: &[ObjectAnnotation]) -> String {
    objects
        .iter()
        .map(|o| {
            format!(
                "{}: {}",
                o.class_name.as_deref().unwrap_or(UNKNOWN_CLASS),
                o.notes.as_deref().unwrap_or(MISSING_NOTES)
            )
        })
        .collect::<Vec<_>>()
        .join(OBJECT_SEPARATOR)
}

/// Fetch the optimized global pose and annotations of `frame_id`.
///
/// Frames with no record, or whose record carries no global pose (legacy
/// metadata), are `FrameNotFound`.
pub fn resolve_global_pose<S>(store: &S, frame_id: FrameId) -> Result<ResolvedPose, LocusError>
where
    S: MapStore + ?Sized,
{
    let record = store
        .frame(frame_id)?
        .ok_or(LocusError::FrameNotFound(frame_id))?;
    let pose = record
        .metadata
        .global_pose
        .ok_or(LocusError::FrameNotFound(frame_id))?;

    Ok(ResolvedPose {
        frame_id,
        position: Position3::new(
            round_to(pose.x, POSITION_DECIMALS),
            round_to(pose.y, POSITION_DECIMALS),
            round_to(pose.z, POSITION_DECIMALS),
        ),
        orientation: Orientation::new(
            round_to(pose.roll, ANGLE_DECIMALS),
            round_to(pose.pitch, ANGLE_DECIMALS),
            round_to(pose.yaw, ANGLE_DECIMALS),
        ),
        objects_text: objects_text(&record.metadata.objects),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryMapStore;
    use std::f64::consts::FRAC_PI_2;

    const IDENTITY_ROW: [f64; 12] = [1.0, 0.0, 0.0, 1.5, -2.0, 0.25, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

    fn yaw_matrix(yaw: f64) -> [f64; 12] {
        let (s, c) = yaw.sin_cos();
        [c, -s, 0.0, 3.0, 4.0, 0.0, s, c, 0.0, 0.0, 0.0, 1.0]
    }

    #[test]
    fn identity_decodes_to_zero_angles() {
        let text = IDENTITY_ROW.map(|v| v.to_string()).join(" ");
        let pose = decode_transform(&TransformData::Text(text)).expect("decode");
        assert_eq!(pose.position, Position3::new(1.5, -2.0, 0.25));
        assert!(pose.orientation.roll.abs() < 1e-12);
        assert!(pose.orientation.pitch.abs() < 1e-12);
        assert!(pose.orientation.yaw.abs() < 1e-12);
    }

    #[test]
    fn three_encodings_agree() {
        let values = yaw_matrix(0.75);
        let f32_blob: Vec<u8> = values
            .iter()
            .flat_map(|v| (*v as f32).to_le_bytes())
            .collect();
        let f64_blob: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let text = values.map(|v| format!("{v:.9}")).join("  \t");

        let a = decode_transform(&TransformData::Blob(f32_blob)).expect("f32");
        let b = decode_transform(&TransformData::Blob(f64_blob)).expect("f64");
        let c = decode_transform(&TransformData::Text(text)).expect("text");

        for pose in [a, b, c] {
            assert!((pose.orientation.yaw - 0.75).abs() < 1e-6);
            assert!((pose.position.x - 3.0).abs() < 1e-6);
            assert!((pose.position.y - 4.0).abs() < 1e-6);
        }
    }

    #[test]
    fn wrong_lengths_rejected() {
        assert!(decode_transform(&TransformData::Blob(vec![0; 40])).is_err());
        assert!(decode_transform(&TransformData::Text("1 2 3".into())).is_err());
        assert!(decode_transform(&TransformData::Text("1 2 x 4 5 6 7 8 9 10 11 12".into())).is_err());
    }

    #[test]
    fn gimbal_lock_pitch_is_clamped() {
        // Rotation of +90 degrees about Y.
        let r: Rotation = [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
        let o = euler_from_quaternion(&quaternion_from_matrix(&r));
        assert!((o.pitch - FRAC_PI_2).abs() < 1e-6);
        assert!(o.pitch.is_finite());

        let q = Quaternion {
            x: 0.0,
            y: 0.7072,
            z: 0.0,
            w: 0.7072,
        };
        assert!((euler_from_quaternion(&q).pitch - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn each_branch_yields_unit_quaternion() {
        let matrices: [Rotation; 4] = [
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]],
            [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]],
            [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]],
        ];
        for r in &matrices {
            let q = quaternion_from_matrix(r);
            let norm = (q.x * q.x + q.y * q.y + q.z * q.z + q.w * q.w).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rounding_contract() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-0.125_000_1, 2), -0.13);
        assert_eq!(round_to(0.123_456_789, 5), 0.12346);
    }

    #[test]
    fn resolve_rounds_and_renders_objects() {
        let mut store = InMemoryMapStore::new();
        store.insert_json(
            FrameId(7),
            r#"{"global_pose":{"x":1.23456,"y":-9.87654,"z":0.0,"roll":0.1234567,"pitch":0.0,"yaw":3.1415926},
                "objects":[{"class_name":"milk","notes":"2% milk 1L"},{"class_name":"door"}]}"#,
        );

        let resolved = resolve_global_pose(&store, FrameId(7)).expect("resolve");
        assert_eq!(resolved.position, Position3::new(1.23, -9.88, 0.0));
        assert_eq!(resolved.orientation.roll, 0.12346);
        assert_eq!(resolved.orientation.yaw, 3.14159);
        assert_eq!(
            resolved.objects_text,
            "milk: 2% milk 1L •• door: No description available"
        );
    }

    #[test]
    fn resolve_missing_or_legacy_is_not_found() {
        let mut store = InMemoryMapStore::new();
        store.insert_json(FrameId(1), r#"[{"class_name":"door","notes":"exit"}]"#);

        assert!(matches!(
            resolve_global_pose(&store, FrameId(1)),
            Err(LocusError::FrameNotFound(FrameId(1)))
        ));
        assert!(matches!(
            resolve_global_pose(&store, FrameId(2)),
            Err(LocusError::FrameNotFound(FrameId(2)))
        ));
    }

    #[test]
    fn empty_objects_render_empty() {
        assert_eq!(objects_text(&[]), "");
    }
}
