//! # Navigation Guidance
//!
//! Converts a localized user pose and a target location into distance,
//! relative bearing and a clock-face instruction.
//!
//! Bearings are in degrees. Positive is clockwise from the user's facing
//! direction (to the right), so hour 3 is a right turn and hour 9 a left
//! turn.

use crate::pose::round_to;
use crate::primitives::{ARRIVAL_RADIUS, DEGREES_PER_HOUR, MULTIPLE_FRAMES_MESSAGE};
use crate::search::SearchMatch;
use crate::types::{FrameId, LocusError, Position2};
use serde::{Deserialize, Serialize};

/// Decimal places kept for the reported distance.
const DISTANCE_DECIMALS: i32 = 2;

/// Decimal places kept for the reported bearing.
const BEARING_DECIMALS: i32 = 1;

// =============================================================================
// AXIS CONVENTION
// =============================================================================

/// How store coordinates map onto the navigation plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConvention {
    /// Negate the Y delta and the user yaw before any trigonometry.
    pub invert_y: bool,
    /// Heading (degrees, corrected frame) that a yaw of zero faces.
    pub yaw_origin_deg: f64,
}

impl AxisConvention {
    /// RTAB-Map stores: forward is decreasing Y, yaw zero faces +X.
    #[must_use]
    pub const fn rtabmap() -> Self {
        Self {
            invert_y: true,
            yaw_origin_deg: 0.0,
        }
    }

    /// Stores whose yaw zero faces the forward (decreasing Y) axis.
    #[must_use]
    pub const fn forward_negative_y() -> Self {
        Self {
            invert_y: true,
            yaw_origin_deg: 90.0,
        }
    }
}

impl Default for AxisConvention {
    fn default() -> Self {
        Self::rtabmap()
    }
}

// =============================================================================
// GUIDANCE
// =============================================================================

/// Directions from the user to one target location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationGuidance {
    /// Meters, 2 decimals.
    pub distance: f64,
    /// Relative bearing in `[-180, 180]`, 1 decimal.
    pub bearing: f64,
    /// Clock hour in `[1, 12]`; 12 is straight ahead.
    pub clock_position: u8,
    pub clock_instruction: String,
    pub arrived: bool,
    /// 8-point direction with distance wording.
    pub direction: String,
    pub turn_instruction: String,
}

/// Guidance toward the nearest matching frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub target_object: String,
    pub target_frame_id: FrameId,
    pub multiple_frames_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_frames_message: Option<String>,
    pub guidance: NavigationGuidance,
}

/// Computes guidance under a fixed axis convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Navigator {
    axis: AxisConvention,
}

impl Navigator {
    #[must_use]
    pub const fn new(axis: AxisConvention) -> Self {
        Self { axis }
    }

    #[must_use]
    pub const fn axis(&self) -> AxisConvention {
        self.axis
    }

    /// Relative bearing in degrees, normalized into `[-180, 180]`.
    pub fn relative_bearing(&self, user: Position2, user_yaw: f64, target: Position2) -> f64 {
        let dx = target.x - user.x;
        let mut dy = target.y - user.y;
        let mut yaw = user_yaw;
        if self.axis.invert_y {
            dy = -dy;
            yaw = -yaw;
        }
        let absolute = dy.atan2(dx).to_degrees();
        normalize_degrees(absolute - (yaw.to_degrees() + self.axis.yaw_origin_deg))
    }

    /// Guidance from `user` facing `user_yaw` (radians) to `target`.
    pub fn guide(
        &self,
        user: Position2,
        user_yaw: f64,
        target: Position2,
    ) -> Result<NavigationGuidance, LocusError> {
        let inputs = [user.x, user.y, user_yaw, target.x, target.y];
        if inputs.iter().any(|v| !v.is_finite()) {
            return Err(LocusError::InvalidInput(
                "guidance inputs must be finite".to_string(),
            ));
        }

        let distance = user.distance_to(&target);
        let bearing = self.relative_bearing(user, user_yaw, target);
        let clock_position = clock_position(bearing);
        let arrived = distance < ARRIVAL_RADIUS;

        let clock_instruction = if arrived {
            arrival_instruction(None)
        } else {
            format!(
                "{}. Then walk {}.",
                hour_phrase(clock_position),
                distance_phrase(distance)
            )
        };

        Ok(NavigationGuidance {
            distance: round_to(distance, DISTANCE_DECIMALS),
            bearing: round_to(bearing, BEARING_DECIMALS),
            clock_position,
            clock_instruction,
            arrived,
            direction: direction_text(bearing, distance),
            turn_instruction: turn_instruction(bearing).to_string(),
        })
    }

    /// Annotate every match with its distance from `user`, order matches
    /// nearest first and guide toward the nearest one.
    ///
    /// Returns `None` when there are no matches.
    pub fn plan(
        &self,
        target_object: &str,
        user: Position2,
        user_yaw: f64,
        matches: &mut [SearchMatch],
    ) -> Result<Option<RoutePlan>, LocusError> {
        annotate_distances(user, matches);
        let Some(nearest) = matches.first() else {
            return Ok(None);
        };

        let mut guidance = self.guide(user, user_yaw, nearest.location)?;
        if guidance.arrived {
            guidance.clock_instruction = arrival_instruction(Some(target_object));
        }
        let multiple_frames_found = matches.len() > 1;

        tracing::info!(
            target_frame = %nearest.frame_id,
            distance = guidance.distance,
            bearing = guidance.bearing,
            clock = guidance.clock_position,
            "guidance computed"
        );

        Ok(Some(RoutePlan {
            target_object: target_object.to_string(),
            target_frame_id: nearest.frame_id,
            multiple_frames_found,
            multiple_frames_message: multiple_frames_found
                .then(|| MULTIPLE_FRAMES_MESSAGE.to_string()),
            guidance,
        }))
    }
}

/// Set `distance_from_user` on every match and sort nearest first.
/// Equal distances keep their search order.
pub fn annotate_distances(user: Position2, matches: &mut [SearchMatch]) {
    for m in matches.iter_mut() {
        m.distance_from_user = Some(user.distance_to(&m.location));
    }
    matches.sort_by(|a, b| {
        let da = a.distance_from_user.unwrap_or(f64::INFINITY);
        let db = b.distance_from_user.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
}

// =============================================================================
// CLOCK FACE
// =============================================================================

/// Wrap an angle in degrees into `[-180, 180)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

/// Quantize a relative bearing to a clock hour in `[1, 12]`.
pub fn clock_position(bearing_deg: f64) -> u8 {
    let mut offset = (bearing_deg / DEGREES_PER_HOUR).round() as i64;
    if offset > 6 {
        offset -= 12;
    } else if offset < -6 {
        offset += 12;
    }
    match offset {
        0 => 12,
        o if o > 0 => o as u8,
        o => (12 + o) as u8,
    }
}

fn hour_phrase(hour: u8) -> String {
    match hour {
        12 => "Face straight ahead at 12 o'clock".to_string(),
        1 => "Turn slightly right to face 1 o'clock".to_string(),
        2 | 3 => format!("Turn right to face {hour} o'clock"),
        4 | 5 => format!("Turn sharply right to face {hour} o'clock"),
        6 => "Turn around to face 6 o'clock".to_string(),
        7 | 8 => format!("Turn sharply left to face {hour} o'clock"),
        9 | 10 => format!("Turn left to face {hour} o'clock"),
        _ => "Turn slightly left to face 11 o'clock".to_string(),
    }
}

fn distance_phrase(distance: f64) -> String {
    if distance < 0.5 {
        "less than half a meter".to_string()
    } else if distance < 1.0 {
        format!("{:.1} meters", distance)
    } else if distance < 2.0 {
        meters((distance * 2.0).round() / 2.0)
    } else if distance < 5.0 {
        format!("approximately {}", meters(distance.round()))
    } else if distance < 10.0 {
        format!("around {}", meters(distance.round()))
    } else {
        format!("about {}", meters((distance / 5.0).round() * 5.0))
    }
}

fn meters(value: f64) -> String {
    if value.fract() == 0.0 {
        let whole = value as i64;
        if whole == 1 {
            "1 meter".to_string()
        } else {
            format!("{whole} meters")
        }
    } else {
        format!("{value:.1} meters")
    }
}

fn arrival_instruction(target: Option<&str>) -> String {
    match target {
        Some(name) => format!("You have arrived. The {name} should be within reach."),
        None => "You have arrived. The target should be within reach.".to_string(),
    }
}

// =============================================================================
// LEGACY WORDING
// =============================================================================

fn compass_word(bearing: f64) -> &'static str {
    if (-22.5..=22.5).contains(&bearing) {
        "straight ahead"
    } else if bearing > 22.5 && bearing <= 67.5 {
        "ahead and to your right"
    } else if bearing > 67.5 && bearing <= 112.5 {
        "on your right"
    } else if bearing > 112.5 && bearing <= 157.5 {
        "behind you on the right"
    } else if !(-157.5..=157.5).contains(&bearing) {
        "directly behind you"
    } else if bearing < -112.5 {
        "behind you on the left"
    } else if bearing < -67.5 {
        "on your left"
    } else {
        "ahead and to your left"
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 8-point direction with distance wording.
pub fn direction_text(bearing: f64, distance: f64) -> String {
    let direction = compass_word(bearing);
    if distance < ARRIVAL_RADIUS {
        format!("Right {direction}")
    } else if distance < 1.0 {
        format!("About 1 meter {direction}")
    } else if distance < 3.0 {
        format!(
            "{}, about {:.1} meters",
            capitalize(direction),
            (distance * 2.0).round() / 2.0
        )
    } else if distance < 10.0 {
        format!("{}, roughly {} meters", capitalize(direction), distance.round() as i64)
    } else {
        format!(
            "{}, approximately {} meters away",
            capitalize(direction),
            ((distance / 5.0).round() * 5.0) as i64
        )
    }
}

/// Turn wording banded by the bearing's magnitude.
pub fn turn_instruction(bearing: f64) -> &'static str {
    let magnitude = bearing.abs();
    let right = bearing > 0.0;
    if magnitude < 15.0 {
        "Keep going straight"
    } else if magnitude < 45.0 {
        if right { "Turn slightly to your right" } else { "Turn slightly to your left" }
    } else if magnitude < 90.0 {
        if right { "Make a right turn" } else { "Make a left turn" }
    } else if magnitude < 135.0 {
        if right { "Turn sharply to your right" } else { "Turn sharply to your left" }
    } else {
        "Turn around"
    }
}

// =============================================================================
// TESTS
// =============================================================================
