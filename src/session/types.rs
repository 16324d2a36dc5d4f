//! Session data types
//!
//! This module defines the raw interaction events, answer records and the
//! activity session aggregate that flow through the recorder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interaction event kinds captured from the activity surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Pointer,
    Touch,
    Key,
}

/// Screen position of a pointer or touch event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single timestamped pointer/touch/keyboard occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Event kind
    pub kind: InteractionKind,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Position (present for pointer and touch events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Key value (present for key events)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl InteractionEvent {
    pub fn pointer(timestamp: DateTime<Utc>, x: f64, y: f64) -> Self {
        Self {
            kind: InteractionKind::Pointer,
            timestamp,
            position: Some(Position { x, y }),
            key: None,
        }
    }

    pub fn touch(timestamp: DateTime<Utc>, x: f64, y: f64) -> Self {
        Self {
            kind: InteractionKind::Touch,
            timestamp,
            position: Some(Position { x, y }),
            key: None,
        }
    }

    pub fn key(timestamp: DateTime<Utc>, key: impl Into<String>) -> Self {
        Self {
            kind: InteractionKind::Key,
            timestamp,
            position: None,
            key: Some(key.into()),
        }
    }
}

/// One submitted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Question identifier
    pub question_id: String,
    /// Text the learner submitted
    pub answer_text: String,
    /// Time from question shown to submission, in milliseconds
    pub time_to_answer_ms: u64,
    /// Number of attempts including this one (always >= 1)
    pub attempt_count: u32,
    /// Whether the submission was correct
    pub is_correct: bool,
}

/// Device the session was recorded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Target operating system (e.g. "linux", "ios", "android")
    pub platform: String,
    /// When the device info was captured
    pub captured_at: DateTime<Utc>,
}

impl DeviceInfo {
    /// Capture info for the current build target
    pub fn current(captured_at: DateTime<Utc>) -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            captured_at,
        }
    }
}

/// One bounded recording interval for a single activity attempt
///
/// Fields are public plain data so sessions can round-trip through JSON.
/// Sealing is ownership, not immutability: once `end()` hands the
/// session back the recorder holds no copy, so edits to the returned value
/// never reach the recorder, and metrics reflect whatever the caller passes in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySession {
    /// Unique session identifier
    pub session_id: String,
    /// Session start time
    pub started_at: DateTime<Utc>,
    /// Session end time (None while the session is open)
    pub ended_at: Option<DateTime<Utc>>,
    /// Number of completed pause intervals
    pub pause_count: u32,
    /// Duration of each completed pause interval in milliseconds
    pub pause_durations_ms: Vec<u64>,
    /// Committed interaction events in append order
    pub interactions: Vec<InteractionEvent>,
    /// Submitted answers in submission order
    pub answers: Vec<AnswerRecord>,
    /// Recording device
    pub device: DeviceInfo,
}

impl ActivitySession {
    pub(crate) fn open(session_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            started_at,
            ended_at: None,
            pause_count: 0,
            pause_durations_ms: Vec::new(),
            interactions: Vec::new(),
            answers: Vec::new(),
            device: DeviceInfo::current(started_at),
        }
    }

    /// Whether the session has been sealed by `end()`
    pub fn is_sealed(&self) -> bool {
        self.ended_at.is_some()
    }
}

/// Metrics derived from a sealed session.
///
/// Ratios that have no defined value for the session (no answers, no pauses,
/// zero duration) are `None` and serialize as `null`, never as `NaN` or `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Session wall-clock duration in milliseconds
    pub total_duration_ms: u64,
    /// Sum of pause intervals in milliseconds
    pub paused_duration_ms: u64,
    /// Total minus paused duration in milliseconds
    pub active_duration_ms: u64,
    /// Number of answers recorded
    pub answered: u32,
    /// Number of correct answers
    pub correct_answers: u32,
    /// Correct / answered (0-1)
    pub accuracy: Option<f64>,
    /// Mean time to answer in milliseconds
    pub average_time_per_question_ms: Option<f64>,
    /// Sum of attempt counts across answers
    pub total_attempts: u32,
    /// Number of committed interactions
    pub interaction_count: u32,
    /// Interactions per second of active time
    pub interaction_frequency: Option<f64>,
    /// Attention metrics derived from pauses
    pub attention: AttentionMetrics,
}

/// Pause-derived attention metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionMetrics {
    /// Number of completed pauses
    pub pause_count: u32,
    /// Pauses per minute of total duration
    pub pause_frequency: Option<f64>,
    /// Mean pause duration in milliseconds
    pub average_pause_duration_ms: Option<f64>,
    /// 10 minus pause frequency, clamped to 0-10
    pub attention_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interaction_kind_serialization() {
        let json = serde_json::to_string(&InteractionKind::Pointer).unwrap();
        assert_eq!(json, "\"pointer\"");

        let parsed: InteractionKind = serde_json::from_str("\"key\"").unwrap();
        assert_eq!(parsed, InteractionKind::Key);
    }

    #[test]
    fn test_key_event_omits_position() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let event = InteractionEvent::key(ts, "a");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["kind"], "key");
        assert_eq!(value["key"], "a");
        assert!(value.get("position").is_none());
    }

    #[test]
    fn test_interaction_event_deserialization() {
        let json = r#"{
            "kind": "touch",
            "timestamp": "2024-01-15T14:05:00Z",
            "position": { "x": 12.5, "y": 40.0 }
        }"#;

        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, InteractionKind::Touch);
        assert_eq!(event.position, Some(Position { x: 12.5, y: 40.0 }));
        assert!(event.key.is_none());
    }

    #[test]
    fn test_open_session_is_not_sealed() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let session = ActivitySession::open("s-1".to_string(), ts);

        assert!(!session.is_sealed());
        assert_eq!(session.device.platform, std::env::consts::OS);
        assert!(session.interactions.is_empty());
    }
}
