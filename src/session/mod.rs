//! Activity session recording
//!
//! This module captures a learner's behavioral telemetry during one activity
//! (pointer, touch and key events, answers, attention pauses) and derives
//! metrics from the sealed session.
//!
//! Flow: UI events → InteractionBuffer → SessionRecorder → sealed ActivitySession → ActivityMetrics

pub mod buffer;
pub mod clock;
pub mod metrics;
pub mod recorder;
pub mod replay;
pub mod subscription;
pub mod types;

pub use buffer::{InteractionBuffer, DEFAULT_FLUSH_THRESHOLD};
pub use clock::{Clock, ManualClock, SystemClock};
pub use metrics::compute_metrics;
pub use recorder::{RecorderState, SessionRecorder};
pub use replay::{replay, ReplayCommand, ReplayStep};
pub use subscription::{forward_events, pump_events, InteractionSink};
pub use types::{
    ActivityMetrics, ActivitySession, AnswerRecord, AttentionMetrics, DeviceInfo,
    InteractionEvent, InteractionKind, Position,
};
