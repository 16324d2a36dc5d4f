//! Typed snapshots handed to the prompt builder
//!
//! Summaries are captured from a sealed session before the analysis call is
//! issued, so the call never reads live recorder state.

use serde::{Deserialize, Serialize};

use crate::session::types::{ActivityMetrics, ActivitySession, InteractionKind};

/// Maximum number of pointer/touch samples embedded in a summary
pub const MAX_POINTER_SAMPLES: usize = 50;

/// Activity outcome snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Wall-clock session time in seconds
    pub completion_time_sec: f64,
    /// Unpaused session time in seconds
    pub active_time_sec: f64,
    /// Correct / answered (0-1), null without answers
    pub accuracy: Option<f64>,
    /// Mean stretch of active time between pauses, in seconds
    pub attention_span_sec: Option<f64>,
    /// Mean time to answer in seconds, null without answers
    pub average_time_per_question_sec: Option<f64>,
    pub questions_answered: u32,
    pub total_attempts: u32,
    /// Error pattern tags supplied by the activity (e.g. "letter_reversal")
    #[serde(default)]
    pub error_patterns: Vec<String>,
}

impl ActivitySummary {
    pub fn from_metrics(metrics: &ActivityMetrics) -> Self {
        let active_time_sec = metrics.active_duration_ms as f64 / 1000.0;
        let attention_span_sec = if metrics.active_duration_ms > 0 {
            Some(active_time_sec / (metrics.attention.pause_count as f64 + 1.0))
        } else {
            None
        };

        Self {
            completion_time_sec: metrics.total_duration_ms as f64 / 1000.0,
            active_time_sec,
            accuracy: metrics.accuracy,
            attention_span_sec,
            average_time_per_question_sec: metrics
                .average_time_per_question_ms
                .map(|ms| ms / 1000.0),
            questions_answered: metrics.answered,
            total_attempts: metrics.total_attempts,
            error_patterns: Vec::new(),
        }
    }

    /// Attach error pattern tags observed by the activity
    pub fn with_error_patterns(mut self, patterns: Vec<String>) -> Self {
        self.error_patterns = patterns;
        self
    }
}

/// Pointer or touch sample, timed relative to session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub offset_ms: i64,
}

/// Interaction behavior snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSummary {
    pub pointer_events: u32,
    pub touch_events: u32,
    pub key_events: u32,
    /// Evenly strided positional samples, at most [`MAX_POINTER_SAMPLES`]
    pub pointer_samples: Vec<PointerSample>,
    /// Per-answer response delays in seconds, in submission order
    pub response_delays_sec: Vec<f64>,
    /// Attempts beyond the first, summed over all answers
    pub correction_attempts: u32,
}

impl InteractionSummary {
    pub fn from_session(session: &ActivitySession) -> Self {
        let mut pointer_events = 0;
        let mut touch_events = 0;
        let mut key_events = 0;
        for event in &session.interactions {
            match event.kind {
                InteractionKind::Pointer => pointer_events += 1,
                InteractionKind::Touch => touch_events += 1,
                InteractionKind::Key => key_events += 1,
            }
        }

        let positioned: Vec<PointerSample> = session
            .interactions
            .iter()
            .filter_map(|event| {
                event.position.map(|p| PointerSample {
                    x: p.x,
                    y: p.y,
                    offset_ms: (event.timestamp - session.started_at).num_milliseconds(),
                })
            })
            .collect();

        Self {
            pointer_events,
            touch_events,
            key_events,
            pointer_samples: stride_samples(positioned, MAX_POINTER_SAMPLES),
            response_delays_sec: session
                .answers
                .iter()
                .map(|a| a.time_to_answer_ms as f64 / 1000.0)
                .collect(),
            correction_attempts: session
                .answers
                .iter()
                .fold(0u32, |acc, a| {
                    acc.saturating_add(a.attempt_count.saturating_sub(1))
                }),
        }
    }
}

/// Keep at most `max` samples, evenly spaced, always including the first
fn stride_samples(samples: Vec<PointerSample>, max: usize) -> Vec<PointerSample> {
    if max == 0 {
        return Vec::new();
    }
    if samples.len() <= max {
        return samples;
    }
    let len = samples.len();
    samples
        .into_iter()
        .enumerate()
        .filter(|(i, _)| (i * max) % len < max)
        .map(|(_, s)| s)
        .take(max)
        .collect()
}

/// Data sent to the provider for analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequestPayload {
    pub activity_results: ActivitySummary,
    pub interaction_data: InteractionSummary,
}

impl AnalysisRequestPayload {
    /// Capture both snapshots from a sealed session and its metrics
    pub fn from_session(session: &ActivitySession, metrics: &ActivityMetrics) -> Self {
        Self {
            activity_results: ActivitySummary::from_metrics(metrics),
            interaction_data: InteractionSummary::from_session(session),
        }
    }
}
