//! Session metric derivation
//!
//! Computes derived activity metrics from a sealed session's raw timestamps,
//! answers and pause intervals. Every ratio with an empty denominator is
//! reported as `None` rather than `NaN` or a misleading zero.

use crate::session::types::{ActivityMetrics, ActivitySession, AttentionMetrics};

/// Upper bound of the attention score scale
const ATTENTION_SCORE_MAX: f64 = 10.0;

/// Compute metrics for a session.
///
/// An unsealed session is measured up to its start time, so every
/// duration-based ratio comes out as `None`.
pub fn compute_metrics(session: &ActivitySession) -> ActivityMetrics {
    let total_duration_ms = session
        .ended_at
        .map(|end| (end - session.started_at).num_milliseconds().max(0) as u64)
        .unwrap_or(0);
    let paused_duration_ms = saturating_total(session.pause_durations_ms.iter().copied());
    let active_duration_ms = total_duration_ms.saturating_sub(paused_duration_ms);

    let answered = session.answers.len() as u32;
    let correct_answers = session.answers.iter().filter(|a| a.is_correct).count() as u32;
    let total_answer_time_ms =
        saturating_total(session.answers.iter().map(|a| a.time_to_answer_ms));
    let total_attempts = session
        .answers
        .iter()
        .fold(0u32, |acc, a| acc.saturating_add(a.attempt_count));
    let interaction_count = session.interactions.len() as u32;

    let pause_frequency = compute_pause_frequency(session.pause_count, total_duration_ms);

    ActivityMetrics {
        total_duration_ms,
        paused_duration_ms,
        active_duration_ms,
        answered,
        correct_answers,
        accuracy: ratio(correct_answers as f64, answered as f64),
        average_time_per_question_ms: ratio(total_answer_time_ms as f64, answered as f64),
        total_attempts,
        interaction_count,
        interaction_frequency: compute_interaction_frequency(
            interaction_count,
            active_duration_ms,
        ),
        attention: AttentionMetrics {
            pause_count: session.pause_count,
            pause_frequency,
            average_pause_duration_ms: ratio(
                paused_duration_ms as f64,
                session.pause_count as f64,
            ),
            attention_score: pause_frequency.map(compute_attention_score),
        },
    }
}

/// Sum that pins at `u64::MAX` instead of overflowing
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// `numerator / denominator`, or None when the denominator is not positive
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Interactions per second of active (unpaused) time
fn compute_interaction_frequency(interaction_count: u32, active_duration_ms: u64) -> Option<f64> {
    ratio(interaction_count as f64, active_duration_ms as f64 / 1000.0)
}

/// Pauses per minute of total session time
fn compute_pause_frequency(pause_count: u32, total_duration_ms: u64) -> Option<f64> {
    ratio(pause_count as f64, total_duration_ms as f64 / 60_000.0)
}

/// Attention score on a 0-10 scale
///
/// Formula: `10 - pauses_per_minute`, clamped to `[0, 10]`
fn compute_attention_score(pause_frequency: f64) -> f64 {
    (ATTENTION_SCORE_MAX - pause_frequency).clamp(0.0, ATTENTION_SCORE_MAX)
}
