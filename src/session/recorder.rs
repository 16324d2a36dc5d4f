//! Activity session recorder
//!
//! Owns the lifecycle of one activity session at a time: buffered interaction
//! capture, pause tracking, the answer log, and sealing on `end()`.
//!
//! State machine: `Idle --start()--> Open --end()--> Idle`.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::SessionError;
use crate::session::buffer::InteractionBuffer;
use crate::session::clock::{Clock, SystemClock};
use crate::session::metrics::compute_metrics;
use crate::session::types::{ActivityMetrics, ActivitySession, AnswerRecord, InteractionEvent};

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Open,
}

/// Records a single activity session at a time.
///
/// Hold one recorder per activity; independent activities use independent recorders.
#[derive(Debug)]
pub struct SessionRecorder<C: Clock = SystemClock> {
    clock: C,
    session: Option<ActivitySession>,
    buffer: InteractionBuffer,
    pause_started_at: Option<DateTime<Utc>>,
}

impl Default for SessionRecorder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRecorder<SystemClock> {
    /// Create a recorder on the system clock with the default flush threshold
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> SessionRecorder<C> {
    /// Create a recorder reading time from `clock`
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            session: None,
            buffer: InteractionBuffer::default(),
            pause_started_at: None,
        }
    }

    /// Use a custom interaction flush threshold
    pub fn with_buffer(mut self, buffer: InteractionBuffer) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn state(&self) -> RecorderState {
        if self.session.is_some() {
            RecorderState::Open
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Identifier of the open session, if any
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    /// Open a new session.
    ///
    /// Fails with `AlreadyOpen` instead of discarding a session in progress.
    pub fn start(&mut self) -> Result<&str, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyOpen);
        }

        let session = ActivitySession::open(Uuid::new_v4().to_string(), self.clock.now());
        debug!(session_id = %session.session_id, "activity session started");

        self.buffer.clear();
        self.pause_started_at = None;
        let session = self.session.insert(session);
        Ok(session.session_id.as_str())
    }

    /// Abandon the open session without sealing it.
    ///
    /// Returns true if a session was discarded.
    pub fn reset(&mut self) -> bool {
        self.buffer.clear();
        self.pause_started_at = None;
        match self.session.take() {
            Some(session) => {
                debug!(session_id = %session.session_id, "activity session discarded");
                true
            }
            None => false,
        }
    }

    /// Stage an interaction event. Silently dropped when no session is open.
    pub fn record_interaction(&mut self, event: InteractionEvent) {
        let Some(session) = self.session.as_mut() else {
            trace!(kind = ?event.kind, "interaction dropped; no open session");
            return;
        };

        if self.buffer.push(event, &mut session.interactions) {
            trace!(
                committed = session.interactions.len(),
                "interaction batch committed"
            );
        }
    }

    /// Append an answer to the open session
    pub fn record_answer(
        &mut self,
        question_id: impl Into<String>,
        answer_text: impl Into<String>,
        time_to_answer_ms: u64,
        attempts: u32,
        is_correct: bool,
    ) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;

        let question_id = question_id.into();
        if attempts == 0 {
            return Err(SessionError::InvalidAnswer(format!(
                "attempt count for question {question_id} must be at least 1"
            )));
        }

        session.answers.push(AnswerRecord {
            question_id,
            answer_text: answer_text.into(),
            time_to_answer_ms,
            attempt_count: attempts,
            is_correct,
        });
        Ok(())
    }

    /// Mark the start of an attention pause.
    ///
    /// A second start before an end replaces the pending one.
    pub fn record_pause_start(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.pause_started_at = Some(self.clock.now());
    }

    /// Close the pending pause, if any, and record its duration
    pub fn record_pause_end(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(started_at) = self.pause_started_at.take() else {
            return;
        };

        let duration_ms = (self.clock.now() - started_at).num_milliseconds().max(0) as u64;
        session.pause_durations_ms.push(duration_ms);
        session.pause_count = session.pause_count.saturating_add(1);
    }

    /// Seal and return the open session.
    ///
    /// Staged interactions are committed first; an unmatched pause start is dropped.
    pub fn end(&mut self) -> Result<ActivitySession, SessionError> {
        let mut session = self.session.take().ok_or(SessionError::NoActiveSession)?;

        self.buffer.drain_into(&mut session.interactions);
        self.pause_started_at = None;
        session.ended_at = Some(self.clock.now());

        debug!(
            session_id = %session.session_id,
            interactions = session.interactions.len(),
            answers = session.answers.len(),
            pauses = session.pause_count,
            "activity session ended"
        );
        Ok(session)
    }

    /// Compute metrics for a sealed session
    pub fn compute_metrics(&self, session: &ActivitySession) -> ActivityMetrics {
        compute_metrics(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    fn recorder() -> (SessionRecorder<ManualClock>, ManualClock) {
        let clock = ManualClock::new(t0());
        (SessionRecorder::with_clock(clock.clone()), clock)
    }

    #[test]
    fn test_start_then_end_immediately() {
        let (mut recorder, _) = recorder();
        recorder.start().unwrap();
        assert_eq!(recorder.state(), RecorderState::Open);

        let session = recorder.end().unwrap();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(session.is_sealed());
        assert!(session.interactions.is_empty());
        assert!(session.answers.is_empty());

        let metrics = recorder.compute_metrics(&session);
        assert_eq!(metrics.accuracy, None);
        assert_eq!(metrics.average_time_per_question_ms, None);
    }

    #[test]
    fn test_end_twice_fails() {
        let (mut recorder, _) = recorder();
        recorder.start().unwrap();
        recorder.end().unwrap();

        assert_eq!(recorder.end(), Err(SessionError::NoActiveSession));
    }

    #[test]
    fn test_double_start_is_rejected() {
        let (mut recorder, _) = recorder();
        let first_id = recorder.start().unwrap().to_string();
        recorder
            .record_answer("q1", "cat", 1000, 1, true)
            .unwrap();

        assert_eq!(recorder.start(), Err(SessionError::AlreadyOpen));
        assert_eq!(recorder.session_id(), Some(first_id.as_str()));

        let session = recorder.end().unwrap();
        assert_eq!(session.answers.len(), 1);
    }

    #[test]
    fn test_reset_discards_open_session() {
        let (mut recorder, _) = recorder();
        recorder.start().unwrap();
        recorder.record_interaction(InteractionEvent::key(t0(), "a"));

        assert!(recorder.reset());
        assert!(!recorder.reset());
        assert_eq!(recorder.end(), Err(SessionError::NoActiveSession));

        recorder.start().unwrap();
        let session = recorder.end().unwrap();
        assert!(session.interactions.is_empty());
    }

    #[test]
    fn test_interaction_count_independent_of_flush_boundary() {
        for count in [0usize, 1, 9, 10, 11, 20, 37] {
            let (mut recorder, _) = recorder();
            recorder.start().unwrap();
            for i in 0..count {
                recorder.record_interaction(InteractionEvent::pointer(t0(), i as f64, 1.0));
            }
            let session = recorder.end().unwrap();

            assert_eq!(session.interactions.len(), count, "count {count}");
            let xs: Vec<f64> = session
                .interactions
                .iter()
                .map(|e| e.position.unwrap().x)
                .collect();
            let expected: Vec<f64> = (0..count).map(|i| i as f64).collect();
            assert_eq!(xs, expected);
        }
    }

    #[test]
    fn test_interactions_while_idle_are_dropped() {
        let (mut recorder, _) = recorder();
        recorder.record_interaction(InteractionEvent::key(t0(), "x"));

        recorder.start().unwrap();
        recorder.record_interaction(InteractionEvent::key(t0(), "y"));
        let session = recorder.end().unwrap();
        recorder.record_interaction(InteractionEvent::key(t0(), "z"));

        assert_eq!(session.interactions.len(), 1);
        assert_eq!(session.interactions[0].key.as_deref(), Some("y"));
    }

    #[test]
    fn test_answer_requires_open_session() {
        let (mut recorder, _) = recorder();
        assert_eq!(
            recorder.record_answer("q1", "a", 10, 1, true),
            Err(SessionError::NoActiveSession)
        );
    }

    #[test]
    fn test_answer_rejects_zero_attempts() {
        let (mut recorder, _) = recorder();
        recorder.start().unwrap();

        let result = recorder.record_answer("q1", "a", 10, 0, true);
        assert!(matches!(result, Err(SessionError::InvalidAnswer(_))));

        let session = recorder.end().unwrap();
        assert!(session.answers.is_empty());
    }

    #[test]
    fn test_duplicate_question_ids_are_kept() {
        let (mut recorder, _) = recorder();
        recorder.start().unwrap();
        recorder.record_answer("q1", "a", 10, 1, false).unwrap();
        recorder.record_answer("q1", "b", 20, 2, true).unwrap();

        let session = recorder.end().unwrap();
        assert_eq!(session.answers.len(), 2);
    }

    #[test]
    fn test_pause_end_without_start_is_noop() {
        let (mut recorder, clock) = recorder();
        recorder.start().unwrap();
        clock.advance_ms(500);
        recorder.record_pause_end();

        let session = recorder.end().unwrap();
        assert_eq!(session.pause_count, 0);
        assert!(session.pause_durations_ms.is_empty());
    }

    #[test]
    fn test_pause_interval_recorded() {
        let (mut recorder, clock) = recorder();
        recorder.start().unwrap();

        clock.advance_ms(1_000);
        recorder.record_pause_start();
        clock.advance_ms(2_500);
        recorder.record_pause_end();
        recorder.record_pause_end();

        let session = recorder.end().unwrap();
        assert_eq!(session.pause_count, 1);
        assert_eq!(session.pause_durations_ms, vec![2_500]);
    }

    #[test]
    fn test_nested_pause_start_overwrites_pending() {
        let (mut recorder, clock) = recorder();
        recorder.start().unwrap();

        recorder.record_pause_start();
        clock.advance_ms(4_000);
        recorder.record_pause_start();
        clock.advance_ms(1_000);
        recorder.record_pause_end();

        let session = recorder.end().unwrap();
        assert_eq!(session.pause_durations_ms, vec![1_000]);
    }

    #[test]
    fn test_pending_pause_dropped_at_end() {
        let (mut recorder, clock) = recorder();
        recorder.start().unwrap();
        recorder.record_pause_start();
        clock.advance_ms(3_000);

        let session = recorder.end().unwrap();
        assert_eq!(session.pause_count, 0);

        // The stale pause start must not leak into the next session
        recorder.start().unwrap();
        recorder.record_pause_end();
        let next = recorder.end().unwrap();
        assert_eq!(next.pause_count, 0);
    }

    #[test]
    fn test_session_timestamps_follow_clock() {
        let (mut recorder, clock) = recorder();
        recorder.start().unwrap();
        clock.advance_ms(90_000);

        let session = recorder.end().unwrap();
        assert_eq!(session.started_at, t0());
        assert_eq!(
            (session.ended_at.unwrap() - session.started_at).num_milliseconds(),
            90_000
        );
    }

    #[test]
    fn test_sealed_session_is_detached_from_recorder() {
        let (mut recorder, clock) = recorder();
        recorder.start().unwrap();
        recorder.record_answer("q1", "cat", 1000, 1, true).unwrap();
        clock.advance_ms(10_000);
        let mut sealed = recorder.end().unwrap();

        sealed.ended_at = None;
        sealed.answers.clear();

        recorder.start().unwrap();
        let next = recorder.end().unwrap();
        assert!(next.is_sealed());
        assert!(next.answers.is_empty());
        assert_ne!(next.session_id, sealed.session_id);
    }

    #[test]
    fn test_custom_buffer_threshold() {
        let clock = ManualClock::new(t0());
        let mut recorder =
            SessionRecorder::with_clock(clock).with_buffer(InteractionBuffer::with_threshold(3));
        recorder.start().unwrap();
        for _ in 0..7 {
            recorder.record_interaction(InteractionEvent::touch(t0(), 1.0, 2.0));
        }

        let session = recorder.end().unwrap();
        assert_eq!(session.interactions.len(), 7);
    }
}
