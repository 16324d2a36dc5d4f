//! Session replay
//!
//! Drives a [`SessionRecorder`] from a newline-delimited JSON script of
//! timestamped recorder commands. Each line carries the instant at which the
//! command happened, so replays are deterministic regardless of wall time.
//!
//! ```text
//! {"at":"2024-01-15T14:00:00Z","op":"start"}
//! {"at":"2024-01-15T14:00:01Z","op":"interaction","kind":"pointer","position":{"x":10,"y":20}}
//! {"at":"2024-01-15T14:00:05Z","op":"answer","question_id":"q1","answer_text":"cat","time_to_answer_ms":4000,"attempts":1,"is_correct":true}
//! {"at":"2024-01-15T14:00:06Z","op":"pause_start"}
//! {"at":"2024-01-15T14:00:09Z","op":"pause_end"}
//! {"at":"2024-01-15T14:00:10Z","op":"end"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReplayError;
use crate::session::clock::ManualClock;
use crate::session::recorder::SessionRecorder;
use crate::session::types::{ActivitySession, InteractionEvent, InteractionKind, Position};

/// One line of a replay script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayStep {
    /// When the command happened
    pub at: DateTime<Utc>,
    /// Command to apply
    #[serde(flatten)]
    pub command: ReplayCommand,
}

/// Recorder command carried by a replay step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayCommand {
    Start,
    Interaction {
        kind: InteractionKind,
        #[serde(default)]
        position: Option<Position>,
        #[serde(default)]
        key: Option<String>,
    },
    Answer {
        question_id: String,
        answer_text: String,
        time_to_answer_ms: u64,
        attempts: u32,
        is_correct: bool,
    },
    PauseStart,
    PauseEnd,
    End,
}

/// Parse an NDJSON replay script, skipping blank lines
pub fn parse_script(ndjson: &str) -> Result<Vec<(usize, ReplayStep)>, ReplayError> {
    let mut steps = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let step = serde_json::from_str::<ReplayStep>(trimmed).map_err(|e| ReplayError::Parse {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        steps.push((line_num + 1, step));
    }
    Ok(steps)
}

/// Replay a script and return every session it sealed, in order.
///
/// A script that leaves a session open fails with `Unterminated`.
pub fn replay(ndjson: &str) -> Result<Vec<ActivitySession>, ReplayError> {
    let steps = parse_script(ndjson)?;
    let Some((_, first)) = steps.first() else {
        return Ok(Vec::new());
    };

    let clock = ManualClock::new(first.at);
    let mut recorder = SessionRecorder::with_clock(clock.clone());
    let mut sealed = Vec::new();

    for (line, step) in steps {
        clock.set(step.at);
        let session_err = |source| ReplayError::Session { line, source };

        match step.command {
            ReplayCommand::Start => {
                recorder.start().map_err(session_err)?;
            }
            ReplayCommand::Interaction {
                kind,
                position,
                key,
            } => recorder.record_interaction(InteractionEvent {
                kind,
                timestamp: step.at,
                position,
                key,
            }),
            ReplayCommand::Answer {
                question_id,
                answer_text,
                time_to_answer_ms,
                attempts,
                is_correct,
            } => recorder
                .record_answer(
                    question_id,
                    answer_text,
                    time_to_answer_ms,
                    attempts,
                    is_correct,
                )
                .map_err(session_err)?,
            ReplayCommand::PauseStart => recorder.record_pause_start(),
            ReplayCommand::PauseEnd => recorder.record_pause_end(),
            ReplayCommand::End => sealed.push(recorder.end().map_err(session_err)?),
        }
    }

    if recorder.is_open() {
        return Err(ReplayError::Unterminated);
    }
    Ok(sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::session::metrics::compute_metrics;

    const SCRIPT: &str = r#"
{"at":"2024-01-15T14:00:00Z","op":"start"}
{"at":"2024-01-15T14:00:01Z","op":"interaction","kind":"pointer","position":{"x":10,"y":20}}
{"at":"2024-01-15T14:00:02Z","op":"interaction","kind":"key","key":"c"}
{"at":"2024-01-15T14:00:05Z","op":"answer","question_id":"q1","answer_text":"cat","time_to_answer_ms":4000,"attempts":1,"is_correct":true}
{"at":"2024-01-15T14:00:06Z","op":"pause_start"}
{"at":"2024-01-15T14:00:12Z","op":"pause_end"}
{"at":"2024-01-15T14:00:20Z","op":"answer","question_id":"q2","answer_text":"dgo","time_to_answer_ms":8000,"attempts":2,"is_correct":false}
{"at":"2024-01-15T14:01:00Z","op":"end"}
"#;

    #[test]
    fn test_replay_produces_sealed_session() {
        let sessions = replay(SCRIPT).unwrap();
        assert_eq!(sessions.len(), 1);

        let session = &sessions[0];
        assert_eq!(session.interactions.len(), 2);
        assert_eq!(session.answers.len(), 2);
        assert_eq!(session.pause_durations_ms, vec![6_000]);

        let metrics = compute_metrics(session);
        assert_eq!(metrics.total_duration_ms, 60_000);
        assert_eq!(metrics.active_duration_ms, 54_000);
        assert_eq!(metrics.accuracy, Some(0.5));
        assert_eq!(metrics.total_attempts, 3);
        assert_eq!(metrics.attention.pause_frequency, Some(1.0));
    }

    #[test]
    fn test_replay_reports_line_of_lifecycle_error() {
        let script = r#"{"at":"2024-01-15T14:00:00Z","op":"start"}
{"at":"2024-01-15T14:00:01Z","op":"end"}
{"at":"2024-01-15T14:00:02Z","op":"end"}"#;

        match replay(script) {
            Err(ReplayError::Session { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, SessionError::NoActiveSession);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_replay_rejects_unknown_op() {
        let script = r#"{"at":"2024-01-15T14:00:00Z","op":"teleport"}"#;
        assert!(matches!(
            replay(script),
            Err(ReplayError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_replay_requires_session_to_end() {
        let script = r#"{"at":"2024-01-15T14:00:00Z","op":"start"}"#;
        assert!(matches!(replay(script), Err(ReplayError::Unterminated)));
    }

    #[test]
    fn test_empty_script() {
        assert!(replay("\n\n").unwrap().is_empty());
    }
}
