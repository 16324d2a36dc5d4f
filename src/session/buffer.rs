//! Interaction staging buffer
//!
//! Raw events are staged here and committed to the session log in batches.

use crate::session::types::InteractionEvent;

/// Number of staged events that triggers a commit
pub const DEFAULT_FLUSH_THRESHOLD: usize = 10;

/// Fixed-capacity staging queue for interaction events
#[derive(Debug, Clone)]
pub struct InteractionBuffer {
    events: Vec<InteractionEvent>,
    threshold: usize,
}

impl Default for InteractionBuffer {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_FLUSH_THRESHOLD)
    }
}

impl InteractionBuffer {
    /// Create a buffer that commits every `threshold` events (minimum 1)
    pub fn with_threshold(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            events: Vec::with_capacity(threshold),
            threshold,
        }
    }

    /// Stage an event, moving the whole batch into `log` once the threshold is reached.
    ///
    /// Returns true when a commit happened.
    pub fn push(&mut self, event: InteractionEvent, log: &mut Vec<InteractionEvent>) -> bool {
        self.events.push(event);
        if self.events.len() >= self.threshold {
            log.append(&mut self.events);
            return true;
        }
        false
    }

    /// Commit any staged remainder into `log`, returning how many events moved
    pub fn drain_into(&mut self, log: &mut Vec<InteractionEvent>) -> usize {
        let moved = self.events.len();
        log.append(&mut self.events);
        moved
    }

    /// Drop staged events without committing them
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(i: u32) -> InteractionEvent {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        InteractionEvent::pointer(ts, i as f64, 0.0)
    }

    #[test]
    fn test_commits_at_threshold() {
        let mut buffer = InteractionBuffer::default();
        let mut log = Vec::new();

        for i in 0..9 {
            assert!(!buffer.push(event(i), &mut log));
        }
        assert!(log.is_empty());
        assert_eq!(buffer.len(), 9);

        assert!(buffer.push(event(9), &mut log));
        assert_eq!(log.len(), 10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_moves_remainder_in_order() {
        let mut buffer = InteractionBuffer::with_threshold(4);
        let mut log = Vec::new();

        for i in 0..6 {
            buffer.push(event(i), &mut log);
        }
        assert_eq!(log.len(), 4);

        assert_eq!(buffer.drain_into(&mut log), 2);
        assert_eq!(buffer.drain_into(&mut log), 0);

        let xs: Vec<f64> = log.iter().map(|e| e.position.unwrap().x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_zero_threshold_is_raised_to_one() {
        let mut buffer = InteractionBuffer::with_threshold(0);
        let mut log = Vec::new();

        assert_eq!(buffer.threshold(), 1);
        assert!(buffer.push(event(0), &mut log));
        assert_eq!(log.len(), 1);
    }
}
