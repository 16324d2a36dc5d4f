//! Event source subscription
//!
//! UI layers push raw events into an [`InteractionSink`]; the recorder is the
//! sink. Wiring an event source never touches the recorder's buffering.

use tokio::sync::mpsc;

use crate::session::clock::Clock;
use crate::session::recorder::SessionRecorder;
use crate::session::types::InteractionEvent;

/// Receiver of raw interaction events
pub trait InteractionSink {
    fn on_interaction(&mut self, event: InteractionEvent);
}

impl<C: Clock> InteractionSink for SessionRecorder<C> {
    fn on_interaction(&mut self, event: InteractionEvent) {
        self.record_interaction(event);
    }
}

impl InteractionSink for Vec<InteractionEvent> {
    fn on_interaction(&mut self, event: InteractionEvent) {
        self.push(event);
    }
}

/// Forward every event from a synchronous source, returning the number forwarded
pub fn forward_events<I, S>(source: I, sink: &mut S) -> usize
where
    I: IntoIterator<Item = InteractionEvent>,
    S: InteractionSink + ?Sized,
{
    let mut forwarded = 0;
    for event in source {
        sink.on_interaction(event);
        forwarded += 1;
    }
    forwarded
}

/// Forward events from a channel until every sender is dropped.
///
/// Returns the number of events forwarded.
pub async fn pump_events<S>(mut receiver: mpsc::Receiver<InteractionEvent>, sink: &mut S) -> usize
where
    S: InteractionSink + ?Sized,
{
    let mut forwarded = 0;
    while let Some(event) = receiver.recv().await {
        sink.on_interaction(event);
        forwarded += 1;
    }
    forwarded
}
