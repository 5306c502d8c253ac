// Trigger events - the boundary between the sequencer and the synthesizer

use super::instrument::Instrument;
use crate::messaging::channels::TriggerProducer;
use std::sync::{Arc, Mutex};

/// Request to sound one instrument at an absolute clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    pub instrument: Instrument,
    /// Absolute time in seconds (Clock domain)
    pub when: f64,
    pub accented: bool,
}

impl TriggerEvent {
    pub fn new(instrument: Instrument, when: f64, accented: bool) -> Self {
        Self {
            instrument,
            when,
            accented,
        }
    }
}

/// Fire-and-forget receiver of trigger events
///
/// Implementations must not block: the scheduler calls this from its
/// timing loop and the UI calls it for previews.
pub trait TriggerSink: Send {
    fn trigger(&mut self, event: TriggerEvent);
}

impl TriggerSink for TriggerProducer {
    fn trigger(&mut self, event: TriggerEvent) {
        if ringbuf::traits::Producer::try_push(self, event).is_err() {
            log::warn!(
                "Trigger queue full, dropping {} at {:.3}s",
                event.instrument.id(),
                event.when
            );
        }
    }
}

impl<S: TriggerSink + ?Sized> TriggerSink for Box<S> {
    fn trigger(&mut self, event: TriggerEvent) {
        (**self).trigger(event);
    }
}

/// Sink that records every event, shared between clones
///
/// Used for offline inspection of what the sequencer emits.
#[derive(Clone, Default)]
pub struct TriggerLog {
    events: Arc<Mutex<Vec<TriggerEvent>>>,
}

impl TriggerLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<TriggerEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<TriggerEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TriggerSink for TriggerLog {
    fn trigger(&mut self, event: TriggerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
