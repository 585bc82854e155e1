//! Append-only log of engine events.
//!
//! The engine appends one [`EngineEvent`] per successful batch or recovery.
//! External observers drain it; the engine never reads it back.

use batchsend_types::EngineEvent;

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<EngineEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: EngineEvent) {
        tracing::trace!(event = %event, "Event emitted");
        self.events.push(event);
    }

    /// Events not yet drained, oldest first.
    #[must_use]
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    #[must_use]
    pub fn last(&self) -> Option<&EngineEvent> {
        self.events.last()
    }

    /// Take every pending event, leaving the log empty.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchsend_types::Address;

    #[test]
    fn emit_and_drain() {
        let mut log = EventLog::new();
        assert!(log.is_empty());
        log.emit(EngineEvent::StrandedValueRecovered {
            owner: Address::repeat_byte(1),
            amount: 5,
        });
        log.emit(EngineEvent::BatchEthSent {
            initiator: Address::repeat_byte(2),
            total_amount: 9,
            recipient_count: 2,
        });
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(EngineEvent::name), Some("BatchEthSent"));

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].name(), "StrandedValueRecovered");
        assert!(log.is_empty());
    }
}
