//! # Event Log Adapter
//!
//! Records published events in order.

use crate::events::TokenEvent;
use crate::ports::outbound::EventSink;

/// In-memory event sink.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    events: Vec<TokenEvent>,
}

impl InMemoryEventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far.
    #[must_use]
    pub fn events(&self) -> &[TokenEvent] {
        &self.events
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of recorded events named `name`.
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&mut self, event: TokenEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Address;

    #[test]
    fn test_records_in_order_and_drains() {
        let mut log = InMemoryEventLog::new();
        log.publish(TokenEvent::ExchangePoolAdded { pool: Address::from_low_u8(1) });
        log.publish(TokenEvent::ExchangePoolRemoved { pool: Address::from_low_u8(1) });
        log.publish(TokenEvent::ExchangePoolAdded { pool: Address::from_low_u8(2) });

        assert_eq!(log.count_named("ExchangePoolAdded"), 2);
        assert_eq!(log.events()[1].name(), "ExchangePoolRemoved");
        assert_eq!(log.drain().len(), 3);
        assert!(log.events().is_empty());
    }
}
