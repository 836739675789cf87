//! Opt-in record of what happened on each bar.

use serde::{Deserialize, Serialize};
use backtest_core::{Fill, Order, OrderReason, Signal, TradeRecord};

/// One entry in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// The strategy produced a signal
    Signal { bar_index: usize, signal: Signal },
    /// An order was filled
    Filled { reason: OrderReason, fill: Fill },
    /// The executor refused an order
    Rejected { order: Order, reason: String },
    /// Sizing produced no quantity, so no order was placed
    Skipped { bar_index: usize, reason: String },
    /// A position was reduced, closed or reversed
    TradeClosed { trade: TradeRecord },
}

/// Collects [`AuditEvent`]s when enabled; otherwise drops them.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    enabled: bool,
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record an event. The closure only runs when the log is enabled.
    pub fn record(&mut self, event: impl FnOnce() -> AuditEvent) {
        if self.enabled {
            self.events.push(event());
        }
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<AuditEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_log_drops_events() {
        let mut log = AuditLog::new(false);
        log.record(|| AuditEvent::Signal {
            bar_index: 0,
            signal: Signal::long(0),
        });
        assert!(log.events().is_empty());

        let mut log = AuditLog::new(true);
        log.record(|| AuditEvent::Skipped {
            bar_index: 3,
            reason: "zero size".to_string(),
        });
        assert_eq!(log.into_events().len(), 1);
    }
}
