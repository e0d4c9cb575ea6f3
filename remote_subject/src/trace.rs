//! Structured subject event trace
//!
//! In-memory, deterministic record of what the subject sent, delivered and
//! tore down. Tests assert on the trace to verify routing and disconnect
//! properties without reaching into the registries.

use realm_types::FnId;

/// One recorded subject event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectEvent {
    /// An envelope left through the transport
    Sent { action: String },
    /// An inbound envelope was routed
    Delivered { action: String },
    /// The subject was marked disconnected
    Disconnected { reason: String },
    /// A cleanup notification was transmitted for a ticket
    CleanupRequested { fn_id: FnId },
    /// A stored out-of-scope cleanup ran for a ticket
    CleanupApplied { fn_id: FnId },
    /// A call arrived for a function with no registered receiver
    UnknownFunction { fn_id: FnId },
}

/// Chronological record of subject events
#[derive(Debug, Default)]
pub struct SubjectTrace {
    events: Vec<SubjectEvent>,
}

impl SubjectTrace {
    /// Creates an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event
    pub fn record(&mut self, event: SubjectEvent) {
        self.events.push(event);
    }

    /// Returns all recorded events in order
    pub fn events(&self) -> &[SubjectEvent] {
        &self.events
    }

    /// Counts events matching a predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&SubjectEvent) -> bool,
    {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_records_in_order() {
        let mut trace = SubjectTrace::new();
        trace.record(SubjectEvent::Sent {
            action: "realmlink.call".to_string(),
        });
        trace.record(SubjectEvent::Disconnected {
            reason: "closed".to_string(),
        });

        assert_eq!(trace.events().len(), 2);
        assert_eq!(
            trace.count(|e| matches!(e, SubjectEvent::Sent { .. })),
            1
        );
    }
}
