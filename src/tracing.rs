//! Event tracing for debugging stackwm.
//!
//! Keeps a ring buffer of recent protocol events and state transitions.
//! The tail of the buffer is written to the debug log on shutdown.

use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

use crate::state::StateTransition;

/// Maximum number of events to keep in the trace buffer
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// A single traced event
#[derive(Debug, Clone, Serialize)]
pub struct EventLogEntry {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<u32>,
    pub details: String,
}

/// Event tracer with ring buffer storage
pub struct EventTracer {
    entries: VecDeque<EventLogEntry>,
    max_entries: usize,
    sequence: u64,
    start_time: Instant,
}

impl EventTracer {
    /// Create a new event tracer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a new event tracer with specified capacity
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            sequence: 0,
            start_time: Instant::now(),
        }
    }

    fn timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Trace a protocol event
    pub fn trace_event(&mut self, event_type: &str, window: Option<u32>, details: &str) {
        self.add_entry(event_type.to_string(), window, details.to_string());
    }

    /// Trace a state transition
    pub fn trace_transition(&mut self, transition: &StateTransition) {
        let (event_type, window, details) = match transition {
            StateTransition::ClientManaged { window, frame } => {
                ("client_managed", Some(*window), format!("frame=0x{:x}", frame))
            }
            StateTransition::ClientUnmanaged { window, reason } => {
                let reason_str = serde_json::to_string(reason).unwrap_or_else(|_| "unknown".to_string());
                ("client_unmanaged", Some(*window), reason_str)
            }
            StateTransition::FocusChanged { from, to } => {
                ("focus_changed", *to, format!("from={:?}", from))
            }
            StateTransition::MastersChanged { from, to } => {
                ("masters_changed", None, format!("{}->{}", from, to))
            }
            StateTransition::CloseRequested { window, polite } => {
                ("close_requested", Some(*window), format!("polite={}", polite))
            }
        };
        self.add_entry(event_type.to_string(), window, details);
    }

    fn add_entry(&mut self, event_type: String, window: Option<u32>, details: String) {
        if self.max_entries == 0 {
            return;
        }
        // Remove oldest entry if at capacity
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }

        self.sequence += 1;
        self.entries.push_back(EventLogEntry {
            sequence: self.sequence,
            timestamp_ms: self.timestamp(),
            event_type,
            window,
            details,
        });
    }

    /// Get the last N entries
    pub fn get_last(&self, n: usize) -> Vec<EventLogEntry> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(start).cloned().collect()
    }

    /// The last N entries as a JSON array
    pub fn dump_json(&self, n: usize) -> String {
        serde_json::to_string(&self.get_last(n)).unwrap_or_else(|e| format!("<unserializable: {}>", e))
    }
}

impl Default for EventTracer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_event() {
        let mut tracer = EventTracer::new();
        tracer.trace_event("MapRequest", Some(12345), "");

        let entries = tracer.get_last(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "MapRequest");
        assert_eq!(entries[0].window, Some(12345));
    }

    #[test]
    fn test_ring_buffer_overflow() {
        let mut tracer = EventTracer::with_capacity(3);

        tracer.trace_event("event1", None, "");
        tracer.trace_event("event2", None, "");
        tracer.trace_event("event3", None, "");
        tracer.trace_event("event4", None, "");

        let entries = tracer.get_last(10);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].event_type, "event2");
        assert_eq!(entries[2].event_type, "event4");
        assert_eq!(entries[2].sequence, 4);
    }

    #[test]
    fn test_get_last() {
        let mut tracer = EventTracer::new();

        for i in 0..10 {
            tracer.trace_event(&format!("event{}", i), None, "");
        }

        let last_3 = tracer.get_last(3);
        assert_eq!(last_3.len(), 3);
        assert_eq!(last_3[0].event_type, "event7");
        assert_eq!(last_3[2].event_type, "event9");
    }

    #[test]
    fn test_transition_entries() {
        let mut tracer = EventTracer::new();
        tracer.trace_transition(&StateTransition::MastersChanged { from: 1, to: 2 });
        tracer.trace_transition(&StateTransition::CloseRequested {
            window: 7,
            polite: true,
        });

        let entries = tracer.get_last(2);
        assert_eq!(entries[0].event_type, "masters_changed");
        assert_eq!(entries[0].details, "1->2");
        assert_eq!(entries[1].window, Some(7));
    }

    #[test]
    fn test_dump_json() {
        let mut tracer = EventTracer::new();
        tracer.trace_event("KeyPress", None, "keysym=0x78");

        let json = tracer.dump_json(5);
        assert!(json.starts_with('['));
        assert!(json.contains("KeyPress"));
        assert!(!json.contains("\"window\""));
    }
}
