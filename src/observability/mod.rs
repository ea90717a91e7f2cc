//! Observability for the planner
//!
//! - Structured JSON logging on stderr
//! - Typed planning events
//! - Scope-based begin/complete logging
//!
//! ```ignore
//! use chunkplan::observability::{Event, Logger, ObservationScope};
//!
//! Logger::info(Event::RowCount.as_str(), &[("rows", "250")]);
//!
//! let scope = ObservationScope::with_fields("PLAN", &[("table", "HR.EMP")]);
//! // ... plan ...
//! scope.complete_with_fields(&[("chunks", "3")]);
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a planning event with fields at the event's severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use logger::capture_log;

    #[test]
    fn test_event_lines() {
        let line = capture_log(
            Event::KeyDegraded.severity(),
            Event::KeyDegraded.as_str(),
            &[("reason", "timeout")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "KEY_DEGRADED");
        assert_eq!(parsed["severity"], "WARN");
        assert_eq!(parsed["reason"], "timeout");

        let line = capture_log(Event::RowCount.severity(), Event::RowCount.as_str(), &[("rows", "250")]);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["rows"], "250");
    }
}
