//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` or `{name}_FAILED` when closed
//! - Logs `{name}_INCOMPLETE` on drop if never closed

use std::cell::Cell;
use std::time::Instant;

use super::logger::Logger;

/// A scope that automatically logs begin and complete events.
///
/// Fields given at creation (typically `plan_id` and `table`) are repeated
/// on every line the scope writes.
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
    start: Instant,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope with fields
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let scope = Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
            start: Instant::now(),
        };
        Logger::info(&scope.event("BEGIN"), fields);
        scope
    }

    fn event(&self, suffix: &str) -> String {
        format!("{}_{}", self.name, suffix)
    }

    fn closing_fields<'b>(&'b self, elapsed: &'b str, extra: &[(&'b str, &'b str)]) -> Vec<(&'b str, &'b str)> {
        let mut all: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        all.push(("elapsed_ms", elapsed));
        all.extend(extra.iter().copied());
        all
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let event = self.event("COMPLETE");
        let elapsed = self.start.elapsed().as_millis().to_string();
        Logger::info(&event, &self.closing_fields(&elapsed, extra_fields));
    }

    /// Mark the scope as failed with a reason
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        let event = self.event("FAILED");
        let elapsed = self.start.elapsed().as_millis().to_string();
        Logger::error(&event, &self.closing_fields(&elapsed, &[("reason", reason)]));
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            let event = self.event("INCOMPLETE");
            Logger::warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}
