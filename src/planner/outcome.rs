//! Explicit outcomes for planning steps that may degrade
//!
//! A step either completes, completes with some inputs skipped, completes
//! on a fallback value after a failure, or fails outright. The planner
//! decides what a degraded step means through [`IntrospectionPolicy`]
//! instead of swallowing errors where they happen.

use serde::{Deserialize, Serialize};

use crate::config::IntrospectionPolicy;

use super::errors::{PlanError, PlanResult};

/// Result of one planning step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<T> {
    /// Step completed with everything it needed
    Complete(T),
    /// Step completed but skipped the named inputs
    Partial { value: T, skipped: Vec<String> },
    /// Step failed and produced a fallback value
    Degraded { value: T, cause: PlanError },
    /// Step failed with no usable value
    Failed(PlanError),
}

impl<T> StepOutcome<T> {
    /// The value the step produced, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            StepOutcome::Complete(value)
            | StepOutcome::Partial { value, .. }
            | StepOutcome::Degraded { value, .. } => Some(value),
            StepOutcome::Failed(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, StepOutcome::Complete(_))
    }

    /// Turns the outcome into a value or an error under `policy`,
    /// recording anything short of complete in `notes`.
    ///
    /// Partial results are always accepted. Degraded results are accepted
    /// only under [`IntrospectionPolicy::Degrade`].
    pub fn accept(
        self,
        step: &str,
        policy: IntrospectionPolicy,
        notes: &mut Vec<DegradedStep>,
    ) -> PlanResult<T> {
        match self {
            StepOutcome::Complete(value) => Ok(value),
            StepOutcome::Partial { value, skipped } => {
                notes.push(DegradedStep::new(
                    step,
                    format!("skipped: {}", skipped.join(",")),
                ));
                Ok(value)
            }
            StepOutcome::Degraded { value, cause } => match policy {
                IntrospectionPolicy::Degrade => {
                    notes.push(DegradedStep::new(step, cause.to_string()));
                    Ok(value)
                }
                IntrospectionPolicy::Fail => Err(cause),
            },
            StepOutcome::Failed(err) => Err(err),
        }
    }
}

/// A step that did not complete cleanly, kept on the plan for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedStep {
    pub step: String,
    pub reason: String,
}

impl DegradedStep {
    pub fn new(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DatabaseError, TableRef};

    fn cause() -> PlanError {
        PlanError::key_lookup(
            &TableRef::new("HR", "EMP"),
            &DatabaseError::Introspection("timeout".into()),
        )
    }

    #[test]
    fn test_complete_records_nothing() {
        let mut notes = Vec::new();
        let value = StepOutcome::Complete(7)
            .accept("keys", IntrospectionPolicy::Fail, &mut notes)
            .unwrap();
        assert_eq!(value, 7);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_degraded_accepted_under_degrade_policy() {
        let mut notes = Vec::new();
        let outcome = StepOutcome::Degraded {
            value: "fallback",
            cause: cause(),
        };
        assert_eq!(outcome.value(), Some(&"fallback"));

        let value = outcome
            .accept("keys", IntrospectionPolicy::Degrade, &mut notes)
            .unwrap();
        assert_eq!(value, "fallback");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].step, "keys");
        assert!(notes[0].reason.contains("CHUNKPLAN_SCHEMA_KEY_LOOKUP"));
    }

    #[test]
    fn test_degraded_rejected_under_fail_policy() {
        let mut notes = Vec::new();
        let err = StepOutcome::Degraded {
            value: (),
            cause: cause(),
        }
        .accept("keys", IntrospectionPolicy::Fail, &mut notes)
        .unwrap_err();
        assert_eq!(err.code().code(), "CHUNKPLAN_SCHEMA_KEY_LOOKUP");
        assert!(notes.is_empty());
    }

    #[test]
    fn test_partial_always_accepted() {
        let mut notes = Vec::new();
        let value = StepOutcome::Partial {
            value: 1,
            skipped: vec!["A".into(), "B".into()],
        }
        .accept("projection", IntrospectionPolicy::Fail, &mut notes)
        .unwrap();
        assert_eq!(value, 1);
        assert_eq!(notes[0].reason, "skipped: A,B");
    }

    #[test]
    fn test_failed_has_no_value() {
        let outcome: StepOutcome<u8> = StepOutcome::Failed(cause());
        assert!(outcome.value().is_none());
        assert!(!outcome.is_complete());
    }
}
