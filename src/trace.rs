//! Schedule traces: the unit of reproducibility.
//!
//! A trace is an ordered, append-only log of every decision the scheduler
//! made during one iteration: which actor ran at each yield point and which
//! value each nondeterministic choice took. Replaying a trace against a
//! fresh, identically-initialized runtime executing identical user code
//! reproduces identical observable behavior, which is why *every* decision
//! point is recorded, not just actor choices.
//!
//! # Persistence
//!
//! Traces serialize to a stable textual (JSON) form with a schema version
//! and the originating seed, so a failing schedule can be saved to disk and
//! replayed in a later process. `deserialize(serialize(t)) == t`
//! decision-for-decision.

use crate::error::TraceFileError;
use crate::types::ActorId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current schema version for persisted traces.
///
/// Increment on breaking changes to the decision encoding.
pub const TRACE_SCHEMA_VERSION: u32 = 1;

/// One recorded scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Decision {
    /// The named actor was scheduled to take its next step.
    ScheduleNext(ActorId),
    /// A nondeterministic choice resolved to this value.
    Choice(u64),
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScheduleNext(id) => write!(f, "schedule {id}"),
            Self::Choice(v) => write!(f, "choice {v}"),
        }
    }
}

/// An ordered, append-only sequence of scheduling decisions.
///
/// Entries are never mutated once written; the only write operation is
/// [`push`](Self::push). This is what makes replay deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTrace {
    version: u32,
    /// Seed the recording strategy ran with.
    ///
    /// For random exploration this allows a schedule to be re-derived by
    /// re-seeding rather than by literal decision replay. Zero when the
    /// recording strategy was not seed-driven.
    pub seed: u64,
    decisions: Vec<Decision>,
}

impl ScheduleTrace {
    /// Creates an empty trace recorded under the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            version: TRACE_SCHEMA_VERSION,
            seed,
            decisions: Vec::new(),
        }
    }

    /// Appends a decision. Existing entries are never touched.
    pub fn push(&mut self, decision: Decision) {
        self.decisions.push(decision);
    }

    /// Number of recorded decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// True if no decisions have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// Returns the decision at `index`, if recorded.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Decision> {
        self.decisions.get(index).copied()
    }

    /// Iterates decisions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }

    /// Returns all decisions in insertion order.
    #[must_use]
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Serializes to the stable textual form.
    #[must_use]
    pub fn to_json(&self) -> String {
        // Serialization of this shape cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Parses a trace from its textual form, checking the schema version.
    pub fn from_json(text: &str) -> Result<Self, TraceFileError> {
        let trace: Self = serde_json::from_str(text)?;
        if trace.version != TRACE_SCHEMA_VERSION {
            return Err(TraceFileError::VersionMismatch {
                found: trace.version,
                expected: TRACE_SCHEMA_VERSION,
            });
        }
        Ok(trace)
    }

    /// Writes the trace to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TraceFileError> {
        std::fs::write(path, self.to_json())?;
        Ok(())
    }

    /// Loads a trace from a file written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceFileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl<'a> IntoIterator for &'a ScheduleTrace {
    type Item = &'a Decision;
    type IntoIter = std::slice::Iter<'a, Decision>;

    fn into_iter(self) -> Self::IntoIter {
        self.decisions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trace() -> ScheduleTrace {
        let mut trace = ScheduleTrace::new(42);
        trace.push(Decision::ScheduleNext(ActorId::from_index(0)));
        trace.push(Decision::Choice(1));
        trace.push(Decision::ScheduleNext(ActorId::from_index(1)));
        trace
    }

    #[test]
    fn append_preserves_order() {
        let trace = sample_trace();
        assert_eq!(trace.len(), 3);
        assert_eq!(
            trace.get(0),
            Some(Decision::ScheduleNext(ActorId::from_index(0)))
        );
        assert_eq!(trace.get(1), Some(Decision::Choice(1)));
        assert_eq!(trace.get(3), None);
    }

    #[test]
    fn json_round_trip_is_identity() {
        let trace = sample_trace();
        let restored = ScheduleTrace::from_json(&trace.to_json()).expect("parse");
        assert_eq!(restored, trace);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let mut trace = sample_trace();
        trace.version = TRACE_SCHEMA_VERSION + 1;
        let err = ScheduleTrace::from_json(&trace.to_json()).unwrap_err();
        assert!(matches!(
            err,
            TraceFileError::VersionMismatch { found, expected }
                if found == TRACE_SCHEMA_VERSION + 1 && expected == TRACE_SCHEMA_VERSION
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = ScheduleTrace::from_json("not json").unwrap_err();
        assert!(matches!(err, TraceFileError::Malformed(_)));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bug.trace.json");
        let trace = sample_trace();
        trace.save(&path).expect("save");
        let loaded = ScheduleTrace::load(&path).expect("load");
        assert_eq!(loaded, trace);
    }
}
