//! Core identifier and status types.
//!
//! Handles are opaque: the scheduler and strategies observe actors only
//! through [`ActorId`] values and never touch actor state. Ids are assigned
//! in creation order, which is what makes a persisted schedule trace
//! meaningful across runs: the same program constructs the same actors in
//! the same order, so recorded ids resolve to the same actors on replay.

use serde::{Deserialize, Serialize};

/// Opaque handle to an actor, assigned in creation order starting at zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates an id from its creation-order index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u64)
    }

    /// Returns the creation-order index of this actor.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor({})", self.0)
    }
}

/// Opaque handle to a registered monitor, assigned in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonitorId(u64);

impl MonitorId {
    /// Creates an id from its registration-order index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u64)
    }

    /// Returns the registration-order index of this monitor.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for MonitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "monitor({})", self.0)
    }
}

/// Scheduling status of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorStatus {
    /// Has at least one pending inbox event and may be scheduled.
    Runnable,
    /// Inbox is empty; waiting for an event.
    Blocked,
    /// Has halted; never scheduled again.
    Halted,
}

impl ActorStatus {
    /// True if the actor will never run again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Halted)
    }
}

/// Terminal status of one iteration.
///
/// Every iteration ends in exactly one of these. A fresh scheduler is built
/// for each iteration, so terminal states are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationStatus {
    /// All actors halted without a violation.
    Completed,
    /// A safety or liveness violation was detected.
    BugFound,
    /// No actor was runnable but not all had halted.
    Deadlocked,
    /// Cancellation was requested; the partial result is discarded.
    Canceled,
    /// The iteration or run deadline expired mid-execution.
    TimedOut,
}

impl std::fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::BugFound => "bug found",
            Self::Deadlocked => "deadlocked",
            Self::Canceled => "canceled",
            Self::TimedOut => "timed out",
        };
        f.write_str(s)
    }
}
