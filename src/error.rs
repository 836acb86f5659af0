//! Error types and the bug taxonomy.
//!
//! Two families live here and they are deliberately distinct:
//!
//! - [`Bug`] is a *finding*: a property violation in the program under test.
//!   Bugs end the current iteration and are captured with the full schedule
//!   trace; they never crash the engine process.
//! - The error enums ([`SchedulerError`], [`TraceFileError`], [`ConfigError`],
//!   [`EngineError`]) are *engine conditions*: replay divergence, malformed
//!   trace files, invalid configuration. A replay that completes without the
//!   expected violation is a non-reproduction, never conflated with "no bug
//!   found".

use crate::types::ActorId;

/// A property violation found in the program under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bug {
    /// User code panicked while handling an event.
    UncaughtFault {
        /// The actor whose handler panicked.
        actor: ActorId,
        /// The panic message, if one could be extracted.
        message: String,
    },
    /// An explicit assertion made through the actor context failed.
    AssertionFailure {
        /// The actor that failed the assertion.
        actor: ActorId,
        /// The assertion message.
        message: String,
    },
    /// A monitor was still hot when every actor had halted.
    ///
    /// Only reported at quiescence and only when no safety violation
    /// preempted it; the first bug per iteration wins.
    MonitorHot {
        /// Name of the hot monitor.
        monitor: String,
        /// The monitor's explanation of what it was still waiting for.
        reason: String,
    },
    /// No actor was runnable but not all had halted.
    Deadlock {
        /// The actors left blocked, in creation order.
        blocked: Vec<ActorId>,
    },
}

impl Bug {
    /// True for deadlocks, which are reported as a distinct iteration
    /// status rather than `BugFound`.
    #[must_use]
    pub const fn is_deadlock(&self) -> bool {
        matches!(self, Self::Deadlock { .. })
    }
}

impl std::fmt::Display for Bug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UncaughtFault { actor, message } => {
                write!(f, "uncaught fault in {actor}: {message}")
            }
            Self::AssertionFailure { actor, message } => {
                write!(f, "assertion failed in {actor}: {message}")
            }
            Self::MonitorHot { monitor, reason } => {
                write!(f, "monitor '{monitor}' hot at termination: {reason}")
            }
            Self::Deadlock { blocked } => {
                write!(f, "deadlock: {} actor(s) blocked forever (", blocked.len())?;
                for (i, id) in blocked.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A scheduling decision could not be made.
///
/// These surface from the replay strategy when the recorded trace no longer
/// matches the live execution, and from the scheduler when a strategy breaks
/// its contract. Replay conditions fail fast rather than silently diverging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// A recorded decision is not legal at the corresponding live point.
    #[error("replay diverged at decision {position}: {reason}")]
    ReplayDivergence {
        /// Index of the diverging decision in the trace.
        position: usize,
        /// Human-readable description of the mismatch.
        reason: String,
    },
    /// The trace ended but the program asked for another decision.
    #[error("replay trace exhausted after {position} decisions")]
    ReplayExhausted {
        /// Number of decisions the trace contained.
        position: usize,
    },
    /// A strategy returned a value outside the candidate set it was given.
    #[error("strategy returned a decision outside the candidate set: {decision}")]
    InvalidDecision {
        /// Description of the offending decision.
        decision: String,
    },
}

/// A persisted trace could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum TraceFileError {
    /// Underlying I/O failure.
    #[error("trace file I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not a valid serialized trace.
    #[error("malformed trace file: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The file was written by an incompatible schema version.
    #[error("trace schema version mismatch: found {found}, expected {expected}")]
    VersionMismatch {
        /// Version found in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
}

/// A configuration precondition was violated before any iteration started.
///
/// These are fatal: no partial report is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `max_iterations` was zero.
    #[error("max_iterations must be non-zero")]
    ZeroIterations,
    /// `max_decisions` was zero.
    #[error("max_decisions must be non-zero")]
    ZeroDecisions,
    /// The priority strategy's change frequency was zero.
    #[error("priority_change_frequency must be non-zero")]
    ZeroChangeFrequency,
    /// Replay mode was selected without a trace to replay.
    #[error("replay mode requires a trace (set replay_trace or replay_path)")]
    MissingReplayTrace,
}

/// A fatal engine-level failure, surfaced before or instead of a report.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The replay trace file could not be loaded.
    #[error("failed to load replay trace: {0}")]
    TraceFile(#[from] TraceFileError),
    /// A strategy broke its contract during exploration.
    ///
    /// Replay divergence is not routed here; in replay mode a
    /// [`SchedulerError`] is classified as a non-reproduction instead.
    #[error("strategy contract violation: {0}")]
    Strategy(#[from] SchedulerError),
}
