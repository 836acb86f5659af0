//! Test reports: the mergeable aggregate of a run.
//!
//! A report accumulates iteration and bug counts, elapsed time, the
//! reproducibility artifacts for every bug found (the full schedule trace
//! plus captured output), and a coverage summary. Reports from parallel or
//! sharded sub-runs combine with [`TestReport::merge`], which is
//! associative and commutative over all aggregate counts.

use crate::error::Bug;
use crate::runtime::IterationOutcome;
use crate::trace::ScheduleTrace;
use crate::types::IterationStatus;
use std::collections::BTreeSet;
use std::time::Duration;

/// Overall classification of a run.
///
/// Ordered by severity so that merging reports can keep the strongest
/// verdict: a bug found anywhere dominates a non-reproduction, which
/// dominates a clean run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RunVerdict {
    /// No bug found within the budget.
    #[default]
    NoBugFound,
    /// Replay mode did not reproduce the expected violation, or the
    /// replayed trace diverged from the live execution.
    NonReproduction,
    /// At least one bug was found (or reproduced, in replay mode).
    BugFound,
}

impl std::fmt::Display for RunVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoBugFound => "no bug found",
            Self::NonReproduction => "non-reproduction",
            Self::BugFound => "bug found",
        };
        f.write_str(s)
    }
}

/// One found bug together with everything needed to reproduce it.
#[derive(Debug, Clone)]
pub struct BugReport {
    /// Human-readable description.
    pub description: String,
    /// The schedule trace that triggers the bug under replay.
    pub trace: ScheduleTrace,
    /// Program output captured during the failing iteration.
    pub output: String,
}

impl BugReport {
    /// Builds a report from a finished iteration's bug and artifacts.
    #[must_use]
    pub fn new(bug: &Bug, trace: ScheduleTrace, output: String) -> Self {
        Self {
            description: bug.to_string(),
            trace,
            output,
        }
    }
}

/// Coverage aggregated across iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageInfo {
    /// Total scheduling decisions across all iterations.
    pub total_decisions: u64,
    /// Longest single-iteration decision sequence observed.
    pub max_depth: u64,
    /// Iterations that stopped at the decision depth bound.
    pub depth_capped_iterations: u64,
    /// Every event kind observed across all iterations.
    pub event_kinds: BTreeSet<String>,
}

impl CoverageInfo {
    /// Folds one iteration's coverage in.
    pub fn record(&mut self, outcome: &IterationOutcome) {
        let depth = outcome.trace.len() as u64;
        self.total_decisions += depth;
        self.max_depth = self.max_depth.max(depth);
        if outcome.depth_capped {
            self.depth_capped_iterations += 1;
        }
        self.event_kinds.extend(outcome.event_kinds.iter().cloned());
    }

    /// Merges another coverage aggregate. Associative and commutative.
    pub fn merge(&mut self, other: &Self) {
        self.total_decisions += other.total_decisions;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.depth_capped_iterations += other.depth_capped_iterations;
        self.event_kinds.extend(other.event_kinds.iter().cloned());
    }
}

/// Aggregated results of a testing run.
///
/// Mutated after every iteration while the engine runs; read-only once the
/// engine returns it.
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    /// Iterations whose results were merged (canceled iterations are
    /// discarded, not counted).
    pub iterations: u64,
    /// Number of bugs found.
    pub bugs_found: u64,
    /// Iterations that hit their wall-clock deadline.
    pub timed_out_iterations: u64,
    /// Overall classification.
    pub verdict: RunVerdict,
    /// True when the priority strategy enumerated every schedule within
    /// its bound before the iteration budget ran out.
    pub strategy_exhausted: bool,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// One entry per found bug, with its reproducing trace.
    pub bugs: Vec<BugReport>,
    /// Coverage summary.
    pub coverage: CoverageInfo,
}

impl TestReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one finished iteration into the aggregate.
    ///
    /// Canceled iterations must not be passed here; their partial results
    /// are discarded by the engine.
    pub fn record_iteration(&mut self, outcome: &IterationOutcome) {
        debug_assert_ne!(outcome.status, IterationStatus::Canceled);
        self.iterations += 1;
        self.coverage.record(outcome);
        if outcome.status == IterationStatus::TimedOut {
            self.timed_out_iterations += 1;
        }
        if let Some(bug) = &outcome.bug {
            self.bugs_found += 1;
            self.verdict = self.verdict.max(RunVerdict::BugFound);
            self.bugs.push(BugReport::new(
                bug,
                outcome.trace.clone(),
                outcome.output.clone(),
            ));
        }
    }

    /// Merges another report, as when combining parallel sub-runs.
    /// Associative and commutative with respect to all counts.
    pub fn merge(&mut self, other: &Self) {
        self.iterations += other.iterations;
        self.bugs_found += other.bugs_found;
        self.timed_out_iterations += other.timed_out_iterations;
        self.verdict = self.verdict.max(other.verdict);
        self.strategy_exhausted |= other.strategy_exhausted;
        self.elapsed += other.elapsed;
        self.bugs.extend(other.bugs.iter().cloned());
        self.coverage.merge(&other.coverage);
    }
}

impl std::fmt::Display for TestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "... Explored {} iteration{}.",
            self.iterations,
            if self.iterations == 1 { "" } else { "s" }
        )?;
        writeln!(
            f,
            "... Found {} bug{}.",
            self.bugs_found,
            if self.bugs_found == 1 { "" } else { "s" }
        )?;
        if self.strategy_exhausted {
            writeln!(f, "... Search space exhausted within the configured bound.")?;
        }
        for bug in &self.bugs {
            writeln!(f, "... Bug: {}", bug.description)?;
        }
        write!(f, "... Elapsed {:.2} sec.", self.elapsed.as_secs_f64())
    }
}
