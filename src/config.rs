//! Engine configuration.
//!
//! A [`Config`] selects the exploration strategy and its budgets. It is
//! validated once, before any iteration starts; a violated precondition is
//! fatal and produces no partial report.

use crate::error::ConfigError;
use crate::trace::ScheduleTrace;
use std::path::PathBuf;
use std::time::Duration;

/// Which decision-making strategy drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Seeded uniform random exploration.
    Random,
    /// Systematic priority/DFS-based exploration.
    Priority,
    /// Exact replay of a recorded trace.
    Replay,
}

/// Configuration for a testing run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strategy selection.
    pub strategy: StrategyKind,
    /// Base random seed for seed-driven strategies.
    pub seed: u64,
    /// Iteration budget for exploration mode.
    pub max_iterations: u64,
    /// Maximum scheduling decisions per iteration.
    pub max_decisions: u64,
    /// Decisions between priority change points.
    pub priority_change_frequency: u64,
    /// Stop at the first bug (default) or keep exploring to collect more.
    pub stop_on_first_bug: bool,
    /// Wall-clock budget for a single iteration.
    pub iteration_timeout: Option<Duration>,
    /// Wall-clock budget for the whole run.
    pub run_timeout: Option<Duration>,
    /// Trace to replay; takes precedence over `replay_path`.
    pub replay_trace: Option<ScheduleTrace>,
    /// Path to a persisted trace for replay mode.
    pub replay_path: Option<PathBuf>,
    /// Echo captured program output through engine diagnostics.
    pub verbose: bool,
}

impl Config {
    /// Creates a configuration with the given strategy and defaults
    /// suitable for quick exploration.
    #[must_use]
    pub const fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            seed: 0,
            max_iterations: 100,
            max_decisions: 10_000,
            priority_change_frequency: 10,
            stop_on_first_bug: true,
            iteration_timeout: None,
            run_timeout: None,
            replay_trace: None,
            replay_path: None,
            verbose: false,
        }
    }

    /// Sets the base seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub const fn max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the per-iteration decision bound.
    #[must_use]
    pub const fn max_decisions(mut self, n: u64) -> Self {
        self.max_decisions = n;
        self
    }

    /// Sets how many decisions pass between priority change points.
    #[must_use]
    pub const fn priority_change_frequency(mut self, n: u64) -> Self {
        self.priority_change_frequency = n;
        self
    }

    /// Keep exploring after the first bug to collect distinct bugs.
    #[must_use]
    pub const fn keep_exploring(mut self) -> Self {
        self.stop_on_first_bug = false;
        self
    }

    /// Sets the per-iteration wall-clock budget.
    #[must_use]
    pub const fn iteration_timeout(mut self, timeout: Duration) -> Self {
        self.iteration_timeout = Some(timeout);
        self
    }

    /// Sets the whole-run wall-clock budget.
    #[must_use]
    pub const fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// Supplies the trace to replay directly.
    #[must_use]
    pub fn replay_trace(mut self, trace: ScheduleTrace) -> Self {
        self.replay_trace = Some(trace);
        self
    }

    /// Points replay mode at a persisted trace file.
    #[must_use]
    pub fn replay_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.replay_path = Some(path.into());
        self
    }

    /// Enables echoing of captured program output.
    #[must_use]
    pub const fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Checks every precondition the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.max_decisions == 0 {
            return Err(ConfigError::ZeroDecisions);
        }
        if self.strategy == StrategyKind::Priority && self.priority_change_frequency == 0 {
            return Err(ConfigError::ZeroChangeFrequency);
        }
        if self.strategy == StrategyKind::Replay
            && self.replay_trace.is_none()
            && self.replay_path.is_none()
        {
            return Err(ConfigError::MissingReplayTrace);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(StrategyKind::Random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_iterations_rejected() {
        let config = Config::default().max_iterations(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroIterations));
    }

    #[test]
    fn replay_requires_a_trace() {
        let config = Config::new(StrategyKind::Replay);
        assert_eq!(config.validate(), Err(ConfigError::MissingReplayTrace));
        let with_trace = config.replay_trace(ScheduleTrace::new(0));
        assert!(with_trace.validate().is_ok());
    }

    #[test]
    fn priority_needs_change_frequency() {
        let config = Config::new(StrategyKind::Priority).priority_change_frequency(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroChangeFrequency));
    }
}
