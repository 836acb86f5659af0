//! The testing engine: iteration loop, replay mode, report assembly.
//!
//! The engine owns a validated [`Config`] and a program setup closure, and
//! drives the exploration session: one strategy for the whole session, a
//! fresh [`Runtime`] per iteration, outcomes folded into a [`TestReport`].
//! Replay mode runs exactly one iteration against a recorded trace and
//! classifies any divergence as a non-reproduction instead of a crash.
//!
//! Cancellation is cooperative: callers clone the engine's [`CancelToken`]
//! and trigger it from another thread; the in-flight iteration stops at its
//! next yield point and its partial results are discarded.

use crate::config::{Config, StrategyKind};
use crate::error::EngineError;
use crate::report::{RunVerdict, TestReport};
use crate::runtime::{CancelToken, RunControl, Runtime};
use crate::strategy::{PriorityStrategy, RandomStrategy, ReplayStrategy, Strategy};
use crate::trace::ScheduleTrace;
use crate::types::IterationStatus;
use std::time::Instant;

/// Systematic testing engine over a reconstructible actor program.
///
/// The setup closure is invoked once per iteration against a fresh runtime;
/// it must create the same actors and initial events every time, since
/// reproducibility depends on the program being identical across
/// iterations.
pub struct TestingEngine<F>
where
    F: Fn(&mut Runtime) + Send + Sync,
{
    config: Config,
    setup: F,
    cancel: CancelToken,
}

impl<F> TestingEngine<F>
where
    F: Fn(&mut Runtime) + Send + Sync,
{
    /// Creates an engine for the given configuration and program.
    pub fn new(config: Config, setup: F) -> Self {
        Self {
            config,
            setup,
            cancel: CancelToken::new(),
        }
    }

    /// Token for canceling the run from another thread.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the session to completion and returns the aggregated report.
    ///
    /// Configuration errors are fatal and produce no partial report. Bugs
    /// found in the program under test are not errors; they are findings in
    /// the report.
    pub fn run(&self) -> Result<TestReport, EngineError> {
        self.config.validate()?;
        let started = Instant::now();

        let report = match self.config.strategy {
            StrategyKind::Random => {
                let mut strategy = RandomStrategy::new(self.config.seed);
                self.explore(&mut strategy, started)?
            }
            StrategyKind::Priority => {
                let mut strategy =
                    PriorityStrategy::new(self.config.priority_change_frequency);
                self.explore(&mut strategy, started)?
            }
            StrategyKind::Replay => {
                let trace = self.load_replay_trace()?;
                self.replay(trace, started)
            }
        };

        tracing::info!(
            iterations = report.iterations,
            bugs = report.bugs_found,
            verdict = %report.verdict,
            "run finished"
        );
        Ok(report)
    }

    fn load_replay_trace(&self) -> Result<ScheduleTrace, EngineError> {
        if let Some(trace) = &self.config.replay_trace {
            return Ok(trace.clone());
        }
        // validate() guarantees one of the two sources is present.
        let path = self
            .config
            .replay_path
            .as_deref()
            .ok_or(crate::error::ConfigError::MissingReplayTrace)?;
        Ok(ScheduleTrace::load(path)?)
    }

    fn run_control(&self, started: Instant) -> RunControl {
        RunControl {
            cancel: self.cancel.clone(),
            iteration_deadline: self
                .config
                .iteration_timeout
                .map(|t| Instant::now() + t),
            run_deadline: self.config.run_timeout.map(|t| started + t),
        }
    }

    fn run_iteration(&self, strategy: &mut dyn Strategy, started: Instant) -> crate::runtime::IterationOutcome {
        let mut runtime = Runtime::new(self.config.max_decisions);
        (self.setup)(&mut runtime);
        let outcome = runtime.run(strategy, &self.run_control(started));
        if self.config.verbose && !outcome.output.is_empty() {
            for line in outcome.output.lines() {
                tracing::info!(program = line, "program output");
            }
        }
        outcome
    }

    /// Exploration mode: up to `max_iterations` iterations under one
    /// strategy session.
    ///
    /// A scheduler error here means the strategy broke its contract; unlike
    /// replay divergence it is fatal, never folded in as a clean iteration.
    fn explore(
        &self,
        strategy: &mut dyn Strategy,
        started: Instant,
    ) -> Result<TestReport, EngineError> {
        let mut report = TestReport::new();
        tracing::debug!(strategy = strategy.name(), "exploration started");

        for iteration in 0..self.config.max_iterations {
            if iteration > 0 && !strategy.prepare_next_iteration() {
                report.strategy_exhausted = true;
                tracing::debug!(explored = iteration, "search space exhausted");
                break;
            }

            tracing::trace!(iteration, seed = strategy.iteration_seed(), "iteration started");
            let outcome = self.run_iteration(strategy, started);

            if let Some(error) = &outcome.scheduler_error {
                return Err(EngineError::Strategy(error.clone()));
            }
            if outcome.status == IterationStatus::Canceled {
                // Partial results of a canceled iteration are discarded.
                break;
            }
            let run_expired = outcome.status == IterationStatus::TimedOut
                && self
                    .config
                    .run_timeout
                    .is_some_and(|t| started.elapsed() >= t);

            report.record_iteration(&outcome);

            if outcome.bug.is_some() && self.config.stop_on_first_bug {
                break;
            }
            if run_expired {
                break;
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    /// Replay mode: exactly one iteration against a recorded trace.
    fn replay(&self, trace: ScheduleTrace, started: Instant) -> TestReport {
        let mut report = TestReport::new();
        let mut strategy = ReplayStrategy::new(trace);
        tracing::debug!(decisions = %strategy.position(), "replay started");

        let outcome = self.run_iteration(&mut strategy, started);
        if outcome.status != IterationStatus::Canceled {
            report.record_iteration(&outcome);
            if let Some(error) = &outcome.scheduler_error {
                report.verdict = report.verdict.max(RunVerdict::NonReproduction);
                tracing::warn!(%error, "replay diverged");
            } else if outcome.bug.is_none() {
                // The trace was expected to reproduce a violation.
                report.verdict = report.verdict.max(RunVerdict::NonReproduction);
                tracing::warn!("replay completed without reproducing a bug");
            }
        }

        report.elapsed = started.elapsed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, ActorContext};
    use crate::event::Event;
    use crate::logging::init_test_logging;
    use crate::types::ActorId;

    /// Fails an assertion when a nondeterministic choice lands on 0.
    struct FlakyWorker;

    impl Actor for FlakyWorker {
        fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event) {
            if event.is("work") {
                let roll = cx.choose(4);
                cx.assert(roll != 0, "roll hit the bad value");
                cx.halt();
            }
        }
    }

    /// Sends one ping and halts; never fails.
    struct Quiet {
        target: ActorId,
    }

    impl Actor for Quiet {
        fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event) {
            if event.is("start") {
                cx.send(self.target, Event::new("work"));
                cx.halt();
            }
        }
    }

    /// Always passes.
    struct SolidWorker;

    impl Actor for SolidWorker {
        fn on_event(&mut self, cx: &mut ActorContext<'_>, _event: Event) {
            cx.halt();
        }
    }

    fn flaky_setup(rt: &mut Runtime) {
        let worker = rt.create_actor(FlakyWorker);
        let starter = rt.create_actor(Quiet { target: worker });
        rt.send(starter, Event::new("start"));
    }

    #[test]
    fn random_exploration_finds_the_flaky_assertion() {
        init_test_logging();
        let config = Config::new(StrategyKind::Random)
            .seed(11)
            .max_iterations(200);
        let engine = TestingEngine::new(config, flaky_setup);
        let report = engine.run().expect("run");
        assert_eq!(report.verdict, RunVerdict::BugFound);
        assert_eq!(report.bugs_found, 1);
        assert!(!report.bugs[0].trace.is_empty());
    }

    #[test]
    fn clean_program_reports_no_bug() {
        init_test_logging();
        let config = Config::new(StrategyKind::Random).seed(3).max_iterations(20);
        let engine = TestingEngine::new(config, |rt: &mut Runtime| {
            let worker = rt.create_actor(SolidWorker);
            rt.send(worker, Event::new("work"));
        });
        let report = engine.run().expect("run");
        assert_eq!(report.verdict, RunVerdict::NoBugFound);
        assert_eq!(report.iterations, 20);
        assert_eq!(report.bugs_found, 0);
    }

    #[test]
    fn found_bug_replays_to_the_same_bug() {
        init_test_logging();
        let config = Config::new(StrategyKind::Random)
            .seed(11)
            .max_iterations(200);
        let engine = TestingEngine::new(config, flaky_setup);
        let report = engine.run().expect("run");
        assert_eq!(report.verdict, RunVerdict::BugFound);
        let trace = report.bugs[0].trace.clone();

        let replay_config = Config::new(StrategyKind::Replay).replay_trace(trace);
        let replay = TestingEngine::new(replay_config, flaky_setup);
        let replay_report = replay.run().expect("replay");
        assert_eq!(replay_report.verdict, RunVerdict::BugFound);
        assert!(replay_report.bugs[0]
            .description
            .contains("roll hit the bad value"));
    }

    #[test]
    fn replay_against_wrong_program_is_non_reproduction() {
        init_test_logging();
        let config = Config::new(StrategyKind::Random)
            .seed(11)
            .max_iterations(200);
        let engine = TestingEngine::new(config, flaky_setup);
        let report = engine.run().expect("run");
        let trace = report.bugs[0].trace.clone();

        // A program with a single always-passing actor cannot follow the
        // recorded schedule.
        let replay_config = Config::new(StrategyKind::Replay).replay_trace(trace);
        let replay = TestingEngine::new(replay_config, |rt: &mut Runtime| {
            let worker = rt.create_actor(SolidWorker);
            rt.send(worker, Event::new("work"));
        });
        let replay_report = replay.run().expect("replay");
        assert_eq!(replay_report.verdict, RunVerdict::NonReproduction);
    }

    #[test]
    fn missing_replay_source_is_a_config_error() {
        let config = Config::new(StrategyKind::Replay);
        let engine = TestingEngine::new(config, |_rt: &mut Runtime| {});
        assert!(engine.run().is_err());
    }

    #[test]
    fn keep_exploring_collects_multiple_findings() {
        init_test_logging();
        let config = Config::new(StrategyKind::Random)
            .seed(5)
            .max_iterations(300)
            .keep_exploring();
        let engine = TestingEngine::new(config, flaky_setup);
        let report = engine.run().expect("run");
        assert!(report.bugs_found > 1, "expected repeated findings");
        assert_eq!(report.iterations, 300);
    }

    #[test]
    fn priority_strategy_exhausts_tiny_search_space() {
        init_test_logging();
        // Single actor, no choices: one schedule total.
        let config = Config::new(StrategyKind::Priority).max_iterations(50);
        let engine = TestingEngine::new(config, |rt: &mut Runtime| {
            let worker = rt.create_actor(SolidWorker);
            rt.send(worker, Event::new("work"));
        });
        let report = engine.run().expect("run");
        assert!(report.strategy_exhausted);
        assert!(report.iterations < 50);
        assert_eq!(report.verdict, RunVerdict::NoBugFound);
    }

    #[test]
    fn cancellation_discards_the_inflight_iteration() {
        init_test_logging();
        let config = Config::new(StrategyKind::Random).max_iterations(100);
        let engine = TestingEngine::new(config, flaky_setup);
        engine.cancel_token().cancel();
        let report = engine.run().expect("run");
        assert_eq!(report.iterations, 0);
        assert_eq!(report.verdict, RunVerdict::NoBugFound);
    }

    #[test]
    fn contract_breaking_strategy_is_fatal_in_exploration() {
        init_test_logging();
        /// Names an actor that was never created and choices out of range.
        struct Rogue;
        impl Strategy for Rogue {
            fn name(&self) -> &'static str {
                "rogue"
            }
            fn next_actor(
                &mut self,
                _runnable: &[crate::types::ActorId],
            ) -> Result<crate::types::ActorId, crate::error::SchedulerError> {
                Ok(crate::types::ActorId::from_index(99))
            }
            fn next_choice(&mut self, bound: u64) -> Result<u64, crate::error::SchedulerError> {
                Ok(bound)
            }
            fn prepare_next_iteration(&mut self) -> bool {
                true
            }
        }

        let config = Config::new(StrategyKind::Random).max_iterations(5);
        let engine = TestingEngine::new(config, flaky_setup);
        let mut rogue = Rogue;
        let err = engine.explore(&mut rogue, Instant::now()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Strategy(crate::error::SchedulerError::InvalidDecision { .. })
        ));
    }

    #[test]
    fn deadlock_is_reported_with_blocked_actors() {
        init_test_logging();
        /// Waits for a message that never comes.
        struct Waiter;
        impl Actor for Waiter {
            fn on_event(&mut self, _cx: &mut ActorContext<'_>, _event: Event) {}
        }
        let config = Config::new(StrategyKind::Random).max_iterations(1);
        let engine = TestingEngine::new(config, |rt: &mut Runtime| {
            let waiter = rt.create_actor(Waiter);
            rt.send(waiter, Event::new("tick"));
        });
        let report = engine.run().expect("run");
        assert_eq!(report.verdict, RunVerdict::BugFound);
        assert!(report.bugs[0].description.contains("deadlock"));
    }
}
