//! The cooperative scheduler: single authority for "whose turn is it".
//!
//! A scheduler is owned by exactly one iteration's runtime and passed by
//! reference to every decision point, never a process-wide singleton, so
//! independent iterations can run concurrently without interference. It
//! tracks the runnable/blocked/halted status of every registered actor,
//! asks the active [`Strategy`] for a decision at each yield point, appends
//! the decision to the [`ScheduleTrace`], and detects deadlock (no runnable
//! actor while some have not halted).
//!
//! Per iteration the scheduler moves `Initialized → Running →` one terminal
//! [`IterationStatus`]; terminal states are one-way and a new iteration
//! always starts a fresh scheduler.

use crate::error::SchedulerError;
use crate::strategy::Strategy;
use crate::trace::{Decision, ScheduleTrace};
use crate::types::{ActorId, ActorStatus, IterationStatus};

/// Outcome of one scheduling point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulePoint {
    /// Run this actor's next step.
    Next(ActorId),
    /// Every actor has halted; the iteration completed.
    Quiescent,
    /// No actor is runnable but these are still blocked.
    Deadlock(Vec<ActorId>),
    /// The per-iteration decision bound was reached.
    DepthBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Initialized,
    Running,
    Terminal(IterationStatus),
}

/// Per-iteration scheduling state: actor statuses, the recorded trace, and
/// the iteration's lifecycle.
#[derive(Debug)]
pub struct Scheduler {
    statuses: Vec<ActorStatus>,
    trace: ScheduleTrace,
    state: SchedulerState,
    max_decisions: u64,
    depth_capped: bool,
}

impl Scheduler {
    /// Creates a scheduler bounding each iteration at `max_decisions`
    /// recorded decisions.
    #[must_use]
    pub const fn new(max_decisions: u64) -> Self {
        Self {
            statuses: Vec::new(),
            trace: ScheduleTrace::new(0),
            state: SchedulerState::Initialized,
            max_decisions,
            depth_capped: false,
        }
    }

    /// Records the seed of the strategy driving this iteration into the
    /// trace header.
    pub fn set_trace_seed(&mut self, seed: u64) {
        self.trace.seed = seed;
    }

    /// Registers a new actor; ids are assigned in creation order.
    ///
    /// A fresh actor starts with an empty inbox and is therefore `Blocked`
    /// until an event arrives.
    pub fn register_actor(&mut self) -> ActorId {
        let id = ActorId::from_index(self.statuses.len());
        self.statuses.push(ActorStatus::Blocked);
        id
    }

    /// Current status of an actor.
    #[must_use]
    pub fn status(&self, id: ActorId) -> ActorStatus {
        self.statuses[id.index()]
    }

    /// Marks an actor runnable (inbox became non-empty). No-op once halted.
    pub fn notify_runnable(&mut self, id: ActorId) {
        let slot = &mut self.statuses[id.index()];
        if !slot.is_terminal() {
            *slot = ActorStatus::Runnable;
        }
    }

    /// Marks an actor blocked (inbox drained). No-op once halted.
    pub fn notify_blocked(&mut self, id: ActorId) {
        let slot = &mut self.statuses[id.index()];
        if !slot.is_terminal() {
            *slot = ActorStatus::Blocked;
        }
    }

    /// Marks an actor halted. Halting is one-way.
    pub fn notify_halted(&mut self, id: ActorId) {
        self.statuses[id.index()] = ActorStatus::Halted;
    }

    /// Returns the runnable actors in creation order.
    #[must_use]
    pub fn runnable_set(&self) -> Vec<ActorId> {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == ActorStatus::Runnable)
            .map(|(i, _)| ActorId::from_index(i))
            .collect()
    }

    /// Makes the next scheduling decision.
    ///
    /// Computes the runnable set; declares quiescence, deadlock, or the
    /// depth bound when no decision is possible; otherwise asks the
    /// strategy, validates its pick against the runnable set, and appends
    /// the decision to the trace.
    pub fn next_decision(
        &mut self,
        strategy: &mut dyn Strategy,
    ) -> Result<SchedulePoint, SchedulerError> {
        debug_assert!(
            !matches!(self.state, SchedulerState::Terminal(_)),
            "scheduling after termination"
        );
        self.state = SchedulerState::Running;

        if self.trace.len() as u64 >= self.max_decisions {
            self.depth_capped = true;
            return Ok(SchedulePoint::DepthBound);
        }

        let runnable = self.runnable_set();
        if runnable.is_empty() {
            let blocked: Vec<ActorId> = self
                .statuses
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == ActorStatus::Blocked)
                .map(|(i, _)| ActorId::from_index(i))
                .collect();
            return Ok(if blocked.is_empty() {
                SchedulePoint::Quiescent
            } else {
                SchedulePoint::Deadlock(blocked)
            });
        }

        let picked = strategy.next_actor(&runnable)?;
        if !runnable.contains(&picked) {
            return Err(SchedulerError::InvalidDecision {
                decision: format!("{picked} is not runnable"),
            });
        }
        self.trace.push(Decision::ScheduleNext(picked));
        Ok(SchedulePoint::Next(picked))
    }

    /// Resolves a nondeterministic choice over `[0, bound)` through the
    /// strategy and records it.
    pub fn choose_value(
        &mut self,
        strategy: &mut dyn Strategy,
        bound: u64,
    ) -> Result<u64, SchedulerError> {
        if bound == 0 {
            return Err(SchedulerError::InvalidDecision {
                decision: "empty choice range".to_string(),
            });
        }
        let value = strategy.next_choice(bound)?;
        if value >= bound {
            return Err(SchedulerError::InvalidDecision {
                decision: format!("choice {value} outside [0, {bound})"),
            });
        }
        self.trace.push(Decision::Choice(value));
        Ok(value)
    }

    /// Transitions to a terminal status. The first terminal status wins;
    /// later calls are ignored.
    pub fn complete(&mut self, status: IterationStatus) {
        if !matches!(self.state, SchedulerState::Terminal(_)) {
            self.state = SchedulerState::Terminal(status);
        }
    }

    /// The terminal status, once the iteration has ended.
    #[must_use]
    pub fn iteration_status(&self) -> Option<IterationStatus> {
        match self.state {
            SchedulerState::Terminal(status) => Some(status),
            _ => None,
        }
    }

    /// True if the iteration stopped because it hit the decision bound.
    #[must_use]
    pub const fn depth_capped(&self) -> bool {
        self.depth_capped
    }

    /// The trace recorded so far.
    #[must_use]
    pub const fn trace(&self) -> &ScheduleTrace {
        &self.trace
    }

    /// Consumes the scheduler, yielding the recorded trace.
    #[must_use]
    pub fn into_trace(self) -> ScheduleTrace {
        self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always picks the lowest-id runnable actor and choice zero.
    struct FirstFit;

    impl Strategy for FirstFit {
        fn name(&self) -> &'static str {
            "first-fit"
        }
        fn next_actor(&mut self, runnable: &[ActorId]) -> Result<ActorId, SchedulerError> {
            Ok(runnable[0])
        }
        fn next_choice(&mut self, _bound: u64) -> Result<u64, SchedulerError> {
            Ok(0)
        }
        fn prepare_next_iteration(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn quiescent_when_all_halted() {
        let mut scheduler = Scheduler::new(100);
        let a = scheduler.register_actor();
        scheduler.notify_halted(a);
        let point = scheduler.next_decision(&mut FirstFit).expect("decision");
        assert_eq!(point, SchedulePoint::Quiescent);
    }

    #[test]
    fn deadlock_when_blocked_remain() {
        let mut scheduler = Scheduler::new(100);
        let a = scheduler.register_actor();
        let b = scheduler.register_actor();
        scheduler.notify_halted(a);
        // b stays blocked.
        let point = scheduler.next_decision(&mut FirstFit).expect("decision");
        assert_eq!(point, SchedulePoint::Deadlock(vec![b]));
    }

    #[test]
    fn decisions_are_recorded_in_order() {
        let mut scheduler = Scheduler::new(100);
        let a = scheduler.register_actor();
        scheduler.notify_runnable(a);
        let point = scheduler.next_decision(&mut FirstFit).expect("decision");
        assert_eq!(point, SchedulePoint::Next(a));
        let choice = scheduler.choose_value(&mut FirstFit, 3).expect("choice");
        assert_eq!(choice, 0);
        assert_eq!(
            scheduler.trace().decisions(),
            &[Decision::ScheduleNext(a), Decision::Choice(0)]
        );
    }

    #[test]
    fn depth_bound_stops_scheduling() {
        let mut scheduler = Scheduler::new(1);
        let a = scheduler.register_actor();
        scheduler.notify_runnable(a);
        assert_eq!(
            scheduler.next_decision(&mut FirstFit).expect("first"),
            SchedulePoint::Next(a)
        );
        assert_eq!(
            scheduler.next_decision(&mut FirstFit).expect("second"),
            SchedulePoint::DepthBound
        );
        assert!(scheduler.depth_capped());
    }

    #[test]
    fn empty_choice_range_is_rejected() {
        let mut scheduler = Scheduler::new(100);
        let err = scheduler.choose_value(&mut FirstFit, 0).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDecision { .. }));
    }

    #[test]
    fn first_terminal_status_wins() {
        let mut scheduler = Scheduler::new(100);
        scheduler.complete(IterationStatus::BugFound);
        scheduler.complete(IterationStatus::Completed);
        assert_eq!(
            scheduler.iteration_status(),
            Some(IterationStatus::BugFound)
        );
    }

    #[test]
    fn halted_actor_cannot_become_runnable() {
        let mut scheduler = Scheduler::new(100);
        let a = scheduler.register_actor();
        scheduler.notify_halted(a);
        scheduler.notify_runnable(a);
        assert_eq!(scheduler.status(a), ActorStatus::Halted);
    }
}
