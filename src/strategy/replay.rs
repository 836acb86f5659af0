//! Exact replay of a recorded schedule trace.

use crate::error::SchedulerError;
use crate::strategy::Strategy;
use crate::trace::{Decision, ScheduleTrace};
use crate::types::ActorId;

/// Replays a previously recorded [`ScheduleTrace`] decision by decision.
///
/// The live runnable set is consulted only to validate that each recorded
/// decision is still legal. Any mismatch (a recorded actor that is not
/// runnable, a recorded choice outside the live range, a decision of the
/// wrong kind, or a trace that ends early) fails fast with a distinct
/// error; the engine reports it as non-reproduction rather than silently
/// diverging.
#[derive(Debug)]
pub struct ReplayStrategy {
    trace: ScheduleTrace,
    cursor: usize,
}

impl ReplayStrategy {
    /// Creates a replay strategy over a recorded trace.
    #[must_use]
    pub const fn new(trace: ScheduleTrace) -> Self {
        Self { trace, cursor: 0 }
    }

    /// Number of decisions replayed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    fn next_recorded(&mut self) -> Result<Decision, SchedulerError> {
        let decision = self
            .trace
            .get(self.cursor)
            .ok_or(SchedulerError::ReplayExhausted {
                position: self.cursor,
            })?;
        self.cursor += 1;
        Ok(decision)
    }
}

impl Strategy for ReplayStrategy {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn next_actor(&mut self, runnable: &[ActorId]) -> Result<ActorId, SchedulerError> {
        let position = self.cursor;
        match self.next_recorded()? {
            Decision::ScheduleNext(id) if runnable.contains(&id) => Ok(id),
            Decision::ScheduleNext(id) => Err(SchedulerError::ReplayDivergence {
                position,
                reason: format!("recorded {id} is not in the live runnable set"),
            }),
            Decision::Choice(v) => Err(SchedulerError::ReplayDivergence {
                position,
                reason: format!("expected a schedule decision, trace has choice {v}"),
            }),
        }
    }

    fn next_choice(&mut self, bound: u64) -> Result<u64, SchedulerError> {
        let position = self.cursor;
        match self.next_recorded()? {
            Decision::Choice(v) if v < bound => Ok(v),
            Decision::Choice(v) => Err(SchedulerError::ReplayDivergence {
                position,
                reason: format!("recorded choice {v} outside live range [0, {bound})"),
            }),
            Decision::ScheduleNext(id) => Err(SchedulerError::ReplayDivergence {
                position,
                reason: format!("expected a choice, trace has schedule decision for {id}"),
            }),
        }
    }

    fn prepare_next_iteration(&mut self) -> bool {
        // Replay is a single deterministic iteration.
        false
    }

    fn iteration_seed(&self) -> u64 {
        self.trace.seed
    }
}
