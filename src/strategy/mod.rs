//! Pluggable scheduling strategies.
//!
//! A strategy is the decision-making half of the scheduler: given the
//! current runnable set or a choice range, it picks the next decision. Three
//! variants share one contract:
//!
//! - [`RandomStrategy`]: seeded uniform sampling; good cheap exploration.
//! - [`PriorityStrategy`]: systematic depth-first enumeration of priority
//!   orderings; guarantees no ordering prefix repeats within a session.
//! - [`ReplayStrategy`]: exact replay of a recorded [`ScheduleTrace`],
//!   failing fast on any divergence.
//!
//! Strategies never inspect or mutate actor state; they observe only
//! handles, runnability, and ranges, and they never block.
//!
//! [`ScheduleTrace`]: crate::trace::ScheduleTrace

use crate::error::SchedulerError;
use crate::types::ActorId;

pub mod priority;
pub mod random;
pub mod replay;

pub use priority::PriorityStrategy;
pub use random::RandomStrategy;
pub use replay::ReplayStrategy;

/// Decision-making algorithm behind the scheduler.
///
/// `next_actor` and `next_choice` are each called exactly once per yield
/// point and must return a member of the candidate set / range they were
/// given. `prepare_next_iteration` repositions the strategy for a fresh
/// iteration and returns `false` once the search space within the
/// configured bound is exhausted.
pub trait Strategy: Send {
    /// Short name for reports and logs.
    fn name(&self) -> &'static str;

    /// Picks the next actor to run from a non-empty runnable set.
    fn next_actor(&mut self, runnable: &[ActorId]) -> Result<ActorId, SchedulerError>;

    /// Picks a value in `[0, bound)` for a nondeterministic choice.
    fn next_choice(&mut self, bound: u64) -> Result<u64, SchedulerError>;

    /// Repositions the strategy for the next iteration.
    ///
    /// Returns `false` when every schedule within the strategy's bound has
    /// been explored; the engine then ends the session early with full
    /// coverage noted, which is not an error.
    fn prepare_next_iteration(&mut self) -> bool;

    /// Seed driving the current iteration, recorded into its trace.
    ///
    /// Zero for strategies that are not seed-driven.
    fn iteration_seed(&self) -> u64 {
        0
    }
}
