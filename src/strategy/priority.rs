//! Priority-based systematic exploration.
//!
//! The strategy keeps a total priority order over every actor it has seen.
//! At each scheduling point it runs the highest-priority runnable actor, so
//! within one iteration the schedule is fully determined by the ordering.
//! Every `change_frequency` decisions it reaches a *change point* and
//! demotes one actor to the lowest priority; which actor to demote, and the
//! value of every nondeterministic data choice, are the branch points of a
//! depth-first search over schedules.
//!
//! The search is driven by an explicit backtracking stack of choice points.
//! Each iteration replays the stack prefix and extends it with
//! first-alternative choices; between iterations the deepest non-exhausted
//! choice point is advanced and everything below it discarded. Two
//! iterations therefore never follow the same choice path, which is the
//! non-repetition guarantee, and an empty stack after backtracking means
//! the search space within the bound is exhausted.

use crate::error::SchedulerError;
use crate::strategy::Strategy;
use crate::types::ActorId;

/// One branch point in the depth-first search.
#[derive(Debug, Clone, Copy)]
struct ChoicePoint {
    /// Alternative currently being explored.
    index: u64,
    /// Number of alternatives at this point.
    limit: u64,
}

/// Depth-first systematic exploration biased by a priority ordering.
#[derive(Debug)]
pub struct PriorityStrategy {
    change_frequency: u64,
    /// Current total order, highest priority first. Rebuilt each iteration
    /// as actors are discovered, in creation order.
    priorities: Vec<ActorId>,
    /// Scheduling decisions taken this iteration.
    decisions: u64,
    /// Explored choice path; persists across iterations.
    stack: Vec<ChoicePoint>,
    /// Position within `stack` this iteration.
    cursor: usize,
    exhausted: bool,
}

impl PriorityStrategy {
    /// Creates a priority strategy with a change point every
    /// `change_frequency` scheduling decisions.
    ///
    /// # Panics
    ///
    /// Panics if `change_frequency` is zero; the engine validates this
    /// before constructing the strategy.
    #[must_use]
    pub fn new(change_frequency: u64) -> Self {
        assert!(change_frequency > 0, "change_frequency must be non-zero");
        Self {
            change_frequency,
            priorities: Vec::new(),
            decisions: 0,
            stack: Vec::new(),
            cursor: 0,
            exhausted: false,
        }
    }

    /// True once every choice path within the bound has been explored.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Takes or replays the next branch of the search.
    fn branch(&mut self, limit: u64) -> u64 {
        if self.cursor == self.stack.len() {
            self.stack.push(ChoicePoint { index: 0, limit });
        }
        let point = self.stack[self.cursor];
        debug_assert_eq!(
            point.limit, limit,
            "choice point shape changed under a replayed prefix"
        );
        self.cursor += 1;
        point.index.min(limit.saturating_sub(1))
    }
}

impl Strategy for PriorityStrategy {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn next_actor(&mut self, runnable: &[ActorId]) -> Result<ActorId, SchedulerError> {
        debug_assert!(!runnable.is_empty(), "runnable set must be non-empty");

        // Newly discovered actors enter at the lowest priority, in the
        // deterministic order the scheduler lists them.
        for &id in runnable {
            if !self.priorities.contains(&id) {
                self.priorities.push(id);
            }
        }

        // Change point: pick an actor to demote, as a DFS branch.
        if self.decisions > 0
            && self.decisions % self.change_frequency == 0
            && self.priorities.len() > 1
        {
            let idx = self.branch(self.priorities.len() as u64) as usize;
            let demoted = self.priorities.remove(idx);
            self.priorities.push(demoted);
            tracing::trace!(actor = %demoted, "priority change point");
        }
        self.decisions += 1;

        let picked = self
            .priorities
            .iter()
            .copied()
            .find(|id| runnable.contains(id))
            .ok_or_else(|| SchedulerError::InvalidDecision {
                decision: "no runnable actor in priority order".to_string(),
            })?;
        Ok(picked)
    }

    fn next_choice(&mut self, bound: u64) -> Result<u64, SchedulerError> {
        Ok(self.branch(bound))
    }

    fn prepare_next_iteration(&mut self) -> bool {
        self.decisions = 0;
        self.priorities.clear();
        // Entries beyond the cursor were never exercised this run; the
        // path that created them no longer exists.
        self.stack.truncate(self.cursor);
        self.cursor = 0;

        loop {
            match self.stack.last_mut() {
                None => {
                    self.exhausted = true;
                    return false;
                }
                Some(top) if top.index + 1 < top.limit => {
                    top.index += 1;
                    return true;
                }
                Some(_) => {
                    self.stack.pop();
                }
            }
        }
    }
}
