//! Seeded random exploration.

use crate::error::SchedulerError;
use crate::strategy::Strategy;
use crate::types::ActorId;
use crate::util::det_rng::{derive_seed, DetRng};

/// Uniformly samples scheduling decisions from a seeded deterministic RNG.
///
/// Each iteration runs under a fresh seed derived from `(base_seed,
/// iteration)`, so one exploration session covers many schedules while any
/// single iteration remains re-derivable from its recorded seed alone.
/// Never exhausts; the iteration budget bounds the session.
#[derive(Debug)]
pub struct RandomStrategy {
    base_seed: u64,
    iteration: u64,
    seed: u64,
    rng: DetRng,
}

impl RandomStrategy {
    /// Creates a random strategy from a base seed.
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        let seed = derive_seed(base_seed, 0);
        Self {
            base_seed,
            iteration: 0,
            seed,
            rng: DetRng::new(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn next_actor(&mut self, runnable: &[ActorId]) -> Result<ActorId, SchedulerError> {
        debug_assert!(!runnable.is_empty(), "runnable set must be non-empty");
        Ok(runnable[self.rng.next_index(runnable.len())])
    }

    fn next_choice(&mut self, bound: u64) -> Result<u64, SchedulerError> {
        Ok(self.rng.next_below(bound))
    }

    fn prepare_next_iteration(&mut self) -> bool {
        self.iteration += 1;
        self.seed = derive_seed(self.base_seed, self.iteration);
        self.rng = DetRng::new(self.seed);
        true
    }

    fn iteration_seed(&self) -> u64 {
        self.seed
    }
}
