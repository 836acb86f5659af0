//! The actor abstraction and its yield-point surface.
//!
//! An actor is a unit of concurrent execution with private state and a FIFO
//! event inbox. Handlers run atomically: the runtime delivers one event,
//! the handler runs to completion, and control returns to the scheduler.
//! Every interaction with the outside world goes through the [`ActorContext`],
//! which is where the scheduler regains control for choices and where
//! cancellation and timeouts are observed.
//!
//! # Example
//!
//! ```ignore
//! struct Pinger { target: ActorId }
//!
//! impl Actor for Pinger {
//!     fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event) {
//!         if event.is("start") {
//!             cx.send(self.target, Event::new("ping"));
//!             cx.halt();
//!         }
//!     }
//! }
//! ```

use crate::error::Bug;
use crate::event::Event;
use crate::runtime::{AbortReason, IterationAbort, World};
use crate::strategy::Strategy;
use crate::types::ActorId;

/// A communicating, event-driven state machine under test.
///
/// The runtime owns the actor exclusively; the scheduler sees it only as an
/// opaque [`ActorId`]. An actor's handler is invoked once per delivered
/// event, in per-inbox FIFO order, with no other actor running at the same
/// instant.
pub trait Actor: Send + 'static {
    /// Handles one event from the inbox.
    ///
    /// A panic out of this method is captured as an uncaught-fault bug for
    /// the current iteration; it never crashes the engine.
    fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event);
}

/// The runtime surface available to an actor while it handles an event.
pub struct ActorContext<'a> {
    pub(crate) id: ActorId,
    pub(crate) world: &'a mut World,
    pub(crate) strategy: &'a mut dyn Strategy,
}

impl ActorContext<'_> {
    /// The handle of the actor currently running.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Sends an event to another actor (or to self).
    ///
    /// Events sent to a halted actor are dropped. Sending to a handle that
    /// was never created fails the current iteration.
    pub fn send(&mut self, to: ActorId, event: Event) {
        if to.index() >= self.world.actor_count() {
            let bug = Bug::AssertionFailure {
                actor: self.id,
                message: format!("send to unknown {to}"),
            };
            self.abort(AbortReason::Bug(bug));
        }
        self.world.enqueue(to, event);
    }

    /// Broadcasts an event to every registered monitor, synchronously with
    /// this point in the execution.
    pub fn broadcast(&mut self, event: &Event) {
        self.world.broadcast(event);
    }

    /// Creates a new actor. The child starts blocked until it receives an
    /// event; its handle is assigned in creation order.
    pub fn create_actor<A: Actor>(&mut self, actor: A) -> ActorId {
        self.world.spawn(Box::new(actor))
    }

    /// Resolves a nondeterministic choice over `[0, bound)`.
    ///
    /// This is a yield point: the scheduler routes the choice through the
    /// active strategy and records it in the trace, and cancellation or
    /// timeout is observed here.
    pub fn choose(&mut self, bound: u64) -> u64 {
        match self.world.choose(&mut *self.strategy, bound) {
            Ok(value) => value,
            Err(reason) => self.abort(reason),
        }
    }

    /// Resolves a nondeterministic boolean choice.
    pub fn choose_bool(&mut self) -> bool {
        self.choose(2) == 1
    }

    /// Checks a safety property; failure ends the iteration as a bug.
    pub fn assert(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.fail(message);
        }
    }

    /// Unconditionally reports an assertion failure for this actor.
    pub fn fail(&mut self, message: impl Into<String>) -> ! {
        let bug = Bug::AssertionFailure {
            actor: self.id,
            message: message.into(),
        };
        self.abort(AbortReason::Bug(bug))
    }

    /// Halts this actor once the current handler returns. Remaining inbox
    /// events are discarded and the actor is never scheduled again.
    pub fn halt(&mut self) {
        self.world.request_halt();
    }

    /// Writes one line of program output to the iteration-scoped log.
    pub fn log(&mut self, line: impl Into<String>) {
        self.world.log_line(line.into());
    }

    fn abort(&mut self, reason: AbortReason) -> ! {
        self.world.set_abort(reason);
        std::panic::panic_any(IterationAbort)
    }
}
