//! The bug-finding runtime: actor lifecycle, event delivery, fault capture.
//!
//! A runtime owns one iteration's actors, inboxes, and monitors, and drives
//! the execution loop: at each step it asks the [`Scheduler`] for the next
//! decision, delivers one inbox event to the chosen actor, and lets the
//! handler run to completion. Uncaught panics from user code become
//! `BugFound` outcomes with the full schedule trace attached; once a bug is
//! found no further actor is scheduled and undelivered sends are dropped.
//! At quiescence every monitor is queried, and a hot monitor is a liveness
//! violation. That check is skipped when a safety bug already ended the
//! iteration, since only the first bug per iteration is reported.
//!
//! Runtimes are iteration-local. Nothing here is shared between iterations,
//! which is what allows independent iterations to run concurrently.

use crate::actor::{Actor, ActorContext};
use crate::error::{Bug, SchedulerError};
use crate::event::Event;
use crate::logging::IterationLog;
use crate::monitor::Monitor;
use crate::scheduler::{SchedulePoint, Scheduler};
use crate::strategy::Strategy;
use crate::trace::ScheduleTrace;
use crate::types::{ActorId, IterationStatus, MonitorId};
use std::collections::{BTreeSet, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation signal, checked at iteration boundaries and at
/// every yield point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-canceled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Cancellation and deadline inputs for one iteration.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    /// Cooperative cancellation signal.
    pub cancel: CancelToken,
    /// Deadline for this iteration alone.
    pub iteration_deadline: Option<Instant>,
    /// Deadline for the whole run.
    pub run_deadline: Option<Instant>,
}

impl RunControl {
    /// Returns the status that should end the iteration now, if any.
    pub(crate) fn check(&self) -> Option<IterationStatus> {
        if self.cancel.is_canceled() {
            return Some(IterationStatus::Canceled);
        }
        let now = Instant::now();
        let expired = |deadline: Option<Instant>| deadline.is_some_and(|d| now >= d);
        if expired(self.iteration_deadline) || expired(self.run_deadline) {
            return Some(IterationStatus::TimedOut);
        }
        None
    }
}

/// Why a handler was cut short.
pub(crate) enum AbortReason {
    /// A bug was detected mid-handler (failed context assertion).
    Bug(Bug),
    /// Cancellation or a deadline fired at a yield point.
    Control(IterationStatus),
    /// The strategy could not produce a decision (replay divergence).
    Scheduler(SchedulerError),
}

/// Panic payload marking a deliberate unwind out of a handler.
///
/// The runtime unwinds with this marker when a yield point inside a handler
/// must end the iteration; the dispatch loop recognizes it and reads the
/// stored [`AbortReason`] instead of reporting an uncaught fault.
pub(crate) struct IterationAbort;

/// Everything an actor context may touch while a handler runs.
///
/// The actor being dispatched is taken out of its slot first, so handing
/// the context a mutable borrow of the world aliases nothing.
pub(crate) struct World {
    inboxes: Vec<VecDeque<Event>>,
    scheduler: Scheduler,
    monitors: Vec<Box<dyn Monitor>>,
    log: IterationLog,
    event_kinds: BTreeSet<String>,
    abort: Option<AbortReason>,
    halt_requested: bool,
    pending_spawns: Vec<Box<dyn Actor>>,
    ctrl: RunControl,
}

impl World {
    pub(crate) fn actor_count(&self) -> usize {
        self.inboxes.len()
    }

    /// Registers a new actor and its empty inbox; returns its handle.
    pub(crate) fn spawn(&mut self, actor: Box<dyn Actor>) -> ActorId {
        let id = self.scheduler.register_actor();
        self.inboxes.push(VecDeque::new());
        self.pending_spawns.push(actor);
        tracing::debug!(actor = %id, "actor created");
        id
    }

    /// Appends an event to a live actor's inbox. Events to halted actors
    /// are dropped.
    pub(crate) fn enqueue(&mut self, to: ActorId, event: Event) {
        self.event_kinds.insert(event.kind().to_string());
        if self.scheduler.status(to).is_terminal() {
            tracing::debug!(target_actor = %to, kind = %event.kind(), "event dropped: target halted");
            return;
        }
        self.inboxes[to.index()].push_back(event);
        self.scheduler.notify_runnable(to);
    }

    /// Delivers an event to every monitor, in registration order.
    pub(crate) fn broadcast(&mut self, event: &Event) {
        self.event_kinds.insert(event.kind().to_string());
        for monitor in &mut self.monitors {
            monitor.on_event(event);
        }
    }

    /// Resolves a nondeterministic choice; this is a yield point.
    pub(crate) fn choose(
        &mut self,
        strategy: &mut dyn Strategy,
        bound: u64,
    ) -> Result<u64, AbortReason> {
        if let Some(status) = self.ctrl.check() {
            return Err(AbortReason::Control(status));
        }
        self.scheduler
            .choose_value(strategy, bound)
            .map_err(AbortReason::Scheduler)
    }

    pub(crate) fn request_halt(&mut self) {
        self.halt_requested = true;
    }

    pub(crate) fn log_line(&mut self, line: String) {
        self.log.push(line);
    }

    pub(crate) fn set_abort(&mut self, reason: AbortReason) {
        self.abort = Some(reason);
    }

    /// First hot monitor at quiescence, as a liveness bug.
    fn hot_monitor_bug(&self) -> Option<Bug> {
        self.monitors
            .iter()
            .find(|m| m.is_hot())
            .map(|m| Bug::MonitorHot {
                monitor: m.name().to_string(),
                reason: m.hot_reason(),
            })
    }
}

/// Result of one iteration.
#[derive(Debug)]
pub struct IterationOutcome {
    /// Terminal status of the iteration.
    ///
    /// When `scheduler_error` is set the status reads `Completed` but the
    /// engine reclassifies the iteration: a non-reproduction in replay
    /// mode, a fatal contract violation in exploration mode. Neither is
    /// ever conflated with a clean iteration in the final report.
    pub status: IterationStatus,
    /// The bug that ended the iteration, if one was found.
    pub bug: Option<Bug>,
    /// Replay divergence or strategy contract violation, if any.
    pub scheduler_error: Option<SchedulerError>,
    /// The full decision trace of the iteration.
    pub trace: ScheduleTrace,
    /// True if the iteration stopped at the decision depth bound.
    pub depth_capped: bool,
    /// Every event kind observed, for coverage aggregation.
    pub event_kinds: BTreeSet<String>,
    /// Captured program output.
    pub output: String,
}

/// One iteration's bug-finding runtime.
pub struct Runtime {
    actors: Vec<Option<Box<dyn Actor>>>,
    world: World,
}

impl Runtime {
    /// Creates a fresh runtime bounding the iteration at `max_decisions`.
    #[must_use]
    pub fn new(max_decisions: u64) -> Self {
        Self {
            actors: Vec::new(),
            world: World {
                inboxes: Vec::new(),
                scheduler: Scheduler::new(max_decisions),
                monitors: Vec::new(),
                log: IterationLog::new(),
                event_kinds: BTreeSet::new(),
                abort: None,
                halt_requested: false,
                pending_spawns: Vec::new(),
                ctrl: RunControl::default(),
            },
        }
    }

    /// Creates an actor during program setup. Handles are assigned in
    /// creation order; the actor is blocked until an event arrives.
    pub fn create_actor<A: Actor>(&mut self, actor: A) -> ActorId {
        let id = self.world.spawn(Box::new(actor));
        self.integrate_spawns();
        id
    }

    /// Registers a monitor. Monitors observe broadcasts and are never
    /// scheduled; handles are assigned in registration order.
    pub fn register_monitor<M: Monitor>(&mut self, monitor: M) -> MonitorId {
        let id = MonitorId::from_index(self.world.monitors.len());
        self.world.monitors.push(Box::new(monitor));
        id
    }

    /// Enqueues an initial event during program setup.
    ///
    /// # Panics
    ///
    /// Panics if `to` was never created; this is a harness setup error, not
    /// a finding about the program under test.
    pub fn send(&mut self, to: ActorId, event: Event) {
        assert!(
            to.index() < self.world.actor_count(),
            "send to unknown {to} during setup"
        );
        self.world.enqueue(to, event);
    }

    /// Runs the iteration to a terminal status under the given strategy.
    pub fn run(&mut self, strategy: &mut dyn Strategy, ctrl: &RunControl) -> IterationOutcome {
        self.world.ctrl = ctrl.clone();
        self.world.scheduler.set_trace_seed(strategy.iteration_seed());

        let mut found_bug: Option<Bug> = None;
        let mut scheduler_error: Option<SchedulerError> = None;

        let status = loop {
            if let Some(status) = self.world.ctrl.check() {
                break status;
            }
            match self.world.scheduler.next_decision(strategy) {
                Err(error) => {
                    scheduler_error = Some(error);
                    break IterationStatus::Completed;
                }
                Ok(SchedulePoint::DepthBound) => break IterationStatus::Completed,
                Ok(SchedulePoint::Quiescent) => {
                    if let Some(bug) = self.world.hot_monitor_bug() {
                        found_bug = Some(bug);
                        break IterationStatus::BugFound;
                    }
                    break IterationStatus::Completed;
                }
                Ok(SchedulePoint::Deadlock(blocked)) => {
                    found_bug = Some(Bug::Deadlock { blocked });
                    break IterationStatus::Deadlocked;
                }
                Ok(SchedulePoint::Next(id)) => match self.dispatch(id, strategy) {
                    None => {}
                    Some(AbortReason::Bug(bug)) => {
                        found_bug = Some(bug);
                        break IterationStatus::BugFound;
                    }
                    Some(AbortReason::Control(status)) => break status,
                    Some(AbortReason::Scheduler(error)) => {
                        scheduler_error = Some(error);
                        break IterationStatus::Completed;
                    }
                },
            }
        };

        self.world.scheduler.complete(status);
        if let Some(bug) = &found_bug {
            tracing::info!(%bug, %status, "iteration ended");
        } else {
            tracing::debug!(%status, decisions = self.world.scheduler.trace().len(), "iteration ended");
        }

        IterationOutcome {
            status,
            bug: found_bug,
            scheduler_error,
            trace: self.world.scheduler.trace().clone(),
            depth_capped: self.world.scheduler.depth_capped(),
            event_kinds: std::mem::take(&mut self.world.event_kinds),
            output: std::mem::take(&mut self.world.log).into_text(),
        }
    }

    /// Delivers the next inbox event to `id` and runs its handler to
    /// completion, capturing panics. Returns the reason the iteration must
    /// end, if the handler produced one.
    fn dispatch(&mut self, id: ActorId, strategy: &mut dyn Strategy) -> Option<AbortReason> {
        let Some(mut actor) = self.actors[id.index()].take() else {
            debug_assert!(false, "runnable actor {id} has no body");
            return None;
        };
        let Some(event) = self.world.inboxes[id.index()].pop_front() else {
            // Runnable implies a pending event; nothing to do if not.
            self.world.scheduler.notify_blocked(id);
            self.actors[id.index()] = Some(actor);
            return None;
        };

        self.world.halt_requested = false;
        self.world.event_kinds.insert(event.kind().to_string());
        tracing::trace!(actor = %id, kind = %event.kind(), "delivering event");

        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut cx = ActorContext {
                id,
                world: &mut self.world,
                strategy,
            };
            actor.on_event(&mut cx, event);
        }));

        self.actors[id.index()] = Some(actor);
        self.integrate_spawns();

        let abort = match result {
            Ok(()) => self.world.abort.take(),
            Err(payload) => {
                if payload.is::<IterationAbort>() {
                    self.world.abort.take()
                } else {
                    Some(AbortReason::Bug(Bug::UncaughtFault {
                        actor: id,
                        message: panic_message(payload.as_ref()),
                    }))
                }
            }
        };

        if self.world.halt_requested {
            self.world.scheduler.notify_halted(id);
            self.world.inboxes[id.index()].clear();
            self.actors[id.index()] = None;
        } else if self.world.inboxes[id.index()].is_empty() {
            self.world.scheduler.notify_blocked(id);
        } else {
            self.world.scheduler.notify_runnable(id);
        }

        abort
    }

    /// Moves actors created during a handler into their slots. Slot order
    /// matches handle assignment order, so indices stay aligned.
    fn integrate_spawns(&mut self) {
        for spawned in self.world.pending_spawns.drain(..) {
            self.actors.push(Some(spawned));
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::RandomStrategy;

    /// Sends one event to a target then halts.
    struct Sender {
        target: ActorId,
    }

    impl Actor for Sender {
        fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event) {
            if event.is("start") {
                cx.send(self.target, Event::new("ping"));
                cx.halt();
            }
        }
    }

    /// Halts on the first event it receives.
    struct Receiver;

    impl Actor for Receiver {
        fn on_event(&mut self, cx: &mut ActorContext<'_>, _event: Event) {
            cx.halt();
        }
    }

    /// Panics when it sees the named event.
    struct Exploder {
        on: &'static str,
    }

    impl Actor for Exploder {
        fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event) {
            assert!(!event.is(self.on), "exploded on {}", self.on);
            cx.halt();
        }
    }

    fn run_once(setup: impl FnOnce(&mut Runtime)) -> IterationOutcome {
        let mut runtime = Runtime::new(1_000);
        setup(&mut runtime);
        let mut strategy = RandomStrategy::new(7);
        runtime.run(&mut strategy, &RunControl::default())
    }

    #[test]
    fn handoff_completes_with_two_decisions() {
        let outcome = run_once(|rt| {
            let receiver = rt.create_actor(Receiver);
            let sender = rt.create_actor(Sender { target: receiver });
            rt.send(sender, Event::new("start"));
        });
        assert_eq!(outcome.status, IterationStatus::Completed);
        assert_eq!(outcome.trace.len(), 2);
        assert!(outcome.bug.is_none());
    }

    #[test]
    fn uncaught_panic_is_a_bug() {
        let outcome = run_once(|rt| {
            let exploder = rt.create_actor(Exploder { on: "bad" });
            rt.send(exploder, Event::new("bad"));
        });
        assert_eq!(outcome.status, IterationStatus::BugFound);
        match outcome.bug {
            Some(Bug::UncaughtFault { message, .. }) => {
                assert!(message.contains("exploded on bad"));
            }
            other => panic!("unexpected bug: {other:?}"),
        }
    }

    #[test]
    fn blocked_actor_deadlocks() {
        let outcome = run_once(|rt| {
            let waiter = rt.create_actor(Receiver);
            let sender = rt.create_actor(Sender {
                // Sends to itself, never to the waiter.
                target: ActorId::from_index(1),
            });
            let _ = waiter;
            rt.send(sender, Event::new("start"));
        });
        assert_eq!(outcome.status, IterationStatus::Deadlocked);
        assert!(matches!(outcome.bug, Some(Bug::Deadlock { .. })));
    }

    #[test]
    fn empty_program_completes() {
        let outcome = run_once(|_| {});
        assert_eq!(outcome.status, IterationStatus::Completed);
        assert!(outcome.trace.is_empty());
    }

    #[test]
    fn canceled_before_start() {
        let mut runtime = Runtime::new(1_000);
        let receiver = runtime.create_actor(Receiver);
        runtime.send(receiver, Event::new("go"));
        let ctrl = RunControl::default();
        ctrl.cancel.cancel();
        let mut strategy = RandomStrategy::new(7);
        let outcome = runtime.run(&mut strategy, &ctrl);
        assert_eq!(outcome.status, IterationStatus::Canceled);
    }

    #[test]
    fn events_to_halted_actors_are_dropped() {
        let outcome = run_once(|rt| {
            let receiver = rt.create_actor(Receiver);
            let a = rt.create_actor(Sender { target: receiver });
            let b = rt.create_actor(Sender { target: receiver });
            rt.send(a, Event::new("start"));
            rt.send(b, Event::new("start"));
        });
        // Receiver halts on the first ping; the second is dropped.
        assert_eq!(outcome.status, IterationStatus::Completed);
    }

    #[test]
    fn depth_bound_caps_iteration() {
        /// Ping-pongs forever.
        struct Echo {
            peer: Option<ActorId>,
        }
        impl Actor for Echo {
            fn on_event(&mut self, cx: &mut ActorContext<'_>, event: Event) {
                let peer = self
                    .peer
                    .or_else(|| event.payload::<ActorId>().copied())
                    .unwrap_or_else(|| cx.id());
                self.peer = Some(peer);
                cx.send(peer, Event::new("echo"));
            }
        }
        let mut runtime = Runtime::new(10);
        let a = runtime.create_actor(Echo { peer: None });
        let b = runtime.create_actor(Echo { peer: Some(a) });
        runtime.send(b, Event::with_payload("echo", a));
        let mut strategy = RandomStrategy::new(3);
        let outcome = runtime.run(&mut strategy, &RunControl::default());
        assert_eq!(outcome.status, IterationStatus::Completed);
        assert!(outcome.depth_capped);
        assert_eq!(outcome.trace.len(), 10);
    }
}
