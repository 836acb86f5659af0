//! Actorlab: systematic concurrency testing for actor programs.
//!
//! # Overview
//!
//! Actorlab explores the schedules of an actor program under a cooperative
//! scheduler, looking for safety violations, uncaught faults, liveness
//! monitor violations, and deadlocks. Every run is reproducible: each
//! iteration records its full decision sequence as a [`ScheduleTrace`],
//! and any found bug ships with the trace that replays it exactly.
//!
//! # Core Guarantees
//!
//! - **Determinism**: Same program, same strategy, same seed, same schedule
//! - **Reproducibility**: Every bug report carries a replayable trace
//! - **Fault isolation**: A panicking actor becomes a finding, never a crash
//! - **First bug wins**: At most one bug is reported per iteration
//! - **Termination**: Every iteration ends within the decision depth bound
//!
//! # Module Structure
//!
//! - [`types`]: Core identifiers and status enums
//! - [`event`]: Events with typed payloads
//! - [`actor`]: The actor trait and its runtime context
//! - [`monitor`]: Liveness monitors over broadcast events
//! - [`trace`]: Schedule traces, persistence, replay format
//! - [`strategy`]: Random, priority, and replay decision strategies
//! - [`scheduler`]: Decision loop, runnable tracking, trace capture
//! - [`runtime`]: Per-iteration actor runtime and fault capture
//! - [`engine`]: The iteration loop and replay mode
//! - [`report`]: Mergeable test reports and coverage
//! - [`config`]: Run configuration and validation
//! - [`logging`]: Iteration-scoped program output capture
//! - [`error`]: Bug taxonomy and engine errors
//! - [`util`]: Deterministic RNG
//!
//! # Example
//!
//! ```no_run
//! use actorlab::config::{Config, StrategyKind};
//! use actorlab::engine::TestingEngine;
//! use actorlab::runtime::Runtime;
//!
//! fn setup(rt: &mut Runtime) {
//!     // create actors and enqueue initial events here
//!     let _ = rt;
//! }
//!
//! let config = Config::new(StrategyKind::Random).seed(42).max_iterations(1_000);
//! let engine = TestingEngine::new(config, setup);
//! let report = engine.run().expect("valid configuration");
//! println!("{report}");
//! ```
//!
//! [`ScheduleTrace`]: trace::ScheduleTrace

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod actor;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod monitor;
pub mod report;
pub mod runtime;
pub mod scheduler;
pub mod strategy;
pub mod trace;
pub mod types;
pub mod util;

pub use actor::{Actor, ActorContext};
pub use config::{Config, StrategyKind};
pub use engine::TestingEngine;
pub use error::{Bug, EngineError};
pub use event::Event;
pub use monitor::Monitor;
pub use report::{RunVerdict, TestReport};
pub use runtime::{CancelToken, Runtime};
pub use trace::{Decision, ScheduleTrace};
pub use types::{ActorId, IterationStatus};
