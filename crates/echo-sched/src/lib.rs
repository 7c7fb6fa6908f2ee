// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Echo Scheduler
//!
//! A deterministic tick-based task scheduler. Work is admitted as [`Task`]s,
//! ordered by the logical tick at which it next becomes eligible, and drained
//! once per heartbeat via [`Scheduler::advance`].
//!
//! Ordering invariant:
//! - Eligible tasks run in ascending next-run tick.
//! - Equal ticks run in original scheduling order, including repeating
//!   tasks that have been reinserted.
//! - A task scheduled for a future tick never runs in an earlier drain.
//!
//! The scheduler never owns a clock. The host runtime decides what a tick is
//! and calls [`Scheduler::advance`] with a non-decreasing tick number.
//!
//! [`ActorTaskBinding`] layers "at most one repeating task per actor" on top
//! of the scheduler.
#![forbid(unsafe_code)]

mod binding;
pub mod config;
mod error;
mod handler;
mod ready_queue;
mod scheduler;
mod task;

pub use binding::{ActorIdentity, ActorTaskBinding, DEFAULT_ACTOR_PERIOD};
pub use config::{ConfigError, ConfigService, ConfigStore, SchedulerConfig};
pub use error::{SchedError, TaskFailure};
pub use handler::{TaskHandle, TaskId, WeakTaskHandle, NO_DELAY, ONE_SHOT};
pub use ready_queue::ReadyQueue;
pub use scheduler::{DrainReport, Scheduler};
pub use task::{Task, TaskContext};

/// Discrete logical time unit advanced by the heartbeat driver.
pub type Tick = u64;
