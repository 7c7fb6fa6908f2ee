// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scheduler error taxonomy.

use thiserror::Error;

use crate::handler::TaskId;
use crate::Tick;

/// Errors returned by scheduler entry points.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// Scheduling or a heartbeat was attempted while the scheduler is disabled
    /// (paused via `set_enabled(false)` or terminated via `shutdown()`).
    #[error("scheduler is disabled")]
    Disabled,
    /// Re-enabling was attempted after `shutdown()`.
    #[error("scheduler has been shut down")]
    ShutDown,
}

/// A task body that returned an error or panicked during a drain.
///
/// Failures are isolated: the drain that produced one keeps going, and the
/// failure is surfaced in the [`DrainReport`](crate::DrainReport).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{task} failed at tick {tick}: {message}")]
pub struct TaskFailure {
    /// Handle whose body failed.
    pub task: TaskId,
    /// Owner tag of that handle, if any.
    pub owner: Option<String>,
    /// Tick of the drain in which the failure happened.
    pub tick: Tick,
    /// Rendered error chain (or panic message).
    pub message: String,
}
