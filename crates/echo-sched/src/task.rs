// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Unit-of-work contract consumed by the scheduler.

use crate::handler::TaskId;
use crate::Tick;

/// A unit of deferred or periodic work.
///
/// Implementations run to completion synchronously inside
/// [`Scheduler::advance`](crate::Scheduler::advance). Returning `Err` (or
/// panicking) fails only this run; the drain continues with the next task.
///
/// Any `FnMut(&mut TaskContext) -> anyhow::Result<()>` closure is a `Task`.
pub trait Task {
    /// Executes one run of the task.
    fn run(&mut self, ctx: &mut TaskContext) -> anyhow::Result<()>;
}

impl<F> Task for F
where
    F: FnMut(&mut TaskContext) -> anyhow::Result<()>,
{
    fn run(&mut self, ctx: &mut TaskContext) -> anyhow::Result<()> {
        self(ctx)
    }
}

/// Per-run view handed to [`Task::run`].
#[derive(Debug)]
pub struct TaskContext {
    task: TaskId,
    tick: Tick,
    cancel_requested: bool,
}

impl TaskContext {
    pub(crate) fn new(task: TaskId, tick: Tick) -> Self {
        Self {
            task,
            tick,
            cancel_requested: false,
        }
    }

    /// Identifier of the handle being run.
    pub fn task_id(&self) -> TaskId {
        self.task
    }

    /// Tick of the heartbeat currently draining.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Cancels the running task. A repeating task is not rescheduled.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    /// Whether [`cancel`](Self::cancel) was called during this run.
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested
    }
}
