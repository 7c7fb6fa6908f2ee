// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Heartbeat-driven scheduler: admission, drain, cancellation.
//!
//! Every live handle is both a member (keyed by [`TaskId`]) and queued,
//! except while its body is executing inside [`Scheduler::advance`].
//! Cancellation is lazy: a cancelled handle keeps its queue entry until it
//! reaches the head of the queue, where the drain discards it.

use std::num::NonZeroU64;

use rustc_hash::FxHashMap;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SchedulerConfig;
use crate::error::{SchedError, TaskFailure};
use crate::handler::{TaskHandle, TaskId};
use crate::ready_queue::ReadyQueue;
use crate::task::Task;
use crate::Tick;

/// Outcome of one [`Scheduler::advance`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Tick the drain ran at.
    pub tick: Tick,
    /// Task bodies invoked (including those that failed).
    pub executed: usize,
    /// Repeating handles re-queued for a later tick.
    pub rescheduled: usize,
    /// Handles finalized after running (one-shots, or repeats cancelled mid-run).
    pub completed: usize,
    /// Cancelled handles discarded without running.
    pub reaped: usize,
    /// Bodies that returned an error or panicked.
    pub failures: Vec<TaskFailure>,
}

impl DrainReport {
    /// True when nothing was due.
    pub fn is_idle(&self) -> bool {
        self.executed == 0 && self.reaped == 0
    }
}

/// Single-threaded tick scheduler.
///
/// Construct one per owning runtime and pass it to whatever needs to
/// schedule work. All methods take `&mut self` or `&self`; there is no
/// interior locking.
#[derive(Debug)]
pub struct Scheduler {
    enabled: bool,
    shut_down: bool,
    current_tick: Tick,
    next_id: u64,
    members: FxHashMap<TaskId, TaskHandle>,
    queue: ReadyQueue,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates an enabled scheduler at tick 0.
    pub fn new() -> Self {
        Self {
            enabled: true,
            shut_down: false,
            current_tick: 0,
            next_id: 1,
            members: FxHashMap::default(),
            queue: ReadyQueue::new(),
        }
    }

    /// Creates a scheduler honouring `config.start_enabled`.
    pub fn with_config(config: &SchedulerConfig) -> Self {
        let mut sched = Self::new();
        sched.enabled = config.start_enabled;
        sched
    }

    /// Runs `task` once, at the next heartbeat.
    pub fn schedule_now(&mut self, task: impl Task + 'static) -> Result<TaskHandle, SchedError> {
        self.admit(Box::new(task), -1, -1, None)
    }

    /// Runs `task` once, `delay` ticks from now. `delay <= 0` means immediately.
    pub fn schedule_delayed(
        &mut self,
        task: impl Task + 'static,
        delay: i64,
    ) -> Result<TaskHandle, SchedError> {
        self.admit(Box::new(task), delay, -1, None)
    }

    /// Runs `task` at the next heartbeat and then every `period` ticks.
    ///
    /// A period of 0 is treated as 1; a negative period makes the task one-shot.
    pub fn schedule_repeating(
        &mut self,
        task: impl Task + 'static,
        period: i64,
    ) -> Result<TaskHandle, SchedError> {
        self.admit(Box::new(task), -1, period, None)
    }

    /// Runs `task` after `delay` ticks and then every `period` ticks.
    pub fn schedule_delayed_repeating(
        &mut self,
        task: impl Task + 'static,
        delay: i64,
        period: i64,
    ) -> Result<TaskHandle, SchedError> {
        self.admit(Box::new(task), delay, period, None)
    }

    /// General form of the `schedule_*` entry points carrying an owner tag.
    pub fn schedule_owned(
        &mut self,
        owner: impl Into<String>,
        task: impl Task + 'static,
        delay: i64,
        period: i64,
    ) -> Result<TaskHandle, SchedError> {
        self.admit(Box::new(task), delay, period, Some(owner.into()))
    }

    fn admit(
        &mut self,
        task: Box<dyn Task>,
        delay: i64,
        period: i64,
        owner: Option<String>,
    ) -> Result<TaskHandle, SchedError> {
        self.ensure_enabled()?;

        let id = TaskId::from_raw(self.next_id);
        self.next_id += 1;
        let handle = TaskHandle::new(
            id,
            task,
            normalize_delay(delay),
            normalize_period(period),
            owner,
        );
        let next_run = handle
            .delay()
            .map_or(self.current_tick, |d| self.current_tick.saturating_add(d.get()));
        handle.set_next_run(next_run);

        self.members.insert(id, handle.clone());
        self.queue.insert(handle.clone(), next_run);
        debug!(
            task = %id,
            owner = handle.owner(),
            next_run,
            period = handle.period_ticks(),
            "task admitted"
        );
        Ok(handle)
    }

    /// Heartbeat: drains every handle due at or before `tick`.
    ///
    /// Handles run in `(next_run, admission)` order. A repeating handle that
    /// is still live after running is re-queued `period` ticks after `tick`,
    /// so it cannot run twice in one drain. Task failures are isolated and
    /// reported; they never abort the drain.
    ///
    /// A `tick` lower than the current tick does not move time backwards;
    /// the drain runs at the current tick instead.
    #[instrument(level = "trace", skip(self))]
    pub fn advance(&mut self, tick: Tick) -> Result<DrainReport, SchedError> {
        self.ensure_enabled()?;

        if tick < self.current_tick {
            warn!(
                tick,
                current = self.current_tick,
                "heartbeat tick went backwards; holding current tick"
            );
        } else {
            self.current_tick = tick;
        }
        let now = self.current_tick;

        let mut report = DrainReport {
            tick: now,
            ..DrainReport::default()
        };

        while self.queue.peek_tick().is_some_and(|due| due <= now) {
            let Some(handle) = self.queue.extract_min() else {
                break;
            };

            if handle.is_cancelled() {
                debug!(task = %handle.id(), "reaped cancelled task");
                self.retire(&handle);
                report.reaped += 1;
                continue;
            }

            report.executed += 1;
            if let Err(failure) = handle.run(now) {
                error!(
                    task = %failure.task,
                    owner = failure.owner.as_deref(),
                    tick = failure.tick,
                    "task failed: {}",
                    failure.message
                );
                report.failures.push(failure);
            }

            match self.next_run_after(&handle, now) {
                Some(next) => {
                    handle.set_next_run(next);
                    self.queue.insert(handle, next);
                    report.rescheduled += 1;
                }
                None => {
                    self.retire(&handle);
                    report.completed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Next tick for a handle that just ran, or `None` when it is finished.
    fn next_run_after(&self, handle: &TaskHandle, now: Tick) -> Option<Tick> {
        if handle.is_cancelled() {
            return None;
        }
        let period = handle.period()?;
        let next = now.checked_add(period.get());
        if next.is_none() {
            warn!(task = %handle.id(), "tick space exhausted; retiring repeating task");
        }
        next
    }

    fn retire(&mut self, handle: &TaskHandle) {
        handle.remove();
        self.members.remove(&handle.id());
    }

    /// Same as [`TaskHandle::cancel`]. The handle is reaped on the next drain
    /// that reaches its tick.
    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
        debug!(task = %handle.id(), tick = self.current_tick, "task cancelled");
    }

    /// Cancels every member and empties both containers. Returns the number
    /// of handles cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.members.len();
        for (_, handle) in self.members.drain() {
            handle.cancel();
            handle.remove();
        }
        self.queue.drain_all();
        if n > 0 {
            debug!(cancelled = n, "cancelled all tasks");
        }
        n
    }

    /// Disables the scheduler permanently and cancels everything.
    pub fn shutdown(&mut self) {
        self.enabled = false;
        self.shut_down = true;
        let cancelled = self.cancel_all();
        info!(tick = self.current_tick, cancelled, "scheduler shut down");
    }

    /// Pauses (`false`) or resumes (`true`) admission and heartbeats.
    ///
    /// Pending tasks are kept while paused. Resuming after
    /// [`shutdown`](Self::shutdown) fails with [`SchedError::ShutDown`].
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), SchedError> {
        if enabled && self.shut_down {
            return Err(SchedError::ShutDown);
        }
        if self.enabled != enabled {
            info!(enabled, "scheduler enabled state changed");
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Membership test.
    pub fn is_queued(&self, handle: &TaskHandle) -> bool {
        self.members
            .get(&handle.id())
            .is_some_and(|member| member.same_as(handle))
    }

    /// Whether admission and heartbeats are accepted.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Last tick observed by [`advance`](Self::advance).
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Number of member handles, including cancelled ones not yet reaped.
    pub fn pending_len(&self) -> usize {
        self.members.len()
    }

    /// Earliest queued tick, if anything is queued.
    pub fn next_due_tick(&self) -> Option<Tick> {
        self.queue.peek_tick()
    }

    fn ensure_enabled(&self) -> Result<(), SchedError> {
        if self.enabled {
            Ok(())
        } else {
            Err(SchedError::Disabled)
        }
    }
}

/// `delay <= 0` means "run immediately".
fn normalize_delay(delay: i64) -> Option<NonZeroU64> {
    u64::try_from(delay).ok().and_then(NonZeroU64::new)
}

/// `period <= -1` is one-shot, `0` is promoted to `1`, anything else is kept.
fn normalize_period(period: i64) -> Option<NonZeroU64> {
    u64::try_from(period)
        .ok()
        .map(|p| NonZeroU64::new(p).unwrap_or(NonZeroU64::MIN))
}
