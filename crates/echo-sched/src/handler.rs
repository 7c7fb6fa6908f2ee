// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scheduling record wrapping one task, doubling as the caller's cancellation token.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::num::NonZeroU64;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use anyhow::anyhow;

use crate::error::TaskFailure;
use crate::task::{Task, TaskContext};
use crate::Tick;

/// Sentinel reported by [`TaskHandle::delay_ticks`] for "eligible immediately".
pub const NO_DELAY: i64 = -1;

/// Sentinel reported by [`TaskHandle::period_ticks`] for a one-shot task.
pub const ONE_SHOT: i64 = -1;

/// Scheduler-assigned identifier, unique within one [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Shared handle to a scheduled task.
///
/// Cloning is cheap; every clone refers to the same record. The scheduler's
/// membership set, its ready queue, any actor binding and the caller all hold
/// clones. Equality is identity.
///
/// State machine:
/// - `cancelled` flips once and never reverts.
/// - `removed` is set when the scheduler drops the handle from its
///   containers (one-shot finished, cancellation reaped, or `cancel_all`).
///
/// A task body that captures its own `TaskHandle` forms a reference cycle and
/// is never freed. Use [`TaskContext::cancel`] to stop from inside the body,
/// or capture a [`WeakTaskHandle`] from [`downgrade`](Self::downgrade).
#[derive(Clone)]
pub struct TaskHandle {
    inner: Rc<HandlerState>,
}

struct HandlerState {
    id: TaskId,
    delay: Option<NonZeroU64>,
    period: Option<NonZeroU64>,
    owner: Option<String>,
    next_run: Cell<Tick>,
    cancelled: Cell<bool>,
    removed: Cell<bool>,
    task: RefCell<Box<dyn Task>>,
}

impl TaskHandle {
    pub(crate) fn new(
        id: TaskId,
        task: Box<dyn Task>,
        delay: Option<NonZeroU64>,
        period: Option<NonZeroU64>,
        owner: Option<String>,
    ) -> Self {
        Self {
            inner: Rc::new(HandlerState {
                id,
                delay,
                period,
                owner,
                next_run: Cell::new(0),
                cancelled: Cell::new(false),
                removed: Cell::new(false),
                task: RefCell::new(task),
            }),
        }
    }

    /// Identifier assigned at admission.
    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    /// Informational owner tag (actor key for bound tasks).
    pub fn owner(&self) -> Option<&str> {
        self.inner.owner.as_deref()
    }

    /// True iff the task was admitted with a positive delay.
    pub fn is_delayed(&self) -> bool {
        self.inner.delay.is_some()
    }

    /// True iff the task repeats with a period of at least one tick.
    pub fn is_repeating(&self) -> bool {
        self.inner.period.is_some()
    }

    /// Normalized delay, or [`NO_DELAY`].
    pub fn delay_ticks(&self) -> i64 {
        self.inner.delay.map_or(NO_DELAY, to_signed)
    }

    /// Normalized period, or [`ONE_SHOT`].
    pub fn period_ticks(&self) -> i64 {
        self.inner.period.map_or(ONE_SHOT, to_signed)
    }

    pub(crate) fn period(&self) -> Option<NonZeroU64> {
        self.inner.period
    }

    pub(crate) fn delay(&self) -> Option<NonZeroU64> {
        self.inner.delay
    }

    /// Tick at which the task is (or was last) due.
    pub fn next_run(&self) -> Tick {
        self.inner.next_run.get()
    }

    /// Sets the next-run tick. Only the scheduler moves a handle, and always
    /// together with a queue insertion.
    pub(crate) fn set_next_run(&self, tick: Tick) {
        self.inner.next_run.set(tick);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }

    /// Whether the scheduler has dropped this handle from its containers.
    pub fn is_removed(&self) -> bool {
        self.inner.removed.get()
    }

    /// Cancels the task. Idempotent.
    ///
    /// The handle stays queued until the next drain reaches it (or
    /// [`Scheduler::cancel_all`](crate::Scheduler::cancel_all)); it never runs
    /// again either way.
    pub fn cancel(&self) {
        self.inner.cancelled.set(true);
    }

    /// Marks the handle finalized without running it.
    pub(crate) fn remove(&self) {
        self.inner.removed.set(true);
    }

    /// Runs the task body once at `tick`.
    ///
    /// Errors and panics from the body are converted into a [`TaskFailure`].
    /// A cancel requested through the [`TaskContext`] is applied even when the
    /// body fails. One-shot handles are marked removed afterwards.
    pub(crate) fn run(&self, tick: Tick) -> Result<(), TaskFailure> {
        let mut ctx = TaskContext::new(self.id(), tick);
        let outcome = match self.inner.task.try_borrow_mut() {
            Ok(mut task) => catch_unwind(AssertUnwindSafe(|| task.run(&mut ctx)))
                .unwrap_or_else(|payload| {
                    Err(anyhow!("task panicked: {}", panic_message(&*payload)))
                }),
            Err(_) => Err(anyhow!("task is already running")),
        };

        if ctx.is_cancel_requested() {
            self.cancel();
        }
        if !self.is_repeating() {
            self.remove();
        }

        outcome.map_err(|err| TaskFailure {
            task: self.id(),
            owner: self.inner.owner.clone(),
            tick,
            message: format!("{err:#}"),
        })
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning reference to this handle.
    pub fn downgrade(&self) -> WeakTaskHandle {
        WeakTaskHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning reference to a [`TaskHandle`]; does not keep the task alive.
#[derive(Debug, Clone, Default)]
pub struct WeakTaskHandle {
    inner: Weak<HandlerState>,
}

impl WeakTaskHandle {
    /// The handle, if anything still holds it.
    pub fn upgrade(&self) -> Option<TaskHandle> {
        self.inner.upgrade().map(|inner| TaskHandle { inner })
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for TaskHandle {}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.inner.id)
            .field("owner", &self.inner.owner)
            .field("delay", &self.delay_ticks())
            .field("period", &self.period_ticks())
            .field("next_run", &self.next_run())
            .field("cancelled", &self.is_cancelled())
            .field("removed", &self.is_removed())
            .finish_non_exhaustive()
    }
}

fn to_signed(ticks: NonZeroU64) -> i64 {
    i64::try_from(ticks.get()).unwrap_or(i64::MAX)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
