// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Task doubles that record what ran, and when.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::bail;
use echo_sched::{Task, TaskContext, TaskId, Tick};

/// One recorded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Label given to the task double.
    pub label: String,
    /// Handle that ran.
    pub task: TaskId,
    /// Tick of the drain.
    pub tick: Tick,
}

/// Shared, append-only log of executions across many task doubles.
///
/// Clones share the same log, so tests hand one clone to each task and keep
/// one to assert on.
///
/// # Example
///
/// ```
/// use echo_dry_tests::{ExecutionLog, RecordingTask};
/// use echo_sched::Scheduler;
///
/// let log = ExecutionLog::new();
/// let mut sched = Scheduler::new();
/// sched.schedule_now(RecordingTask::new("a", &log)).unwrap();
/// sched.advance(3).unwrap();
/// assert_eq!(log.labels(), vec!["a"]);
/// assert_eq!(log.ticks_for("a"), vec![3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Rc<RefCell<Vec<Execution>>>,
}

impl ExecutionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, label: &str, ctx: &TaskContext) {
        self.inner.borrow_mut().push(Execution {
            label: label.to_owned(),
            task: ctx.task_id(),
            tick: ctx.tick(),
        });
    }

    /// Every execution, in run order.
    pub fn entries(&self) -> Vec<Execution> {
        self.inner.borrow().clone()
    }

    /// Labels in run order.
    pub fn labels(&self) -> Vec<String> {
        self.inner.borrow().iter().map(|e| e.label.clone()).collect()
    }

    /// `(label, tick)` pairs in run order.
    pub fn timeline(&self) -> Vec<(String, Tick)> {
        self.inner
            .borrow()
            .iter()
            .map(|e| (e.label.clone(), e.tick))
            .collect()
    }

    /// Ticks at which `label` ran.
    pub fn ticks_for(&self, label: &str) -> Vec<Tick> {
        self.inner
            .borrow()
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.tick)
            .collect()
    }

    /// Number of runs of `label`.
    pub fn count(&self, label: &str) -> usize {
        self.inner.borrow().iter().filter(|e| e.label == label).count()
    }

    /// Total number of runs.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether nothing ran.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Forget every entry.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }
}

/// Records every run into an [`ExecutionLog`] and succeeds.
#[derive(Debug, Clone)]
pub struct RecordingTask {
    label: String,
    log: ExecutionLog,
}

impl RecordingTask {
    /// Task labelled `label` writing into `log`.
    pub fn new(label: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
        }
    }
}

impl Task for RecordingTask {
    fn run(&mut self, ctx: &mut TaskContext) -> anyhow::Result<()> {
        self.log.push(&self.label, ctx);
        Ok(())
    }
}

/// Records the run, then returns an error.
#[derive(Debug, Clone)]
pub struct FailingTask {
    label: String,
    log: ExecutionLog,
}

impl FailingTask {
    /// Task labelled `label` writing into `log`.
    pub fn new(label: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
        }
    }
}

impl Task for FailingTask {
    fn run(&mut self, ctx: &mut TaskContext) -> anyhow::Result<()> {
        self.log.push(&self.label, ctx);
        bail!("{} failed on purpose", self.label)
    }
}

/// Records the run, then panics.
#[derive(Debug, Clone)]
pub struct PanickingTask {
    label: String,
    log: ExecutionLog,
}

impl PanickingTask {
    /// Task labelled `label` writing into `log`.
    pub fn new(label: impl Into<String>, log: &ExecutionLog) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
        }
    }
}

impl Task for PanickingTask {
    #[allow(clippy::panic)]
    fn run(&mut self, ctx: &mut TaskContext) -> anyhow::Result<()> {
        self.log.push(&self.label, ctx);
        panic!("{} panicked on purpose", self.label);
    }
}

/// Records each run and cancels itself after `runs` of them.
#[derive(Debug, Clone)]
pub struct CancelAfter {
    label: String,
    log: ExecutionLog,
    remaining: usize,
}

impl CancelAfter {
    /// Task labelled `label` that cancels itself on its `runs`-th run.
    pub fn new(label: impl Into<String>, log: &ExecutionLog, runs: usize) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
            remaining: runs,
        }
    }
}

impl Task for CancelAfter {
    fn run(&mut self, ctx: &mut TaskContext) -> anyhow::Result<()> {
        self.log.push(&self.label, ctx);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            ctx.cancel();
        }
        Ok(())
    }
}
