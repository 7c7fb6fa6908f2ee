// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! At most one repeating task per actor.
//!
//! A binding is only trusted while its handle is live (neither cancelled nor
//! removed). Handles cancelled behind the table's back, e.g. by
//! [`Scheduler::cancel_all`] or by the task itself, read as unbound and are
//! replaced by the next [`ActorTaskBinding::bind`].

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use tracing::debug;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::error::SchedError;
use crate::handler::{TaskHandle, NO_DELAY};
use crate::scheduler::Scheduler;
use crate::task::Task;

/// Default repeat interval for bound actor tasks, in ticks.
pub const DEFAULT_ACTOR_PERIOD: i64 = 20;

/// Anything that can name an actor with a unique, stable key.
pub trait ActorIdentity {
    /// Map key for the actor.
    type Key: Eq + Hash + Clone + fmt::Display;

    /// Returns the actor's key. Must be stable for the actor's lifetime.
    fn actor_key(&self) -> Self::Key;
}

impl ActorIdentity for Uuid {
    type Key = Self;

    fn actor_key(&self) -> Self {
        *self
    }
}

impl ActorIdentity for String {
    type Key = Self;

    fn actor_key(&self) -> Self {
        self.clone()
    }
}

impl ActorIdentity for str {
    type Key = String;

    fn actor_key(&self) -> String {
        self.to_owned()
    }
}

/// Actor key → the single repeating task scheduled for that actor.
#[derive(Debug)]
pub struct ActorTaskBinding<K> {
    bindings: FxHashMap<K, TaskHandle>,
    period: i64,
}

impl<K> Default for ActorTaskBinding<K> {
    fn default() -> Self {
        Self::with_period(DEFAULT_ACTOR_PERIOD)
    }
}

impl<K> ActorTaskBinding<K> {
    /// Empty table using [`DEFAULT_ACTOR_PERIOD`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table whose [`bind`](Self::bind) uses `period`.
    pub fn with_period(period: i64) -> Self {
        Self {
            bindings: FxHashMap::default(),
            period,
        }
    }

    /// Empty table using `config.actor_period_ticks`.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::with_period(config.actor_period_ticks)
    }

    /// Period used by [`bind`](Self::bind).
    pub fn default_period(&self) -> i64 {
        self.period
    }
}

impl<K> ActorTaskBinding<K>
where
    K: Eq + Hash + Clone + fmt::Display,
{
    /// Whether `actor` has a live bound task.
    pub fn is_bound_for<A>(&self, actor: &A) -> bool
    where
        A: ActorIdentity<Key = K> + ?Sized,
    {
        self.handle_for(actor).is_some()
    }

    /// Live handle bound to `actor`, if any.
    pub fn handle_for<A>(&self, actor: &A) -> Option<TaskHandle>
    where
        A: ActorIdentity<Key = K> + ?Sized,
    {
        self.bindings
            .get(&actor.actor_key())
            .filter(|h| is_live(h))
            .cloned()
    }

    /// Binds `task` to `actor` with the table's default period.
    ///
    /// If `actor` already has a live binding, that handle is returned
    /// unchanged and `task` is dropped without being scheduled.
    pub fn bind<A>(
        &mut self,
        scheduler: &mut Scheduler,
        actor: &A,
        task: impl Task + 'static,
    ) -> Result<TaskHandle, SchedError>
    where
        A: ActorIdentity<Key = K> + ?Sized,
    {
        self.bind_with_period(scheduler, actor, task, self.period)
    }

    /// As [`bind`](Self::bind) with an explicit period. The period only
    /// applies when a new task is actually scheduled.
    pub fn bind_with_period<A>(
        &mut self,
        scheduler: &mut Scheduler,
        actor: &A,
        task: impl Task + 'static,
        period: i64,
    ) -> Result<TaskHandle, SchedError>
    where
        A: ActorIdentity<Key = K> + ?Sized,
    {
        let key = actor.actor_key();
        if let Some(existing) = self.bindings.get(&key).filter(|h| is_live(h)) {
            return Ok(existing.clone());
        }

        let handle = scheduler.schedule_owned(key.to_string(), task, NO_DELAY, period)?;
        debug!(actor = %key, task = %handle.id(), "actor task bound");
        self.bindings.insert(key, handle.clone());
        Ok(handle)
    }

    /// Cancels and forgets the task bound to `actor`. Returns whether a
    /// mapping existed.
    pub fn unbind<A>(&mut self, actor: &A) -> bool
    where
        A: ActorIdentity<Key = K> + ?Sized,
    {
        let key = actor.actor_key();
        match self.bindings.remove(&key) {
            Some(handle) => {
                handle.cancel();
                debug!(actor = %key, task = %handle.id(), "actor task unbound");
                true
            }
            None => false,
        }
    }

    /// Drops mappings whose handles are no longer live. Returns how many.
    pub fn prune(&mut self) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, h| is_live(h));
        before - self.bindings.len()
    }

    /// Cancels every bound task and empties the table.
    pub fn clear(&mut self) {
        for (_, handle) in self.bindings.drain() {
            handle.cancel();
        }
    }

    /// Number of actors with a live binding.
    pub fn len(&self) -> usize {
        self.bindings.values().filter(|h| is_live(h)).count()
    }

    /// Whether no actor has a live binding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_live(handle: &TaskHandle) -> bool {
    !handle.is_cancelled() && !handle.is_removed()
}
