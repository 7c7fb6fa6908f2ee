// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Min-tick-first ready queue with admission-order tie-break.
//!
//! Ordering invariant:
//! - Entries pop in ascending `(tick, id)`.
//! - Task ids are assigned in admission order, so equal ticks drain in the
//!   order the tasks were originally scheduled, even after a repeating task
//!   has been reinserted. Identical input sequences always drain identically.
//!
//! The queue never deletes arbitrary entries. Cancelled handles stay in place
//! until they surface at the head and the scheduler discards them.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::handler::{TaskHandle, TaskId};
use crate::Tick;

struct QueueEntry {
    tick: Tick,
    handle: TaskHandle,
}

impl QueueEntry {
    fn key(&self) -> (Tick, TaskId) {
        (self.tick, self.handle.id())
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // BinaryHeap is a max-heap; invert so the smallest (tick, id) is on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Priority queue of task handles keyed by next-run tick.
#[derive(Default)]
pub struct ReadyQueue {
    heap: BinaryHeap<QueueEntry>,
}

impl ReadyQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `handle` with priority `tick`. At equal ticks, handles
    /// admitted earlier pop first regardless of when they were inserted.
    pub fn insert(&mut self, handle: TaskHandle, tick: Tick) {
        self.heap.push(QueueEntry { tick, handle });
    }

    /// Returns the earliest handle without removing it.
    pub fn peek_min(&self) -> Option<&TaskHandle> {
        self.heap.peek().map(|e| &e.handle)
    }

    /// Returns the priority tick of the earliest handle.
    pub fn peek_tick(&self) -> Option<Tick> {
        self.heap.peek().map(|e| e.tick)
    }

    /// Removes and returns the earliest handle.
    pub fn extract_min(&mut self) -> Option<TaskHandle> {
        self.heap.pop().map(|e| e.handle)
    }

    /// Whether the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of entries, including cancelled handles not yet reaped.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Drops every entry and returns how many there were.
    pub fn drain_all(&mut self) -> usize {
        let n = self.heap.len();
        self.heap.clear();
        n
    }
}

impl std::fmt::Debug for ReadyQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyQueue")
            .field("len", &self.heap.len())
            .field("next_tick", &self.peek_tick())
            .finish()
    }
}
