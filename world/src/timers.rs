//! Deferred actions keyed by the entity that scheduled them.

use std::{collections::BTreeMap, time::Duration};

/// Entity a deferred action belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerOwner {
    /// A player lifecycle, identified by its spawn generation.
    Player(u32),
}

/// Work performed when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerAction {
    /// Divides the owner's damage multiplier by the factor again.
    RevertDamageBoost {
        /// Factor that was applied.
        multiplier: f32,
    },
}

/// Fired timer handed back by [`TimerQueue::drain_due`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DueTimer {
    /// Entity the timer belongs to.
    pub owner: TimerOwner,
    /// Work to perform.
    pub action: TimerAction,
}

/// Time-ordered queue of cancellable deferred actions.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: BTreeMap<(Duration, u64), DueTimer>,
    next_sequence: u64,
}

impl TimerQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to fire at simulation time `due`.
    pub fn schedule(&mut self, owner: TimerOwner, due: Duration, action: TimerAction) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self
            .entries
            .insert((due, sequence), DueTimer { owner, action });
    }

    /// Drops every pending timer of the owner, returning how many were
    /// cancelled.
    pub fn cancel_owner(&mut self, owner: TimerOwner) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, timer| timer.owner != owner);
        before - self.entries.len()
    }

    /// Removes and returns every timer due at or before `now`, earliest
    /// first.
    pub fn drain_due(&mut self, now: Duration) -> Vec<DueTimer> {
        let pending = self.entries.split_off(&(now, u64::MAX));
        let due = std::mem::replace(&mut self.entries, pending);
        due.into_values().collect()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
