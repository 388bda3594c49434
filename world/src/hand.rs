//! The player's held hand of chips.

use std::collections::VecDeque;

use pokershot_core::HAND_SIZE;

/// Up to [`HAND_SIZE`] held items, evicted oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct Hand<T> {
    held: VecDeque<T>,
}

impl<T> Hand<T> {
    /// Creates an empty hand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            held: VecDeque::with_capacity(HAND_SIZE),
        }
    }

    /// Adds an item, returning the oldest one if the hand was already full.
    pub fn add(&mut self, item: T) -> Option<T> {
        let discarded = if self.held.len() >= HAND_SIZE {
            self.held.pop_front()
        } else {
            None
        };
        self.held.push_back(item);
        discarded
    }

    /// Empties the hand, yielding everything it held from oldest to newest.
    pub fn clear(&mut self) -> Vec<T> {
        self.held.drain(..).collect()
    }

    /// Iterates the held items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.held.iter()
    }

    /// Number of held items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Reports whether nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Reports whether the next addition will evict.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.held.len() >= HAND_SIZE
    }
}

impl<T> Default for Hand<T> {
    fn default() -> Self {
        Self::new()
    }
}
