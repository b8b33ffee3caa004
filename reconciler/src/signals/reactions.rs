//! Bounded, newest-first log of audience reactions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Capacity used when none is configured.
pub const DEFAULT_REACTION_CAPACITY: usize = 12;

/// An audience reaction, optionally aimed at a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub turn_index: Option<u64>,
}

impl Reaction {
    pub fn new(emoji: &str, turn_index: Option<u64>) -> Self {
        Self {
            emoji: emoji.to_string(),
            turn_index,
        }
    }
}

/// Most-recent-first log with a fixed capacity. The oldest entry is evicted
/// on overflow; identical reactions are all kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionLog {
    entries: VecDeque<Reaction>,
    capacity: usize,
}

impl ReactionLog {
    /// Capacity is clamped to at least one entry.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, reaction: Reaction) {
        self.entries.push_front(reaction);
        self.entries.truncate(self.capacity);
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Reaction> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&Reaction> {
        self.entries.front()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ReactionLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REACTION_CAPACITY)
    }
}
