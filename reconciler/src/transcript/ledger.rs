//! Ordered, deduplicated record of finalized turns.

use serde::Serialize;

use super::types::Turn;

/// What an upsert did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No turn existed at the index; one was inserted in order.
    Inserted,
    /// A turn at the index was overwritten in place.
    Replaced,
}

/// Finalized turns, kept sorted ascending by `turn_index` with at most one
/// turn per index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnLedger {
    turns: Vec<Turn>,
}

impl TurnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the turn at `turn.turn_index` (last write wins).
    ///
    /// Inserts land at their sorted position, so turns at other indices
    /// keep their relative order.
    pub fn upsert(&mut self, turn: Turn) -> Upsert {
        match self
            .turns
            .binary_search_by_key(&turn.turn_index, |existing| existing.turn_index)
        {
            Ok(pos) => {
                self.turns[pos].absorb(turn);
                Upsert::Replaced
            }
            Err(pos) => {
                self.turns.insert(pos, turn);
                Upsert::Inserted
            }
        }
    }

    pub fn get(&self, turn_index: u64) -> Option<&Turn> {
        self.turns
            .binary_search_by_key(&turn_index, |t| t.turn_index)
            .ok()
            .map(|pos| &self.turns[pos])
    }

    pub fn contains(&self, turn_index: u64) -> bool {
        self.get(turn_index).is_some()
    }

    /// Turns in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn as_slice(&self) -> &[Turn] {
        &self.turns
    }

    /// Indices in ascending order.
    pub fn indices(&self) -> Vec<u64> {
        self.turns.iter().map(|t| t.turn_index).collect()
    }

    /// Highest finalized index, if any.
    pub fn last_index(&self) -> Option<u64> {
        self.turns.last().map(|t| t.turn_index)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
