//! Annotations awarded to individual turns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An annotation attached to a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    /// Badge identifier, e.g. `steelman`.
    pub key: String,
    /// Why it was awarded.
    pub reason: String,
    /// Award confidence reported upstream, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Badge {
    pub fn new(key: &str, reason: &str) -> Self {
        Self {
            key: key.to_string(),
            reason: reason.to_string(),
            confidence: None,
        }
    }
}

/// Badges per turn index in arrival order. Entries are never removed and
/// repeats are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeBoard {
    by_turn: BTreeMap<u64, Vec<Badge>>,
}

impl BadgeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn award(&mut self, turn_index: u64, badge: Badge) {
        self.by_turn.entry(turn_index).or_default().push(badge);
    }

    /// Badges for a turn; empty when none were awarded.
    pub fn for_turn(&self, turn_index: u64) -> &[Badge] {
        self.by_turn
            .get(&turn_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &[Badge])> {
        self.by_turn.iter().map(|(idx, badges)| (*idx, badges.as_slice()))
    }

    /// Total badges across all turns.
    pub fn total(&self) -> usize {
        self.by_turn.values().map(Vec::len).sum()
    }

    pub(crate) fn to_map(&self) -> BTreeMap<u64, Vec<Badge>> {
        self.by_turn.clone()
    }
}
