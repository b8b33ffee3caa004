//! In-progress turns assembled from streamed fragments.

use std::collections::BTreeMap;

use super::types::Draft;

/// At most one draft per turn index, keyed and iterated in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftTracker {
    drafts: BTreeMap<u64, Draft>,
}

impl DraftTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `fragment` to the draft at `turn_index`, creating it if needed.
    ///
    /// A new draft takes `speaker_hint` as its speaker. An existing draft
    /// with an empty speaker adopts the hint; a non-empty speaker is kept.
    pub fn apply_fragment(&mut self, turn_index: u64, speaker_hint: &str, fragment: &str) -> &Draft {
        let draft = self
            .drafts
            .entry(turn_index)
            .or_insert_with(|| Draft::new(turn_index, speaker_hint));

        if draft.speaker_participant_id.is_empty() && !speaker_hint.is_empty() {
            draft.speaker_participant_id = speaker_hint.to_string();
        }
        draft.content.push_str(fragment);
        draft.fragment_count += 1;
        draft
    }

    /// Drop the draft at `turn_index`, returning it if one existed.
    pub fn remove(&mut self, turn_index: u64) -> Option<Draft> {
        self.drafts.remove(&turn_index)
    }

    pub fn get(&self, turn_index: u64) -> Option<&Draft> {
        self.drafts.get(&turn_index)
    }

    pub fn contains(&self, turn_index: u64) -> bool {
        self.drafts.contains_key(&turn_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Draft> {
        self.drafts.values()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
