//! Finalized turns plus in-flight drafts.
//!
//! The ledger and the draft tracker coordinate through [`Transcript`]:
//!
//! ```text
//! turn.token ──▶ DraftTracker::apply_fragment   (skipped if index is final)
//! turn.final ──▶ DraftTracker::remove ──▶ TurnLedger::upsert
//! ```
//!
//! A draft and a finalized turn never exist for the same index at once.

pub mod drafts;
pub mod ledger;
pub mod types;

use tracing::debug;

pub use drafts::DraftTracker;
pub use ledger::{TurnLedger, Upsert};
pub use types::{ArgumentPhase, Draft, Turn};

/// Result of applying a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// First fragment for the index; a draft was opened.
    Opened,
    /// Appended to an existing draft.
    Appended,
    /// The index is already finalized; the fragment was dropped.
    AlreadyFinal,
}

/// Ledger and drafts for one session view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    ledger: TurnLedger,
    drafts: DraftTracker,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a streamed fragment into the draft at `turn_index`.
    pub fn apply_fragment(
        &mut self,
        turn_index: u64,
        speaker_hint: &str,
        fragment: &str,
    ) -> FragmentOutcome {
        if self.ledger.contains(turn_index) {
            debug!(turn_index, "dropping fragment for finalized turn");
            return FragmentOutcome::AlreadyFinal;
        }
        let opened = !self.drafts.contains(turn_index);
        self.drafts.apply_fragment(turn_index, speaker_hint, fragment);
        if opened {
            FragmentOutcome::Opened
        } else {
            FragmentOutcome::Appended
        }
    }

    /// Finalize a turn: remove any draft at its index and upsert the ledger.
    ///
    /// Succeeds whether or not a draft existed; the turn is self-sufficient.
    pub fn finalize(&mut self, turn: Turn) -> Upsert {
        let turn_index = turn.turn_index;
        if let Some(draft) = self.drafts.remove(turn_index) {
            debug!(
                turn_index,
                fragments = draft.fragment_count,
                "draft superseded by finalization"
            );
        }
        self.ledger.upsert(turn)
    }

    pub fn ledger(&self) -> &TurnLedger {
        &self.ledger
    }

    pub fn drafts(&self) -> &DraftTracker {
        &self.drafts
    }
}
