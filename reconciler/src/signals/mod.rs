//! Side signals that ride alongside the transcript: per-turn badges, the
//! audience reaction log, and the live phase indicator.

pub mod badges;
pub mod reactions;

pub use badges::{Badge, BadgeBoard};
pub use reactions::{Reaction, ReactionLog, DEFAULT_REACTION_CAPACITY};

use crate::transcript::ArgumentPhase;

/// Live phase indicator. Last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSignal {
    current: Option<ArgumentPhase>,
}

impl PhaseSignal {
    /// Record a phase; returns whether it differed from the previous value.
    pub fn set(&mut self, phase: ArgumentPhase) -> bool {
        let changed = self.current != Some(phase);
        self.current = Some(phase);
        changed
    }

    /// `None` until a phase has been observed.
    pub fn current(&self) -> Option<ArgumentPhase> {
        self.current
    }
}
