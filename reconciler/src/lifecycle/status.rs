//! Session status mirrored from upstream.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Participants are still joining or declaring personas.
    #[default]
    Waiting,
    /// Turns are being generated.
    Running,
    /// Finished normally.
    Completed,
    /// Could not start or aborted upstream.
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in the `waiting -> running -> terminal` order. Both
    /// terminal states share the top rank.
    pub fn rank(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(self) -> &'static [SessionStatus] {
        match self {
            Self::Waiting => &[Self::Running, Self::Completed, Self::Failed],
            Self::Running => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    /// Whether moving to `next` keeps the status monotonic.
    pub fn can_advance_to(self, next: SessionStatus) -> bool {
        self == next || self.valid_transitions().contains(&next)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "waiting" => Some(Self::Waiting),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
