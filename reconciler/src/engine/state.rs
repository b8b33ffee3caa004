//! Owned view state for one session, plus the small value types the
//! reducer writes into it.

use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleController;
use crate::model::ArgumentView;
use crate::signals::{BadgeBoard, PhaseSignal, ReactionLog, DEFAULT_REACTION_CAPACITY};
use crate::transcript::Transcript;

/// Status line shown when the live stream drops.
pub const DISCONNECTED_MESSAGE: &str = "live stream disconnected; refresh to retry";

/// Engine construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reaction log capacity.
    pub reaction_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reaction_capacity: DEFAULT_REACTION_CAPACITY,
        }
    }
}

/// Free-text status shown above the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    pub text: String,
    /// Who the status is about, when the source said.
    pub speaker_participant_id: Option<String>,
}

impl StatusLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speaker_participant_id: None,
        }
    }
}

/// Upstream actions whose outcome is reported back into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Snapshot fetch (initial load or manual refresh).
    Load,
    Join,
    SetPersona,
    Ready,
    Start,
    Invite,
    React,
}

impl std::fmt::Display for SessionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Join => write!(f, "join"),
            Self::SetPersona => write!(f, "set_persona"),
            Self::Ready => write!(f, "ready"),
            Self::Start => write!(f, "start"),
            Self::Invite => write!(f, "invite"),
            Self::React => write!(f, "react"),
        }
    }
}

/// Everything the engine reconciles for one session view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub(crate) transcript: Transcript,
    pub(crate) badges: BadgeBoard,
    pub(crate) reactions: ReactionLog,
    pub(crate) phase: PhaseSignal,
    pub(crate) lifecycle: LifecycleController,
    /// Last known session, from a snapshot, patched by live events.
    pub(crate) session: Option<ArgumentView>,
    pub(crate) status_line: Option<StatusLine>,
    pub(crate) last_error: Option<String>,
}

impl ViewState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            transcript: Transcript::new(),
            badges: BadgeBoard::new(),
            reactions: ReactionLog::with_capacity(config.reaction_capacity),
            phase: PhaseSignal::default(),
            lifecycle: LifecycleController::new(),
            session: None,
            status_line: None,
            last_error: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn badges(&self) -> &BadgeBoard {
        &self.badges
    }

    pub fn reactions(&self) -> &ReactionLog {
        &self.reactions
    }

    pub fn phase(&self) -> &PhaseSignal {
        &self.phase
    }

    pub fn lifecycle(&self) -> &LifecycleController {
        &self.lifecycle
    }

    pub fn session(&self) -> Option<&ArgumentView> {
        self.session.as_ref()
    }

    pub fn status_line(&self) -> Option<&StatusLine> {
        self.status_line.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
