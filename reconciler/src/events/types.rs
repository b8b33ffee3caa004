//! Typed stream events.
//!
//! A closed set: every raw message either becomes one of these variants or
//! is discarded by the decoder. Unknown kinds map to [`StreamEvent::Ignored`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lifecycle::Completion;
use crate::signals::{Badge, Reaction};
use crate::transcript::ArgumentPhase;

/// Wire names of recognized event kinds.
pub mod kinds {
    pub const TURN_TOKEN: &str = "turn.token";
    pub const TURN_FINAL: &str = "turn.final";
    pub const BADGE_AWARDED: &str = "badge.awarded";
    pub const PHASE_CHANGED: &str = "phase.changed";
    pub const SESSION_META: &str = "session.meta";
    pub const TURN_META: &str = "turn.meta";
    pub const SESSION_COMPLETED: &str = "session.completed";
    pub const ARGUMENT_COMPLETED: &str = "argument.completed";
    pub const REACTION_ADDED: &str = "reaction.added";
    pub const ERROR: &str = "error";
}

/// One decoded live event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A content fragment for an unfinalized turn.
    TurnToken {
        turn_index: u64,
        speaker_participant_id: String,
        token: String,
    },
    /// Authoritative finalization of a turn.
    TurnFinal {
        turn_index: u64,
        turn_id: Option<String>,
        speaker_participant_id: String,
        content: String,
        phase: ArgumentPhase,
    },
    BadgeAwarded {
        turn_index: u64,
        badge: Badge,
    },
    PhaseChanged {
        phase: ArgumentPhase,
    },
    /// Free-text status line (`"thinking"`, `"report_ready"`, ...).
    SessionMeta {
        turn_index: u64,
        state: String,
        speaker_participant_id: Option<String>,
    },
    SessionCompleted {
        completion: Completion,
    },
    ReactionAdded {
        reaction: Reaction,
    },
    /// Upstream reported a session-level failure message.
    SessionError {
        message: String,
    },
    /// Well-formed message of a kind this engine does not know.
    Ignored {
        event_type: String,
    },
}

impl StreamEvent {
    /// Stable kind name, used for stats and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TurnToken { .. } => kinds::TURN_TOKEN,
            Self::TurnFinal { .. } => kinds::TURN_FINAL,
            Self::BadgeAwarded { .. } => kinds::BADGE_AWARDED,
            Self::PhaseChanged { .. } => kinds::PHASE_CHANGED,
            Self::SessionMeta { .. } => kinds::SESSION_META,
            Self::SessionCompleted { .. } => kinds::SESSION_COMPLETED,
            Self::ReactionAdded { .. } => kinds::REACTION_ADDED,
            Self::SessionError { .. } => kinds::ERROR,
            Self::Ignored { .. } => "ignored",
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }
}

/// A decoded event plus its delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Persisted event id. Replayed events repeat it.
    pub id: Option<u64>,
    pub argument_id: Option<String>,
    pub event: StreamEvent,
    /// Upstream timestamp, when present and parseable.
    pub created_at: Option<DateTime<Utc>>,
    /// When the message was decoded locally.
    pub received_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: StreamEvent, received_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            argument_id: None,
            event,
            created_at: None,
            received_at,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Upstream timestamp, falling back to local receipt time.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(self.received_at)
    }
}
