//! Transcript types: phases, finalized turns, and in-progress drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::TurnView;

/// Stage of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentPhase {
    /// Participants lay out their stance.
    #[default]
    Opening,
    /// Rebuttals and pressure on each other's points.
    Escalation,
    /// Wind-down toward common ground or a verdict.
    Resolution,
}

impl ArgumentPhase {
    /// Parse a wire name, case-insensitively. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "opening" => Some(Self::Opening),
            "escalation" => Some(Self::Escalation),
            "resolution" => Some(Self::Resolution),
            _ => None,
        }
    }

    /// Wire name of this phase.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::Escalation => "escalation",
            Self::Resolution => "resolution",
        }
    }
}

impl std::fmt::Display for ArgumentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized unit of the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Upstream turn id, when the source supplied one.
    pub id: Option<String>,
    /// Position in the transcript. Unique per session.
    pub turn_index: u64,
    /// Participant who produced the turn.
    pub speaker_participant_id: String,
    /// Phase the turn was spoken in.
    pub phase: ArgumentPhase,
    /// Full text of the turn.
    pub content: String,
    /// Opaque per-turn metrics.
    #[serde(default)]
    pub metrics: Map<String, Value>,
    /// Opaque model metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// When the turn was finalized.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Build a turn from a live finalization (no id, metrics, or metadata).
    pub fn finalized(
        turn_index: u64,
        speaker_participant_id: &str,
        content: &str,
        phase: ArgumentPhase,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            turn_index,
            speaker_participant_id: speaker_participant_id.to_string(),
            phase,
            content: content.to_string(),
            metrics: Map::new(),
            metadata: Map::new(),
            created_at,
        }
    }

    /// Attach an upstream turn id.
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Overwrite this turn with a later finalization of the same index.
    ///
    /// Speaker, phase, content, and timestamp always take the incoming
    /// values. Id, metrics, and metadata are only replaced when the
    /// incoming turn carries them.
    pub fn absorb(&mut self, incoming: Turn) {
        debug_assert_eq!(self.turn_index, incoming.turn_index);
        self.speaker_participant_id = incoming.speaker_participant_id;
        self.phase = incoming.phase;
        self.content = incoming.content;
        self.created_at = incoming.created_at;
        if incoming.id.is_some() {
            self.id = incoming.id;
        }
        if !incoming.metrics.is_empty() {
            self.metrics = incoming.metrics;
        }
        if !incoming.metadata.is_empty() {
            self.metadata = incoming.metadata;
        }
    }
}

impl From<TurnView> for Turn {
    fn from(view: TurnView) -> Self {
        Self {
            id: Some(view.id),
            turn_index: view.turn_index,
            speaker_participant_id: view.speaker_participant_id,
            phase: view.phase,
            content: view.content,
            metrics: view.metrics,
            metadata: view.model_metadata,
            created_at: view.created_at,
        }
    }
}

/// A turn still being assembled from streamed fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub turn_index: u64,
    /// May start empty and be back-filled by a later fragment.
    pub speaker_participant_id: String,
    /// Concatenation of fragments in arrival order.
    pub content: String,
    /// Number of fragments applied.
    pub fragment_count: u32,
}

impl Draft {
    pub(crate) fn new(turn_index: u64, speaker_participant_id: &str) -> Self {
        Self {
            turn_index,
            speaker_participant_id: speaker_participant_id.to_string(),
            content: String::new(),
            fragment_count: 0,
        }
    }
}
