//! Upstream API data model.
//!
//! Serde types for the collaborator API's request/response bodies. The
//! engine consumes [`SessionSnapshot`] and [`ReportView`]; the remaining
//! types are carried for the action calls made by the session view.

pub mod argument;
pub mod report;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transcript::ArgumentPhase;

pub use argument::{
    Ack, ArgumentControls, ArgumentListItem, ArgumentShape, ArgumentView,
    CreateArgumentRequest, CreateInviteRequest, EvidenceMode, Guardrails, InviteRole,
    InviteView, JoinRequest, JoinResponse, MyArgumentsResponse, PaceMode, Participant,
    PersonaSnapshot, ReactionRequest, StartArgumentRequest, StartResponse, StartStatus,
    WinCondition,
};
pub use report::{ReportView, WrappedReport};

/// A persisted turn as returned by the turn-history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnView {
    pub id: String,
    pub turn_index: u64,
    pub speaker_participant_id: String,
    pub phase: ArgumentPhase,
    pub content: String,
    #[serde(default)]
    pub metrics: Map<String, Value>,
    #[serde(default)]
    pub model_metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Turn-history endpoint body. `events` is the persisted event log, kept
/// opaque.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnBundle {
    #[serde(default)]
    pub turns: Vec<TurnView>,
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Out-of-band view of a session: the argument plus whatever turn history
/// was fetched with it. A refresh after an action carries no turns.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub argument: ArgumentView,
    pub turns: Vec<TurnView>,
}

impl SessionSnapshot {
    pub fn new(argument: ArgumentView, turns: Vec<TurnView>) -> Self {
        Self { argument, turns }
    }

    /// Snapshot of the argument alone.
    pub fn argument_only(argument: ArgumentView) -> Self {
        Self {
            argument,
            turns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_bundle_deserializes() {
        let json = r#"{
            "turns": [{
                "id": "t-1",
                "turn_index": 1,
                "speaker_participant_id": "p1",
                "phase": "opening",
                "content": "Opening salvo",
                "metrics": {"is_new_claim": true},
                "model_metadata": {"provider": "template_llm"},
                "created_at": "2025-03-01T12:02:00+00:00"
            }],
            "events": [{"id": 1, "event_type": "phase.changed"}]
        }"#;
        let bundle: TurnBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.turns.len(), 1);
        assert_eq!(bundle.turns[0].metrics["is_new_claim"], Value::Bool(true));
        assert_eq!(bundle.events.len(), 1);
    }
}
