//! Raw message decoding.
//!
//! Permissive by policy: missing fields are coerced to defaults so a
//! degraded event still renders. A message is discarded only when it is
//! not a JSON object, has no `event_type`, or carries a value that cannot
//! be coerced (a negative turn index, an unknown phase on `phase.changed`).
//! Nothing here is fatal to the stream.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{kinds, Envelope, StreamEvent};
use crate::lifecycle::Completion;
use crate::signals::{Badge, Reaction};
use crate::transcript::ArgumentPhase;

const DEFAULT_BADGE_KEY: &str = "badge";
const DEFAULT_REACTION_EMOJI: &str = "🔥";
const DEFAULT_ERROR_MESSAGE: &str = "upstream reported an error";

/// Why a message was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("missing or non-string event_type")]
    MissingEventType,

    #[error("invalid turn_index: {value}")]
    InvalidTurnIndex { value: String },

    #[error("invalid phase: {value:?}")]
    InvalidPhase { value: String },
}

/// Outcome of decoding one raw message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(Envelope),
    Discard(DecodeError),
}

impl Decoded {
    pub fn into_result(self) -> Result<Envelope, DecodeError> {
        match self {
            Self::Event(envelope) => Ok(envelope),
            Self::Discard(err) => Err(err),
        }
    }
}

/// Decode one raw stream message. `received_at` stamps the envelope so
/// downstream reduction stays clock-free.
pub fn decode(raw: &str, received_at: DateTime<Utc>) -> Decoded {
    match decode_inner(raw, received_at) {
        Ok(envelope) => Decoded::Event(envelope),
        Err(err) => Decoded::Discard(err),
    }
}

fn decode_inner(raw: &str, received_at: DateTime<Utc>) -> Result<Envelope, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    let Value::Object(message) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let event_type = message
        .get("event_type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingEventType)?;

    let empty = Map::new();
    let payload = match message.get("payload") {
        Some(Value::Object(payload)) => payload,
        _ => &empty,
    };
    let envelope_index = message.get("turn_index");

    let event = match event_type {
        kinds::TURN_TOKEN => StreamEvent::TurnToken {
            turn_index: coerce_index(envelope_index)?,
            speaker_participant_id: string_field(payload, "speaker_participant_id"),
            token: string_field(payload, "token"),
        },
        kinds::TURN_FINAL => StreamEvent::TurnFinal {
            turn_index: coerce_index(envelope_index)?,
            turn_id: optional_string(payload, "turn_id"),
            speaker_participant_id: string_field(payload, "speaker_participant_id"),
            content: string_field(payload, "content"),
            phase: ArgumentPhase::parse(&string_field(payload, "phase")).unwrap_or_default(),
        },
        kinds::BADGE_AWARDED => {
            let key = optional_string(payload, "badge_key")
                .unwrap_or_else(|| DEFAULT_BADGE_KEY.to_string());
            StreamEvent::BadgeAwarded {
                turn_index: coerce_index(envelope_index)?,
                badge: Badge {
                    key,
                    reason: string_field(payload, "reason"),
                    confidence: payload.get("confidence").and_then(Value::as_f64),
                },
            }
        }
        kinds::PHASE_CHANGED => {
            let raw_phase = string_field(payload, "phase");
            let phase = ArgumentPhase::parse(&raw_phase)
                .ok_or(DecodeError::InvalidPhase { value: raw_phase })?;
            StreamEvent::PhaseChanged { phase }
        }
        kinds::SESSION_META | kinds::TURN_META => StreamEvent::SessionMeta {
            turn_index: coerce_index(envelope_index)?,
            state: string_field(payload, "state"),
            speaker_participant_id: optional_string(payload, "speaker_participant_id"),
        },
        kinds::SESSION_COMPLETED | kinds::ARGUMENT_COMPLETED => StreamEvent::SessionCompleted {
            completion: Completion {
                turn_count: coerce_optional_index(payload.get("turn_count")),
                reason: optional_string(payload, "reason"),
            },
        },
        kinds::REACTION_ADDED => {
            let emoji = optional_string(payload, "emoji")
                .unwrap_or_else(|| DEFAULT_REACTION_EMOJI.to_string());
            StreamEvent::ReactionAdded {
                reaction: Reaction {
                    emoji,
                    turn_index: coerce_optional_index(payload.get("turn_index")),
                },
            }
        }
        kinds::ERROR => StreamEvent::SessionError {
            message: optional_string(payload, "message")
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        },
        other => StreamEvent::Ignored {
            event_type: other.to_string(),
        },
    };

    Ok(Envelope {
        id: message.get("id").and_then(coerce_u64),
        argument_id: optional_string(&message, "argument_id"),
        event,
        created_at: message
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        received_at,
    })
}

// ── Coercion ────────────────────────────────────────────────────────

/// Turn index coercion: absent, null, or blank means 0.
fn coerce_index(value: Option<&Value>) -> Result<u64, DecodeError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(other) => coerce_u64(other).ok_or_else(|| DecodeError::InvalidTurnIndex {
            value: other.to_string(),
        }),
    }
}

/// Optional index: anything uncoercible reads as absent.
fn coerce_optional_index(value: Option<&Value>) -> Option<u64> {
    value.and_then(coerce_u64)
}

/// Non-negative integer from a number or numeric string. Fractions are
/// truncated.
fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.trunc() as u64)
            })
        }
        _ => None,
    }
}

/// String field with scalar stringification. Missing, null, and
/// structured values read as empty.
fn string_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Like [`string_field`], but empty reads as `None`.
fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    Some(string_field(map, key)).filter(|s| !s.is_empty())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
