//! Argument, participant, and control types as served by the upstream API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::SessionStatus;
use crate::transcript::ArgumentPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArgumentShape {
    #[default]
    QuickSkirmish,
    ProperThrowdown,
    SlowBurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinCondition {
    #[default]
    BeRight,
    FindOverlap,
    ExposeWeakPoints,
    UnderstandOtherSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaceMode {
    Fast,
    #[default]
    Normal,
    Dramatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceMode {
    #[default]
    Freeform,
    ReceiptsPreferred,
}

/// Behavioural rules the generated turns are held to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guardrails {
    pub no_personal_attacks: bool,
    pub no_moral_absolutism: bool,
    pub no_hypotheticals: bool,
    pub steelman_before_rebuttal: bool,
    pub stay_on_topic: bool,
}

impl Default for Guardrails {
    fn default() -> Self {
        Self {
            no_personal_attacks: true,
            no_moral_absolutism: false,
            no_hypotheticals: false,
            steelman_before_rebuttal: false,
            stay_on_topic: true,
        }
    }
}

/// Creation-time knobs for an argument. Missing fields take upstream defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentControls {
    /// 0 (heated) to 100 (composed).
    pub argument_composure: u8,
    pub argument_shape: ArgumentShape,
    pub win_condition: WinCondition,
    pub guardrails: Guardrails,
    pub audience_mode: bool,
    pub pace_mode: PaceMode,
    pub evidence_mode: EvidenceMode,
}

impl Default for ArgumentControls {
    fn default() -> Self {
        Self {
            argument_composure: 45,
            argument_shape: ArgumentShape::default(),
            win_condition: WinCondition::default(),
            guardrails: Guardrails::default(),
            audience_mode: false,
            pace_mode: PaceMode::default(),
            evidence_mode: EvidenceMode::default(),
        }
    }
}

/// A participant's declared position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaSnapshot {
    pub stance: String,
    pub defend_points: Vec<String>,
    #[serde(default)]
    pub red_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub user_id: String,
    pub seat_order: u32,
    pub ready: bool,
    #[serde(default)]
    pub persona_snapshot: Option<PersonaSnapshot>,
}

/// Full session view returned by the snapshot fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentView {
    pub id: String,
    pub topic: String,
    pub creator_user_id: String,
    pub status: SessionStatus,
    pub phase: ArgumentPhase,
    #[serde(default)]
    pub controls: ArgumentControls,
    #[serde(default)]
    pub turn_count: u64,
    #[serde(default)]
    pub audience_mode: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl ArgumentView {
    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    /// The participant seat held by `user_id`, if any.
    pub fn participant_for_user(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn ready_count(&self) -> usize {
        self.participants.iter().filter(|p| p.ready).count()
    }
}

/// Row in the caller's argument listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentListItem {
    pub id: String,
    pub topic: String,
    pub status: SessionStatus,
    pub phase: ArgumentPhase,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MyArgumentsResponse {
    pub active: Vec<ArgumentListItem>,
    pub past: Vec<ArgumentListItem>,
    pub credits_balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteRole {
    Participant,
    Spectator,
}

impl InviteRole {
    /// Default invite lifetime: four hours for participants, a day for spectators.
    pub fn default_expiry_minutes(self) -> u32 {
        match self {
            Self::Participant => 240,
            Self::Spectator => 1440,
        }
    }
}

impl std::fmt::Display for InviteRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Participant => write!(f, "participant"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteView {
    pub token: String,
    pub role: InviteRole,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub argument_id: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartStatus {
    Started,
    AlreadyStarted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub argument_id: String,
    pub status: StartStatus,
}

/// Bare acknowledgement body (`{"ok": true}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

// ── Request bodies ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateArgumentRequest {
    pub topic: String,
    #[serde(default)]
    pub controls: ArgumentControls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInviteRequest {
    pub role: InviteRole,
    pub expires_in_minutes: u32,
}

impl CreateInviteRequest {
    pub fn for_role(role: InviteRole) -> Self {
        Self {
            role,
            expires_in_minutes: role.default_expiry_minutes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartArgumentRequest {
    /// Lets upstream collapse retried starts into one.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRequest {
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<u64>,
}
