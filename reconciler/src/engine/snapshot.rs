//! Read-only view handed to the rendering layer after every input.

use std::collections::BTreeMap;

use serde::Serialize;

use super::state::{StatusLine, ViewState};
use crate::lifecycle::{Completion, ConnectionHealth, ReportState, SessionStatus};
use crate::model::ArgumentView;
use crate::signals::{Badge, Reaction};
use crate::transcript::{ArgumentPhase, Draft, Turn};

/// Owned copy of the reconciled state. Detached from the engine, so it can
/// cross a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSnapshot {
    /// Finalized turns, ascending by index.
    pub turns: Vec<Turn>,
    /// In-progress drafts, ascending by index.
    pub drafts: Vec<Draft>,
    pub badges: BTreeMap<u64, Vec<Badge>>,
    /// Newest first.
    pub reactions: Vec<Reaction>,
    /// Live phase signal.
    pub phase: Option<ArgumentPhase>,
    pub status: SessionStatus,
    pub health: ConnectionHealth,
    pub report: ReportState,
    pub report_ready_hint: bool,
    pub completion: Option<Completion>,
    pub status_line: Option<StatusLine>,
    pub last_error: Option<String>,
    pub session: Option<ArgumentView>,
}

impl ViewSnapshot {
    pub fn capture(state: &ViewState) -> Self {
        let lifecycle = state.lifecycle();
        Self {
            turns: state.transcript().ledger().as_slice().to_vec(),
            drafts: state.transcript().drafts().iter().cloned().collect(),
            badges: state.badges().to_map(),
            reactions: state.reactions().iter().cloned().collect(),
            phase: state.phase().current(),
            status: lifecycle.status(),
            health: lifecycle.health().clone(),
            report: lifecycle.report().clone(),
            report_ready_hint: lifecycle.report_ready_hint(),
            completion: lifecycle.completion().cloned(),
            status_line: state.status_line().cloned(),
            last_error: state.last_error().map(str::to_string),
            session: state.session().cloned(),
        }
    }

    pub fn turn(&self, turn_index: u64) -> Option<&Turn> {
        self.turns.iter().find(|t| t.turn_index == turn_index)
    }

    pub fn draft(&self, turn_index: u64) -> Option<&Draft> {
        self.drafts.iter().find(|d| d.turn_index == turn_index)
    }

    pub fn badges_for(&self, turn_index: u64) -> &[Badge] {
        self.badges
            .get(&turn_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The phase to display: the live signal, else the held session's.
    pub fn display_phase(&self) -> Option<ArgumentPhase> {
        self.phase
            .or_else(|| self.session.as_ref().map(|session| session.phase))
    }

    pub fn is_degraded(&self) -> bool {
        self.health.is_degraded()
    }
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self::capture(&ViewState::default())
    }
}
