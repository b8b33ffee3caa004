//! The reducer: `(state, input) -> effects`.
//!
//! Every input is applied as one synchronous transition over the owned
//! [`ViewState`]. Asynchronous sources (live stream, snapshot fetch,
//! report fetch, action calls) only enqueue inputs; none of them touch
//! the state directly. Work the reducer cannot do itself is returned as
//! an [`Effect`] for the caller to run.

use tracing::{debug, info, warn};

use super::state::{SessionAction, StatusLine, ViewState, DISCONNECTED_MESSAGE};
use crate::events::{Envelope, StreamEvent};
use crate::model::{ReportView, SessionSnapshot};
use crate::transcript::Turn;

/// Report-ready marker carried in a meta state.
pub const REPORT_READY_STATE: &str = "report_ready";

/// Something the engine needs applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A decoded live event.
    Stream(Envelope),
    /// Out-of-band snapshot (initial load or post-action refresh).
    Snapshot(SessionSnapshot),
    Connected,
    /// Transport-level failure on the live stream.
    TransportError(String),
    StreamClosed,
    ReportLoaded(ReportView),
    ReportFailed(String),
    /// Caller-initiated report retry.
    RefreshReport,
    ActionSucceeded {
        action: SessionAction,
        message: String,
    },
    /// Upstream rejected an action; `message` is shown verbatim.
    ActionFailed {
        action: SessionAction,
        message: String,
    },
}

impl Input {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stream(envelope) => envelope.event.kind(),
            Self::Snapshot(_) => "snapshot",
            Self::Connected => "connected",
            Self::TransportError(_) => "transport_error",
            Self::StreamClosed => "stream_closed",
            Self::ReportLoaded(_) => "report_loaded",
            Self::ReportFailed(_) => "report_failed",
            Self::RefreshReport => "refresh_report",
            Self::ActionSucceeded { .. } => "action_succeeded",
            Self::ActionFailed { .. } => "action_failed",
        }
    }
}

/// Work requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the derived report and feed the result back as
    /// [`Input::ReportLoaded`] or [`Input::ReportFailed`].
    FetchReport,
}

/// Apply one input. Never fails; inputs that cannot be used leave the
/// state unchanged.
pub fn reduce(state: &mut ViewState, input: Input) -> Vec<Effect> {
    let mut effects = Vec::new();
    match input {
        Input::Stream(envelope) => apply_event(state, envelope, &mut effects),
        Input::Snapshot(snapshot) => apply_snapshot(state, snapshot, &mut effects),
        Input::Connected => state.lifecycle.connected(),
        Input::TransportError(reason) => {
            state.lifecycle.transport_failed(&reason);
            state.status_line = Some(StatusLine::new(DISCONNECTED_MESSAGE));
        }
        Input::StreamClosed => state.lifecycle.closed(),
        Input::ReportLoaded(report) => {
            state.lifecycle.report_loaded(report);
        }
        Input::ReportFailed(reason) => {
            state.lifecycle.report_failed(&reason);
        }
        Input::RefreshReport => {
            if state.lifecycle.request_refresh() {
                effects.push(Effect::FetchReport);
            }
        }
        Input::ActionSucceeded { action, message } => {
            debug!(%action, "action succeeded");
            state.last_error = None;
            if !message.is_empty() {
                state.status_line = Some(StatusLine::new(message));
            }
        }
        Input::ActionFailed { action, message } => {
            warn!(%action, %message, "action failed");
            state.last_error = Some(message);
        }
    }
    effects
}

fn apply_event(state: &mut ViewState, envelope: Envelope, effects: &mut Vec<Effect>) {
    let occurred_at = envelope.occurred_at();
    match envelope.event {
        StreamEvent::TurnToken {
            turn_index,
            speaker_participant_id,
            token,
        } => {
            state
                .transcript
                .apply_fragment(turn_index, &speaker_participant_id, &token);
        }
        StreamEvent::TurnFinal {
            turn_index,
            turn_id,
            speaker_participant_id,
            content,
            phase,
        } => {
            let turn = Turn::finalized(
                turn_index,
                &speaker_participant_id,
                &content,
                phase,
                occurred_at,
            )
            .with_id(turn_id);
            let upsert = state.transcript.finalize(turn);
            debug!(turn_index, ?upsert, "turn finalized");
        }
        StreamEvent::BadgeAwarded { turn_index, badge } => {
            debug!(turn_index, key = %badge.key, "badge awarded");
            state.badges.award(turn_index, badge);
        }
        StreamEvent::PhaseChanged { phase } => {
            if state.phase.set(phase) {
                info!(%phase, "phase changed");
            }
            if let Some(session) = state.session.as_mut() {
                session.phase = phase;
            }
        }
        StreamEvent::SessionMeta {
            state: meta_state,
            speaker_participant_id,
            ..
        } => {
            if meta_state == REPORT_READY_STATE {
                state.lifecycle.note_report_ready();
            }
            if !meta_state.is_empty() {
                state.status_line = Some(StatusLine {
                    text: meta_state,
                    speaker_participant_id,
                });
            }
        }
        StreamEvent::SessionCompleted { completion } => {
            state.lifecycle.mark_completed(completion);
            sync_session_status(state);
            if state.lifecycle.begin_report_fetch() {
                effects.push(Effect::FetchReport);
            }
        }
        StreamEvent::ReactionAdded { reaction } => state.reactions.push(reaction),
        StreamEvent::SessionError { message } => {
            warn!(%message, "session error from upstream");
            state.last_error = Some(message);
        }
        StreamEvent::Ignored { event_type } => {
            debug!(%event_type, "ignoring unknown event kind");
        }
    }
}

fn apply_snapshot(state: &mut ViewState, snapshot: SessionSnapshot, effects: &mut Vec<Effect>) {
    let SessionSnapshot { argument, turns } = snapshot;
    debug!(
        argument_id = %argument.id,
        status = %argument.status,
        turns = turns.len(),
        "applying snapshot"
    );

    state.lifecycle.observe_status(argument.status);
    state.phase.set(argument.phase);
    state.session = Some(argument);
    sync_session_status(state);

    for view in turns {
        state.transcript.finalize(Turn::from(view));
    }

    if state.lifecycle.begin_report_fetch() {
        effects.push(Effect::FetchReport);
    }
}

/// Keep the held session's status in line with the lifecycle mirror.
fn sync_session_status(state: &mut ViewState) {
    let status = state.lifecycle.status();
    if let Some(session) = state.session.as_mut() {
        session.status = status;
    }
}
