//! Plain-text rendering of a [`ViewSnapshot`] for the terminal.

use std::fmt::Write as _;

use reconciler::model::ArgumentView;
use reconciler::{ReportState, ViewSnapshot};

/// Which side of the transcript a speaker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn marker(self) -> &'static str {
        match self {
            Self::Left => "<",
            Self::Right => ">",
        }
    }
}

/// Even seats speak from the right. An unknown speaker counts as seat 0.
pub fn side_for(session: Option<&ArgumentView>, speaker_participant_id: &str) -> Side {
    let seat = session
        .and_then(|s| s.participant(speaker_participant_id))
        .map_or(0, |p| p.seat_order);
    if seat % 2 == 0 {
        Side::Right
    } else {
        Side::Left
    }
}

/// Render the whole view. `viewer` is the local user id, used to mark the
/// viewer's own seat.
pub fn render(snapshot: &ViewSnapshot, viewer: Option<&str>) -> String {
    let mut out = String::new();
    let session = snapshot.session.as_ref();

    let topic = session.map(|s| s.topic.as_str()).unwrap_or("(loading)");
    let phase = snapshot
        .display_phase()
        .map(|p| p.as_str())
        .unwrap_or("-");
    let _ = write!(out, "{topic}\n  [{} | {phase}", snapshot.status);
    if let Some(session) = session {
        let _ = write!(
            out,
            " | ready {}/{}",
            session.ready_count(),
            session.participants.len()
        );
    }
    let _ = writeln!(out, " | {}]", snapshot.health);

    if let (Some(session), Some(viewer)) = (session, viewer) {
        if let Some(me) = session.participant_for_user(viewer) {
            let _ = writeln!(out, "  you are seat {} ({})", me.seat_order, me.id);
        }
    }
    out.push('\n');

    for turn in &snapshot.turns {
        let side = side_for(session, &turn.speaker_participant_id);
        let _ = writeln!(
            out,
            "#{:<3} {} {} ({}): {}",
            turn.turn_index,
            side.marker(),
            turn.speaker_participant_id,
            turn.phase,
            turn.content
        );
        for badge in snapshot.badges_for(turn.turn_index) {
            let _ = writeln!(out, "       * {}: {}", badge.key, badge.reason);
        }
    }
    for draft in &snapshot.drafts {
        let side = side_for(session, &draft.speaker_participant_id);
        let _ = writeln!(
            out,
            "#{:<3} {} {} (typing...): {}",
            draft.turn_index,
            side.marker(),
            draft.speaker_participant_id,
            draft.content
        );
    }

    if !snapshot.reactions.is_empty() {
        let strip: Vec<String> = snapshot
            .reactions
            .iter()
            .map(|r| match r.turn_index {
                Some(turn) => format!("{} (turn {turn})", r.emoji),
                None => r.emoji.clone(),
            })
            .collect();
        let _ = writeln!(out, "\nreactions: {}", strip.join(" "));
    }
    if let Some(line) = &snapshot.status_line {
        match &line.speaker_participant_id {
            Some(speaker) => {
                let _ = writeln!(out, "status: {} ({speaker})", line.text);
            }
            None => {
                let _ = writeln!(out, "status: {}", line.text);
            }
        }
    }
    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(out, "error: {error}");
    }

    match &snapshot.report {
        ReportState::Ready(view) => {
            let report = &view.report;
            let _ = writeln!(out, "\n== report ==\n{}", view.summary);
            let _ = writeln!(out, "who cooked: {}", report.who_cooked);
            for receipt in &report.best_receipts {
                let _ = writeln!(out, "  receipt: {receipt}");
            }
            let _ = writeln!(out, "most stubborn point: {}", report.most_stubborn_point);
            let _ = writeln!(
                out,
                "unexpected common ground: {}",
                report.unexpected_common_ground
            );
            if let Some(turn) = report.momentum_shift_turn {
                let _ = writeln!(out, "momentum shift: turn {turn}");
            }
            for highlight in &report.highlights {
                let _ = writeln!(out, "  highlight: {highlight}");
            }
        }
        ReportState::InFlight => out.push_str("\nreport: loading...\n"),
        ReportState::Unavailable { reason } => {
            let _ = writeln!(out, "\nreport unavailable: {reason} (/refresh to retry)");
        }
        ReportState::NotRequested => {}
    }
    out
}
