//! Scenario tests over raw stream messages, driven through the public
//! engine API with no live connection.

use chrono::{DateTime, Utc};
use reconciler::lifecycle::ReportState;
use reconciler::model::{ArgumentControls, ArgumentView, ReportView, TurnView, WrappedReport};
use reconciler::{
    ArgumentPhase, Effect, Engine, Input, SessionSnapshot, SessionStatus, ViewSnapshot,
};
use serde_json::{json, Map, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("reconciler=debug")
        .with_test_writer()
        .try_init();
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
}

fn token(turn_index: u64, speaker: &str, fragment: &str) -> String {
    json!({
        "event_type": "turn.token",
        "turn_index": turn_index,
        "payload": {"speaker_participant_id": speaker, "token": fragment},
    })
    .to_string()
}

fn finalized(turn_index: u64, speaker: &str, content: &str, phase: &str) -> String {
    json!({
        "event_type": "turn.final",
        "turn_index": turn_index,
        "payload": {"speaker_participant_id": speaker, "content": content, "phase": phase},
    })
    .to_string()
}

fn feed(engine: &mut Engine, messages: &[String]) -> Vec<Effect> {
    messages
        .iter()
        .enumerate()
        .flat_map(|(i, raw)| engine.ingest_raw_at(raw, at(i as i64)))
        .collect()
}

fn argument(status: SessionStatus, phase: ArgumentPhase) -> ArgumentView {
    ArgumentView {
        id: "arg-1".into(),
        topic: "Is a hot dog a sandwich?".into(),
        creator_user_id: "u1".into(),
        status,
        phase,
        controls: ArgumentControls::default(),
        turn_count: 0,
        audience_mode: false,
        created_at: at(0),
        started_at: None,
        ended_at: None,
        participants: vec![],
    }
}

fn turn_view(turn_index: u64, speaker: &str, content: &str) -> TurnView {
    let mut metrics = Map::new();
    metrics.insert("is_new_claim".into(), Value::Bool(true));
    TurnView {
        id: format!("turn-{turn_index}"),
        turn_index,
        speaker_participant_id: speaker.into(),
        phase: ArgumentPhase::Opening,
        content: content.into(),
        metrics,
        model_metadata: Map::new(),
        created_at: at(turn_index as i64),
    }
}

fn report() -> ReportView {
    ReportView {
        argument_id: "arg-1".into(),
        summary: "Nobody budged.".into(),
        report: WrappedReport {
            who_cooked: "p1".into(),
            best_receipts: vec!["USDA definition".into()],
            most_stubborn_point: "bread geometry".into(),
            unexpected_common_ground: "mustard only".into(),
            momentum_shift_turn: None,
            highlights: vec![],
        },
        created_at: at(100),
    }
}

fn contents(view: &ViewSnapshot) -> Vec<(u64, &str)> {
    view.turns
        .iter()
        .map(|t| (t.turn_index, t.content.as_str()))
        .collect()
}

// ── Turns and drafts ───────────────────────────────────────────────

#[test]
fn test_fragments_then_finalization() {
    init_tracing();
    let mut engine = Engine::default();
    feed(
        &mut engine,
        &[
            token(3, "p1", "Hel"),
            token(3, "p1", "lo"),
            finalized(3, "p1", "Hello there", "opening"),
        ],
    );

    let view = engine.snapshot();
    assert!(view.draft(3).is_none());
    let turn = view.turn(3).unwrap();
    assert_eq!(turn.speaker_participant_id, "p1");
    assert_eq!(turn.content, "Hello there");
    assert_eq!(turn.phase, ArgumentPhase::Opening);
    assert_eq!(view.turns.len(), 1);
}

#[test]
fn test_draft_is_ordered_concatenation() {
    let mut engine = Engine::default();
    let fragments = ["The ", "crust ", "is ", "structural."];
    let messages: Vec<String> = fragments.iter().map(|f| token(4, "p2", f)).collect();
    feed(&mut engine, &messages);

    let view = engine.snapshot();
    let draft = view.draft(4).unwrap();
    assert_eq!(draft.content, fragments.concat());
    assert_eq!(draft.fragment_count, 4);
    assert!(view.turns.is_empty());
}

#[test]
fn test_speaker_backfilled_by_later_fragment() {
    let mut engine = Engine::default();
    feed(&mut engine, &[token(2, "", "So"), token(2, "p2", "...")]);
    let view = engine.snapshot();
    assert_eq!(view.draft(2).unwrap().speaker_participant_id, "p2");
}

#[test]
fn test_last_finalization_wins() {
    let mut engine = Engine::default();
    feed(
        &mut engine,
        &[
            token(1, "p1", "draft"),
            finalized(1, "p1", "first take", "opening"),
            finalized(1, "p1", "second take", "opening"),
            finalized(1, "p1", "final answer", "escalation"),
        ],
    );

    let view = engine.snapshot();
    assert_eq!(contents(&view), vec![(1, "final answer")]);
    assert_eq!(view.turn(1).unwrap().phase, ArgumentPhase::Escalation);
}

#[test]
fn test_identical_finalization_is_idempotent() {
    let msg = finalized(5, "p2", "same", "resolution");

    let mut once = Engine::default();
    once.ingest_raw_at(&msg, at(1));

    let mut twice = Engine::default();
    twice.ingest_raw_at(&msg, at(1));
    twice.ingest_raw_at(&msg, at(1));

    assert_eq!(once.snapshot().turns, twice.snapshot().turns);
}

#[test]
fn test_ledger_sorted_regardless_of_arrival() {
    let mut engine = Engine::default();
    feed(
        &mut engine,
        &[
            finalized(2, "p2", "two", "opening"),
            finalized(1, "p1", "one", "opening"),
            finalized(4, "p2", "four", "escalation"),
            finalized(3, "p1", "three", "escalation"),
        ],
    );
    let indices: Vec<u64> = engine.snapshot().turns.iter().map(|t| t.turn_index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
}

#[test]
fn test_finalization_without_any_fragment() {
    let mut engine = Engine::default();
    feed(&mut engine, &[finalized(7, "p1", "straight to final", "opening")]);
    let view = engine.snapshot();
    assert_eq!(contents(&view), vec![(7, "straight to final")]);
    assert!(view.drafts.is_empty());
}

// ── Side signals ───────────────────────────────────────────────────

#[test]
fn test_badge_before_finalization_survives_it() {
    let mut engine = Engine::default();
    feed(
        &mut engine,
        &[
            json!({
                "event_type": "badge.awarded",
                "turn_index": 3,
                "payload": {"badge_key": "steelman", "reason": "conceded point"},
            })
            .to_string(),
            finalized(3, "p1", "fair, but", "escalation"),
        ],
    );

    let view = engine.snapshot();
    let badges = view.badges_for(3);
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].key, "steelman");
    assert_eq!(badges[0].reason, "conceded point");
}

#[test]
fn test_reaction_log_bounded_newest_first() {
    let mut engine = Engine::default();
    let messages: Vec<String> = (0..15)
        .map(|i| {
            json!({
                "event_type": "reaction.added",
                "payload": {"emoji": format!("r{i}"), "turn_index": i},
            })
            .to_string()
        })
        .collect();
    feed(&mut engine, &messages);

    let view = engine.snapshot();
    assert_eq!(view.reactions.len(), 12);
    assert_eq!(view.reactions[0].emoji, "r14");
    assert_eq!(view.reactions[11].emoji, "r3");
}

#[test]
fn test_phase_change_updates_held_session() {
    let mut engine = Engine::default();
    engine.apply(Input::Snapshot(SessionSnapshot::argument_only(argument(
        SessionStatus::Running,
        ArgumentPhase::Opening,
    ))));
    engine.ingest_raw(r#"{"event_type":"phase.changed","payload":{"phase":"resolution"}}"#);

    let view = engine.snapshot();
    assert_eq!(view.phase, Some(ArgumentPhase::Resolution));
    assert_eq!(
        view.session.as_ref().unwrap().phase,
        ArgumentPhase::Resolution
    );
}

// ── Discards ───────────────────────────────────────────────────────

#[test]
fn test_unknown_event_kind_leaves_state_unchanged() {
    let mut engine = Engine::default();
    feed(&mut engine, &[token(1, "p1", "a"), finalized(2, "p2", "b", "opening")]);
    let before = engine.snapshot();

    let effects =
        engine.ingest_raw(r#"{"event_type":"confetti.thrown","turn_index":2,"payload":{}}"#);

    assert!(effects.is_empty());
    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.stats().ignored, 1);
}

#[test]
fn test_malformed_messages_do_not_stop_the_stream() {
    let mut engine = Engine::default();
    feed(
        &mut engine,
        &[
            "garbage".to_string(),
            r#"{"turn_index":1}"#.to_string(),
            r#"{"event_type":"turn.token","turn_index":-4,"payload":{}}"#.to_string(),
            finalized(1, "p1", "still here", "opening"),
        ],
    );
    assert_eq!(contents(&engine.snapshot()), vec![(1, "still here")]);
    assert_eq!(engine.stats().malformed, 3);
}

#[test]
fn test_reconnect_replay_is_not_reapplied() {
    let mut engine = Engine::default();
    let history: Vec<String> = vec![
        json!({"id": 1, "event_type": "turn.token", "turn_index": 1,
               "payload": {"speaker_participant_id": "p1", "token": "Hi"}})
        .to_string(),
        json!({"id": 2, "event_type": "reaction.added", "payload": {"emoji": "👏"}}).to_string(),
        json!({"id": 3, "event_type": "badge.awarded", "turn_index": 1,
               "payload": {"badge_key": "receipts", "reason": "sourced"}})
        .to_string(),
    ];
    feed(&mut engine, &history);
    // Second connection replays the same persisted events.
    feed(&mut engine, &history);

    let view = engine.snapshot();
    assert_eq!(view.draft(1).unwrap().content, "Hi");
    assert_eq!(view.reactions.len(), 1);
    assert_eq!(view.badges_for(1).len(), 1);
    assert_eq!(engine.stats().duplicates, 3);
}

// ── Lifecycle ──────────────────────────────────────────────────────

#[test]
fn test_report_fetched_once_across_repeated_completion() {
    let mut engine = Engine::default();
    let completed = r#"{"event_type":"argument.completed","payload":{"turn_count":8}}"#;

    let mut effects = engine.ingest_raw(completed);
    effects.extend(engine.ingest_raw(completed));
    effects.extend(engine.apply(Input::Snapshot(SessionSnapshot::argument_only(
        argument(SessionStatus::Completed, ArgumentPhase::Resolution),
    ))));

    assert_eq!(effects, vec![Effect::FetchReport]);
    assert_eq!(engine.snapshot().status, SessionStatus::Completed);
    assert_eq!(engine.snapshot().completion.unwrap().turn_count, Some(8));
}

#[test]
fn test_report_not_ready_is_swallowed_until_refresh() {
    let mut engine = Engine::default();
    engine.ingest_raw(r#"{"event_type":"argument.completed","payload":{}}"#);
    assert!(engine
        .apply(Input::ReportFailed("Report not ready".into()))
        .is_empty());

    let view = engine.snapshot();
    assert_eq!(view.status, SessionStatus::Completed);
    assert!(view.last_error.is_none());
    assert!(matches!(view.report, ReportState::Unavailable { .. }));

    assert_eq!(engine.apply(Input::RefreshReport), vec![Effect::FetchReport]);
    engine.apply(Input::ReportLoaded(report()));
    assert_eq!(
        engine.snapshot().report.report().unwrap().report.who_cooked,
        "p1"
    );
}

#[test]
fn test_snapshot_completion_triggers_fetch() {
    let mut engine = Engine::default();
    let effects = engine.apply(Input::Snapshot(SessionSnapshot::argument_only(argument(
        SessionStatus::Completed,
        ArgumentPhase::Resolution,
    ))));
    assert_eq!(effects, vec![Effect::FetchReport]);
}

#[test]
fn test_stale_snapshot_does_not_regress_status() {
    let mut engine = Engine::default();
    engine.ingest_raw(r#"{"event_type":"argument.completed","payload":{}}"#);
    engine.apply(Input::Snapshot(SessionSnapshot::argument_only(argument(
        SessionStatus::Running,
        ArgumentPhase::Escalation,
    ))));

    let view = engine.snapshot();
    assert_eq!(view.status, SessionStatus::Completed);
    assert_eq!(
        view.session.as_ref().unwrap().status,
        SessionStatus::Completed
    );
}

#[test]
fn test_transport_error_keeps_reconciled_state() {
    let mut engine = Engine::default();
    engine.apply(Input::Connected);
    feed(
        &mut engine,
        &[finalized(1, "p1", "kept", "opening"), token(2, "p2", "half")],
    );
    let before = engine.snapshot();

    engine.apply(Input::TransportError("connection reset".into()));
    engine.apply(Input::StreamClosed);

    let after = engine.snapshot();
    assert!(after.is_degraded());
    assert_eq!(after.turns, before.turns);
    assert_eq!(after.drafts, before.drafts);
    assert_eq!(
        after.status_line.unwrap().text,
        "live stream disconnected; refresh to retry"
    );
}

#[test]
fn test_error_event_surfaces_without_status_change() {
    let mut engine = Engine::default();
    engine.apply(Input::Snapshot(SessionSnapshot::argument_only(argument(
        SessionStatus::Running,
        ArgumentPhase::Opening,
    ))));
    engine.ingest_raw(r#"{"event_type":"error","payload":{"message":"Need at least 2 participants"}}"#);

    let view = engine.snapshot();
    assert_eq!(view.last_error.as_deref(), Some("Need at least 2 participants"));
    assert_eq!(view.status, SessionStatus::Running);
}

// ── Snapshot vs. live races ────────────────────────────────────────

#[test]
fn test_snapshot_interleaved_with_live_events() {
    let mut engine = Engine::default();
    feed(
        &mut engine,
        &[
            token(1, "p1", "Open"),
            finalized(2, "p2", "live two", "opening"),
            token(3, "p1", "thr"),
        ],
    );

    // Snapshot fetched before turn 2 was persisted, but after turn 1 was.
    engine.apply(Input::Snapshot(SessionSnapshot::new(
        argument(SessionStatus::Running, ArgumentPhase::Opening),
        vec![turn_view(1, "p1", "Opening statement")],
    )));

    let view = engine.snapshot();
    assert_eq!(
        contents(&view),
        vec![(1, "Opening statement"), (2, "live two")]
    );
    assert!(view.draft(1).is_none());
    assert_eq!(view.draft(3).unwrap().content, "thr");
    assert_eq!(view.turn(1).unwrap().id.as_deref(), Some("turn-1"));
}

#[test]
fn test_live_final_keeps_snapshot_metrics() {
    let mut engine = Engine::default();
    engine.apply(Input::Snapshot(SessionSnapshot::new(
        argument(SessionStatus::Running, ArgumentPhase::Opening),
        vec![turn_view(1, "p1", "persisted")],
    )));
    feed(&mut engine, &[finalized(1, "p1", "persisted", "opening")]);

    let view = engine.snapshot();
    let turn = view.turn(1).unwrap();
    assert_eq!(turn.metrics["is_new_claim"], Value::Bool(true));
    assert_eq!(turn.id.as_deref(), Some("turn-1"));
}

#[test]
fn test_late_fragment_after_snapshot_turn_is_dropped() {
    let mut engine = Engine::default();
    engine.apply(Input::Snapshot(SessionSnapshot::new(
        argument(SessionStatus::Running, ArgumentPhase::Opening),
        vec![turn_view(1, "p1", "done")],
    )));
    feed(&mut engine, &[token(1, "p1", "late")]);

    let view = engine.snapshot();
    assert!(view.drafts.is_empty());
    assert_eq!(contents(&view), vec![(1, "done")]);
}

#[test]
fn test_phase_last_applied_wins_across_channels() {
    let mut engine = Engine::default();
    engine.ingest_raw(r#"{"event_type":"phase.changed","payload":{"phase":"escalation"}}"#);
    engine.apply(Input::Snapshot(SessionSnapshot::argument_only(argument(
        SessionStatus::Running,
        ArgumentPhase::Opening,
    ))));
    assert_eq!(engine.snapshot().phase, Some(ArgumentPhase::Opening));

    engine.ingest_raw(r#"{"event_type":"phase.changed","payload":{"phase":"resolution"}}"#);
    let view = engine.snapshot();
    assert_eq!(view.display_phase(), Some(ArgumentPhase::Resolution));
    assert_eq!(
        view.session.as_ref().unwrap().phase,
        ArgumentPhase::Resolution
    );
}
