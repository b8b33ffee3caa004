//! Stream reconciliation engine.
//!
//! ```text
//!  raw message ──▶ decode ──▶ dedup (persisted id) ──▶ reduce ──▶ ViewState
//!                    │              │                    │
//!                 Discard       Duplicate             Effects
//!                (counted)      (counted)      (FetchReport, run by caller)
//! ```
//!
//! One [`Engine`] per session view. It is not shared between streams and
//! holds no process-wide state.

pub mod reducer;
pub mod snapshot;
pub mod state;
pub mod stats;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::events::{decode, Decoded};

pub use reducer::{reduce, Effect, Input, REPORT_READY_STATE};
pub use snapshot::ViewSnapshot;
pub use state::{EngineConfig, SessionAction, StatusLine, ViewState, DISCONNECTED_MESSAGE};
pub use stats::ApplyStats;

/// Owns the view state for one session and applies inputs to it in
/// arrival order.
#[derive(Debug, Clone)]
pub struct Engine {
    state: ViewState,
    applied_ids: HashSet<u64>,
    stats: ApplyStats,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: ViewState::new(config),
            applied_ids: HashSet::new(),
            stats: ApplyStats::new(),
        }
    }

    /// Decode and apply one raw stream message, stamped with the current
    /// time.
    pub fn ingest_raw(&mut self, raw: &str) -> Vec<Effect> {
        self.ingest_raw_at(raw, Utc::now())
    }

    /// Decode and apply one raw stream message received at `received_at`.
    pub fn ingest_raw_at(&mut self, raw: &str, received_at: DateTime<Utc>) -> Vec<Effect> {
        match decode(raw, received_at) {
            Decoded::Event(envelope) => self.apply(Input::Stream(envelope)),
            Decoded::Discard(err) => {
                debug!(error = %err, "discarding malformed message");
                self.stats.record_malformed(&err);
                Vec::new()
            }
        }
    }

    /// Apply one input. Replayed stream events are dropped by persisted id.
    pub fn apply(&mut self, input: Input) -> Vec<Effect> {
        let mut ignored = false;
        match &input {
            Input::Stream(envelope) => {
                if let Some(id) = envelope.id {
                    if !self.applied_ids.insert(id) {
                        debug!(id, kind = envelope.event.kind(), "dropping replayed event");
                        self.stats.record_duplicate();
                        return Vec::new();
                    }
                }
                ignored = envelope.event.is_ignored();
            }
            Input::TransportError(_) => self.stats.record_transport_error(),
            _ => {}
        }

        if ignored {
            self.stats.record_ignored();
        } else {
            self.stats.record_applied(input.kind());
        }
        reduce(&mut self.state, input)
    }

    /// Fresh read-only copy of the reconciled state.
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot::capture(&self.state)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn stats(&self) -> &ApplyStats {
        &self.stats
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replayed_ids_are_applied_once() {
        let mut engine = Engine::default();
        let raw = r#"{"id":7,"event_type":"reaction.added","payload":{"emoji":"🔥"}}"#;
        engine.ingest_raw(raw);
        engine.ingest_raw(raw);

        assert_eq!(engine.snapshot().reactions.len(), 1);
        assert_eq!(engine.stats().duplicates, 1);
        assert_eq!(engine.stats().applied, 1);
    }

    #[test]
    fn test_messages_without_id_are_never_suppressed() {
        let mut engine = Engine::default();
        let raw = r#"{"event_type":"reaction.added","payload":{"emoji":"🔥"}}"#;
        engine.ingest_raw(raw);
        engine.ingest_raw(raw);
        assert_eq!(engine.snapshot().reactions.len(), 2);
        assert_eq!(engine.stats().duplicates, 0);
    }

    #[test]
    fn test_malformed_is_counted_not_applied() {
        let mut engine = Engine::default();
        let before = engine.snapshot();
        assert!(engine.ingest_raw("not json at all").is_empty());
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.stats().malformed, 1);
        assert!(engine.stats().last_discard.is_some());
    }

    #[test]
    fn test_ignored_kind_is_counted() {
        let mut engine = Engine::default();
        engine.ingest_raw(r#"{"event_type":"confetti.thrown","payload":{}}"#);
        assert_eq!(engine.stats().ignored, 1);
        assert_eq!(engine.stats().applied, 0);
    }

    #[test]
    fn test_reaction_capacity_from_config() {
        let mut engine = Engine::new(EngineConfig {
            reaction_capacity: 3,
        });
        for _ in 0..5 {
            engine.ingest_raw(r#"{"event_type":"reaction.added","payload":{}}"#);
        }
        assert_eq!(engine.snapshot().reactions.len(), 3);
    }
}
