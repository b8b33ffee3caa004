//! Lifecycle controller: session status, the one-shot report fetch, and
//! connection health.
//!
//! Status mirrors upstream and only moves forward. The controller itself
//! never fetches anything; it answers whether a fetch should start and the
//! engine turns that into an effect.
//!
//! ```text
//! status: waiting ──▶ running ──▶ completed ─┐
//!                         └─────▶ failed     │
//!                                            ▼
//! report: NotRequested ──▶ InFlight ──▶ Ready
//!                             │
//!                             └──▶ Unavailable ──(explicit refresh)──▶ InFlight
//! ```

pub mod health;
pub mod report;
pub mod status;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use health::ConnectionHealth;
pub use report::ReportState;
pub use status::SessionStatus;

use crate::model::ReportView;

/// Details carried by a completion signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub turn_count: Option<u64>,
    pub reason: Option<String>,
}

/// Tracks session status, report fetch, and stream health for one view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleController {
    status: SessionStatus,
    completion: Option<Completion>,
    report: ReportState,
    health: ConnectionHealth,
    report_ready_hint: bool,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Mirror an upstream status. Regressions (a stale snapshot reporting
    /// `running` after completion) are ignored. Returns whether the held
    /// status changed.
    pub fn observe_status(&mut self, observed: SessionStatus) -> bool {
        if observed == self.status {
            return false;
        }
        if !self.status.can_advance_to(observed) {
            debug!(
                held = %self.status,
                observed = %observed,
                "ignoring status regression"
            );
            return false;
        }
        info!(from = %self.status, to = %observed, "session status changed");
        self.status = observed;
        true
    }

    /// Optimistically complete on the explicit completion event. Repeated
    /// completions keep the first record. Returns whether this call
    /// completed the session.
    pub fn mark_completed(&mut self, completion: Completion) -> bool {
        if self.completion.is_none() {
            self.completion = Some(completion);
        }
        if self.status == SessionStatus::Completed {
            return false;
        }
        if self.status == SessionStatus::Failed {
            debug!("completion after failure ignored");
            return false;
        }
        info!(from = %self.status, "session completed");
        self.status = SessionStatus::Completed;
        true
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    // ── Report ──────────────────────────────────────────────────────

    /// Start the automatic fetch if the session is completed and no fetch
    /// has ever been attempted. Returns whether a fetch should be issued.
    pub fn begin_report_fetch(&mut self) -> bool {
        if self.status != SessionStatus::Completed || self.report.was_requested() {
            return false;
        }
        info!("requesting report");
        self.report = ReportState::InFlight;
        true
    }

    /// Explicit caller retry. Allowed only after completion and when no
    /// report is held or in flight.
    pub fn request_refresh(&mut self) -> bool {
        if self.status != SessionStatus::Completed {
            debug!(status = %self.status, "report refresh before completion ignored");
            return false;
        }
        match self.report {
            ReportState::NotRequested | ReportState::Unavailable { .. } => {
                info!("refreshing report");
                self.report = ReportState::InFlight;
                true
            }
            ReportState::InFlight | ReportState::Ready(_) => false,
        }
    }

    /// Accept a fetched report. Results arriving when no fetch is
    /// outstanding are dropped.
    pub fn report_loaded(&mut self, report: ReportView) -> bool {
        if !self.report.is_in_flight() {
            debug!("dropping unrequested report result");
            return false;
        }
        info!(argument_id = %report.argument_id, "report ready");
        self.report = ReportState::Ready(report);
        true
    }

    /// Record a failed fetch. Never fatal.
    pub fn report_failed(&mut self, reason: &str) -> bool {
        if !self.report.is_in_flight() {
            return false;
        }
        info!(reason, "report unavailable");
        self.report = ReportState::Unavailable {
            reason: reason.to_string(),
        };
        true
    }

    pub fn note_report_ready(&mut self) {
        self.report_ready_hint = true;
    }

    /// Whether upstream announced the report as materialized.
    pub fn report_ready_hint(&self) -> bool {
        self.report_ready_hint
    }

    pub fn report(&self) -> &ReportState {
        &self.report
    }

    // ── Connection ──────────────────────────────────────────────────

    pub fn connected(&mut self) {
        debug!("stream connected");
        self.health = ConnectionHealth::Live;
    }

    /// Flag the stream as degraded. Reconciled state is untouched.
    pub fn transport_failed(&mut self, reason: &str) {
        warn!(reason, "live stream degraded");
        self.health = ConnectionHealth::Degraded {
            reason: reason.to_string(),
        };
    }

    /// Orderly close. A degraded flag stays set.
    pub fn closed(&mut self) {
        if self.health.is_degraded() {
            return;
        }
        debug!("stream closed");
        self.health = ConnectionHealth::Closed;
    }

    pub fn health(&self) -> &ConnectionHealth {
        &self.health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WrappedReport;
    use chrono::DateTime;

    fn report() -> ReportView {
        ReportView {
            argument_id: "arg-1".into(),
            summary: "close one".into(),
            report: WrappedReport {
                who_cooked: "p1".into(),
                best_receipts: vec![],
                most_stubborn_point: "crust".into(),
                unexpected_common_ground: "basil".into(),
                momentum_shift_turn: Some(3),
                highlights: vec![],
            },
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_status_is_monotonic() {
        let mut lc = LifecycleController::new();
        assert!(lc.observe_status(SessionStatus::Running));
        assert!(lc.observe_status(SessionStatus::Completed));
        assert!(!lc.observe_status(SessionStatus::Running));
        assert_eq!(lc.status(), SessionStatus::Completed);
    }

    #[test]
    fn test_single_fetch_per_view() {
        let mut lc = LifecycleController::new();
        assert!(!lc.begin_report_fetch());

        assert!(lc.mark_completed(Completion::default()));
        assert!(lc.begin_report_fetch());
        assert!(!lc.mark_completed(Completion::default()));
        assert!(!lc.begin_report_fetch());

        assert!(lc.report_failed("Report not ready"));
        assert!(!lc.begin_report_fetch());
        assert_eq!(
            lc.report(),
            &ReportState::Unavailable {
                reason: "Report not ready".into()
            }
        );
    }

    #[test]
    fn test_refresh_retries_after_failure() {
        let mut lc = LifecycleController::new();
        assert!(!lc.request_refresh());

        lc.mark_completed(Completion::default());
        lc.begin_report_fetch();
        assert!(!lc.request_refresh());
        lc.report_failed("not ready");

        assert!(lc.request_refresh());
        assert!(lc.report_loaded(report()));
        assert!(!lc.request_refresh());
        assert_eq!(lc.report().report().unwrap().summary, "close one");
    }

    #[test]
    fn test_unrequested_report_dropped() {
        let mut lc = LifecycleController::new();
        assert!(!lc.report_loaded(report()));
        assert_eq!(lc.report(), &ReportState::NotRequested);
    }

    #[test]
    fn test_first_completion_record_kept() {
        let mut lc = LifecycleController::new();
        lc.mark_completed(Completion {
            turn_count: Some(12),
            reason: Some("max_turns".into()),
        });
        lc.mark_completed(Completion {
            turn_count: Some(99),
            reason: None,
        });
        assert_eq!(lc.completion().unwrap().turn_count, Some(12));
    }

    #[test]
    fn test_completion_after_failure_ignored() {
        let mut lc = LifecycleController::new();
        lc.observe_status(SessionStatus::Failed);
        assert!(!lc.mark_completed(Completion::default()));
        assert_eq!(lc.status(), SessionStatus::Failed);
        assert!(!lc.begin_report_fetch());
    }

    #[test]
    fn test_degraded_survives_close() {
        let mut lc = LifecycleController::new();
        lc.connected();
        assert!(lc.health().is_live());
        lc.transport_failed("connection reset");
        lc.closed();
        assert!(lc.health().is_degraded());
    }
}
