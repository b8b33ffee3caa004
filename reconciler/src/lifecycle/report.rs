//! Derived-report fetch state.

use serde::Serialize;

use crate::model::ReportView;

/// Where the one-shot report fetch stands.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReportState {
    #[default]
    NotRequested,
    InFlight,
    Ready(ReportView),
    /// Last attempt failed; only an explicit refresh retries.
    Unavailable {
        reason: String,
    },
}

impl ReportState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn report(&self) -> Option<&ReportView> {
        match self {
            Self::Ready(report) => Some(report),
            _ => None,
        }
    }

    /// Whether the fetch has been attempted at least once.
    pub fn was_requested(&self) -> bool {
        !matches!(self, Self::NotRequested)
    }
}
