//! Counters over everything the engine was asked to apply.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::events::DecodeError;

/// Running totals for one engine instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    /// Inputs that reached the reducer.
    pub applied: usize,
    /// Raw messages discarded by the decoder.
    pub malformed: usize,
    /// Well-formed messages of unknown kind.
    pub ignored: usize,
    /// Replayed messages whose id was already applied.
    pub duplicates: usize,
    pub transport_errors: usize,
    pub applied_by_kind: BTreeMap<String, usize>,
    /// Most recent decode failure, for diagnostics.
    pub last_discard: Option<String>,
}

impl ApplyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&mut self, kind: &str) {
        self.applied += 1;
        *self.applied_by_kind.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn record_malformed(&mut self, err: &DecodeError) {
        self.malformed += 1;
        self.last_discard = Some(err.to_string());
    }

    pub fn record_ignored(&mut self) {
        self.ignored += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_transport_error(&mut self) {
        self.transport_errors += 1;
    }

    /// Messages dropped for any reason.
    pub fn total_dropped(&self) -> usize {
        self.malformed + self.ignored + self.duplicates
    }
}
