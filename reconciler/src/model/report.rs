//! The derived post-argument report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured recap of a finished argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedReport {
    pub who_cooked: String,
    #[serde(default)]
    pub best_receipts: Vec<String>,
    pub most_stubborn_point: String,
    pub unexpected_common_ground: String,
    #[serde(default)]
    pub momentum_shift_turn: Option<u64>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Report endpoint body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportView {
    pub argument_id: String,
    pub summary: String,
    pub report: WrappedReport,
    pub created_at: DateTime<Utc>,
}
