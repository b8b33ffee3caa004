//! Connection health of the live stream.

use serde::{Deserialize, Serialize};

/// Health of the one live stream feeding a session view.
///
/// ```text
/// Connecting ──▶ Live ──▶ Closed
///      │           │
///      └─────┬─────┘
///            ▼
///        Degraded   (sticky: no automatic reconnect)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionHealth {
    #[default]
    Connecting,
    Live,
    Degraded {
        reason: String,
    },
    Closed,
}

impl ConnectionHealth {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Degraded { .. } => "degraded",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degraded { reason } => write!(f, "degraded ({reason})"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ConnectionHealth::Live.to_string(), "live");
        let degraded = ConnectionHealth::Degraded {
            reason: "reset by peer".into(),
        };
        assert_eq!(degraded.to_string(), "degraded (reset by peer)");
        assert!(degraded.is_degraded());
        assert!(!degraded.is_live());
    }
}
