//! Navigation pipeline phases

use serde::{Deserialize, Serialize};

/// Where the browser is in handling a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No navigation in flight
    #[default]
    Idle,
    /// Request is being assembled and offered to pre-request handlers
    Building,
    /// Transport has the request
    AwaitingExchange,
    /// New page is current and history updated
    Committed,
    /// Navigation aborted, page and history untouched
    Failed,
}

impl Phase {
    /// Check if transition to another phase is valid
    pub fn can_transition_to(&self, target: Phase) -> bool {
        match (self, target) {
            (Phase::Idle, Phase::Building) => true,
            (Phase::Building, Phase::AwaitingExchange) => true,
            // Vetoed before the transport was contacted
            (Phase::Building, Phase::Failed) => true,
            (Phase::AwaitingExchange, Phase::Committed) => true,
            (Phase::AwaitingExchange, Phase::Failed) => true,
            (Phase::Committed, Phase::Idle) => true,
            (Phase::Failed, Phase::Idle) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Building => "building",
            Phase::AwaitingExchange => "awaiting_exchange",
            Phase::Committed => "committed",
            Phase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(Phase::Idle),
            "building" => Ok(Phase::Building),
            "awaiting_exchange" => Ok(Phase::AwaitingExchange),
            "committed" => Ok(Phase::Committed),
            "failed" => Ok(Phase::Failed),
            _ => Err(format!("Unknown phase: {}", s)),
        }
    }
}
