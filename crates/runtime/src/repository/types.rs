use chrono::{DateTime, Utc};
use fireatwill_core::{MatchGenesis, TurnRecord};
use serde::{Deserialize, Serialize};

/// One frame of a persisted match.
///
/// A log holds exactly one `Genesis` entry, first, followed by one `Turn`
/// entry per resolved turn in order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LogEntry {
    Genesis {
        genesis: MatchGenesis,
        started_at: DateTime<Utc>,
    },
    Turn(TurnRecord),
}

impl LogEntry {
    pub fn genesis(genesis: MatchGenesis) -> Self {
        Self::Genesis {
            genesis,
            started_at: Utc::now(),
        }
    }

    pub fn as_turn(&self) -> Option<&TurnRecord> {
        match self {
            Self::Turn(record) => Some(record),
            Self::Genesis { .. } => None,
        }
    }
}
