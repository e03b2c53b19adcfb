use chrono::{DateTime, Utc};
use fireatwill_core::{MatchGenesis, MatchState, TurnRecord};

use super::traits::TurnLog;
use super::types::LogEntry;
use super::RepositoryError;
use crate::api::{Result, RuntimeError};

/// A match rebuilt from its log.
#[derive(Clone, Debug)]
pub struct ReplayedMatch {
    pub genesis: MatchGenesis,
    pub started_at: DateTime<Utc>,
    pub records: Vec<TurnRecord>,
    pub state: MatchState,
}

/// Splits a log into its genesis and turn records.
pub fn load_log(log: &dyn TurnLog) -> Result<(MatchGenesis, DateTime<Utc>, Vec<TurnRecord>)> {
    let mut entries = log.read_all()?.into_iter();
    let (genesis, started_at) = match entries.next() {
        Some(LogEntry::Genesis {
            genesis,
            started_at,
        }) => (genesis, started_at),
        Some(LogEntry::Turn(record)) => {
            return Err(RepositoryError::CorruptedData(format!(
                "log {} starts with turn {} instead of a genesis entry",
                log.session_id(),
                record.turn
            ))
            .into());
        }
        None => {
            return Err(RepositoryError::CorruptedData(format!(
                "log {} is empty",
                log.session_id()
            ))
            .into());
        }
    };

    let records = entries
        .map(|entry| match entry {
            LogEntry::Turn(record) => Ok(record),
            LogEntry::Genesis { .. } => Err(RepositoryError::CorruptedData(
                "second genesis entry".to_string(),
            )),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((genesis, started_at, records))
}

/// Re-runs a persisted match without calling any oracle.
pub fn replay_log(log: &dyn TurnLog) -> Result<ReplayedMatch> {
    let (genesis, started_at, records) = load_log(log)?;
    let state = fireatwill_core::replay(&genesis, &records).map_err(RuntimeError::Replay)?;
    tracing::info!(
        session = log.session_id(),
        turns = records.len(),
        outcome = %state.outcome(),
        "replayed turn log"
    );
    Ok(ReplayedMatch {
        genesis,
        started_at,
        records,
        state,
    })
}
