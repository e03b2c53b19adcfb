//! Unified error types surfaced by the runtime API.
//!
//! Oracle failures never appear here: they are absorbed by the
//! interpretation adapter and reported as events.
use fireatwill_core::{
    BoardError, ConfigError, EngineError, ErrorSeverity, GameError, MatchOutcome, MatchState,
    TurnIndex,
};
use serde::Serialize;
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid match configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("invalid starting board: {0}")]
    InvalidBoard(#[from] BoardError),

    #[error("runtime requires an interpretation oracle")]
    MissingOracle,

    #[error("runtime requires a starting board")]
    MissingBoard,

    #[error("turn {turn} rejected: {source}")]
    Rejected {
        turn: TurnIndex,
        #[source]
        source: EngineError,
    },

    #[error("invariant violated during turn {turn}: {source}")]
    InvariantViolation {
        turn: TurnIndex,
        #[source]
        source: EngineError,
        dump: Box<StateDump>,
    },

    #[error("match halted after an invariant violation in turn {turn}")]
    Halted { turn: TurnIndex },

    #[error("match aborted before turn {turn}")]
    MatchAborted { turn: TurnIndex },

    #[error("match is over ({outcome})")]
    MatchFinished { outcome: MatchOutcome },

    #[error("replay failed: {0}")]
    Replay(#[source] EngineError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RuntimeError {
    /// Whether the match can keep going after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvariantViolation { .. } | Self::Halted { .. } | Self::Replay(_)
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Configuration(error) => error.severity(),
            Self::InvalidBoard(_) | Self::MissingOracle | Self::MissingBoard => {
                ErrorSeverity::Validation
            }
            Self::Rejected { source, .. } => source.severity(),
            Self::InvariantViolation { .. } | Self::Halted { .. } | Self::Replay(_) => {
                ErrorSeverity::Fatal
            }
            Self::MatchAborted { .. } | Self::MatchFinished { .. } => ErrorSeverity::Recoverable,
            Self::Repository(_) => ErrorSeverity::Internal,
        }
    }
}

/// Diagnostic snapshot taken when a turn violates an invariant.
///
/// `committed` is the state the match was rolled back to; `working` is the
/// discarded copy at the point of failure. Both are JSON.
#[derive(Debug, Clone, Serialize)]
pub struct StateDump {
    pub turn: TurnIndex,
    pub error: String,
    pub committed: String,
    pub working: String,
}

impl StateDump {
    pub fn capture(
        turn: TurnIndex,
        error: &EngineError,
        committed: &MatchState,
        working: &MatchState,
    ) -> Self {
        Self {
            turn,
            error: error.to_string(),
            committed: to_json(committed),
            working: to_json(working),
        }
    }
}

fn to_json(state: &MatchState) -> String {
    serde_json::to_string_pretty(state)
        .unwrap_or_else(|error| format!("{{\"unserializable\": \"{error}\"}}"))
}
