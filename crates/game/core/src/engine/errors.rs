//! Errors surfaced while driving a turn through the engine.

use crate::belief::BeliefError;
use crate::config::ConfigError;
use crate::error::{ErrorSeverity, GameError};
use crate::outcome::MatchOutcome;
use crate::state::{BoardError, Cell, ChannelError, EntityId, TurnIndex, TurnPhase};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("{operation} requires phase {expected}, engine is in {actual}")]
    PhaseOrder {
        operation: &'static str,
        expected: TurnPhase,
        actual: TurnPhase,
    },

    #[error("turn {turn} is already in progress")]
    Reentrant { turn: TurnIndex },

    #[error("match is over ({outcome})")]
    MatchOver { outcome: MatchOutcome },

    #[error("entity {entity} is at {actual}, not {expected}")]
    StaleReposition {
        entity: EntityId,
        expected: Cell,
        actual: Cell,
    },

    #[error("reposition {from} -> {to} exceeds range {range}")]
    RepositionTooFar { from: Cell, to: Cell, range: u8 },

    #[error("no chaff charges remain")]
    NoChaffRemaining,

    #[error("distribution is {rows}x{cols} but the board is {board_rows}x{board_cols}")]
    DistributionShape {
        rows: u8,
        cols: u8,
        board_rows: u8,
        board_cols: u8,
    },

    #[error("replay diverged from the recorded log at turn {turn}")]
    ReplayDivergence { turn: TurnIndex },

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Belief(#[from] BeliefError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MatchOver { .. } | Self::Config(_) => ErrorSeverity::Validation,
            Self::Channel(error) => error.severity(),
            Self::Board(error) => match error.severity() {
                // Any board rejection inside a turn means the engine was fed an
                // action it should never have produced.
                ErrorSeverity::Recoverable | ErrorSeverity::Validation => ErrorSeverity::Internal,
                other => other,
            },
            Self::ReplayDivergence { .. } => ErrorSeverity::Fatal,
            Self::PhaseOrder { .. }
            | Self::Reentrant { .. }
            | Self::StaleReposition { .. }
            | Self::RepositionTooFar { .. }
            | Self::NoChaffRemaining
            | Self::DistributionShape { .. }
            | Self::Belief(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::PhaseOrder { .. } => "ENGINE_PHASE_ORDER",
            Self::Reentrant { .. } => "ENGINE_REENTRANT",
            Self::MatchOver { .. } => "ENGINE_MATCH_OVER",
            Self::StaleReposition { .. } => "ENGINE_STALE_REPOSITION",
            Self::RepositionTooFar { .. } => "ENGINE_REPOSITION_TOO_FAR",
            Self::NoChaffRemaining => "ENGINE_NO_CHAFF_REMAINING",
            Self::DistributionShape { .. } => "ENGINE_DISTRIBUTION_SHAPE",
            Self::ReplayDivergence { .. } => "ENGINE_REPLAY_DIVERGENCE",
            Self::Board(error) => error.error_code(),
            Self::Channel(error) => error.error_code(),
            Self::Belief(error) => error.error_code(),
            Self::Config(error) => error.error_code(),
        }
    }
}
