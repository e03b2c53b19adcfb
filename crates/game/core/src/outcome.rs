//! Shot results and match outcome evaluation.

use crate::state::{Board, Cell, EntityId};

/// What happened when the ally's decision met the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShotResult {
    Held,
    /// The cell was jammed with chaff this turn; nothing changed.
    Blocked { cell: Cell },
    Miss { cell: Cell },
    ShipDestroyed { cell: Cell, entity: EntityId },
    HostageStruck { cell: Cell, entity: EntityId },
}

impl ShotResult {
    pub fn fired_at(&self) -> Option<Cell> {
        match self {
            Self::Held => None,
            Self::Blocked { cell }
            | Self::Miss { cell }
            | Self::ShipDestroyed { cell, .. }
            | Self::HostageStruck { cell, .. } => Some(*cell),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchOutcome {
    Ongoing,
    /// The turn's shot destroyed the last remaining ship.
    ShipsAllDestroyed,
    HostageStruck,
    TurnLimitReached,
    /// No ships remain, but not because of this turn's shot.
    EnemyAssetsExhausted,
    /// Ended at a turn boundary by an abort request.
    Aborted,
}

impl MatchOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    pub fn is_victory(&self) -> bool {
        matches!(self, Self::ShipsAllDestroyed | Self::EnemyAssetsExhausted)
    }
}

/// Evaluates terminal conditions after a shot resolves.
///
/// Priority: a struck hostage ends the match regardless of anything else,
/// then destruction of the last ship, then the turn limit, then an enemy with
/// no ships left.
pub fn evaluate(
    board: &Board,
    shot: &ShotResult,
    turns_completed: u32,
    turn_limit: u32,
) -> MatchOutcome {
    let ships_left = board.ships_remaining();
    match shot {
        ShotResult::HostageStruck { .. } => MatchOutcome::HostageStruck,
        ShotResult::ShipDestroyed { .. } if ships_left == 0 => MatchOutcome::ShipsAllDestroyed,
        _ if turns_completed >= turn_limit => MatchOutcome::TurnLimitReached,
        _ if ships_left == 0 => MatchOutcome::EnemyAssetsExhausted,
        _ => MatchOutcome::Ongoing,
    }
}
