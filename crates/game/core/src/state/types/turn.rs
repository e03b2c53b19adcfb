use super::TurnIndex;

/// Phase of the turn state machine.
///
/// Phases advance strictly in declaration order. After `Resolved` the engine
/// either wraps back to `AwaitingInstruction` with the next turn index or
/// parks in `Terminal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnPhase {
    AwaitingInstruction,
    BeliefUpdated,
    EnemyActed,
    AllyDecided,
    Resolved,
    Terminal,
}

/// Turn bookkeeping: which turn is in flight and where it is in the cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnState {
    pub index: TurnIndex,
    pub phase: TurnPhase,
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            index: 0,
            phase: TurnPhase::AwaitingInstruction,
        }
    }

    /// Number of turns fully resolved so far.
    pub fn completed(&self) -> u32 {
        match self.phase {
            TurnPhase::Terminal | TurnPhase::Resolved => self.index + 1,
            _ => self.index,
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}
