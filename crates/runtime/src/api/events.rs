//! Events emitted while a match is played.
//!
//! Front-ends subscribe to [`MatchEvent`] to narrate a turn. A turn's events
//! are published together, only after the turn is committed, so observers
//! never see a turn that was later discarded.
use fireatwill_core::{
    AllyDecision, BeliefUpdate, EnemyAction, FrameCandidate, MatchOutcome, Message, TurnIndex,
    TurnRecord,
};
use serde::{Deserialize, Serialize};

/// Which interpretation call fell back to the neutral distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleCall {
    Candidate(FrameCandidate),
    Ally,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    TurnStarted {
        turn: TurnIndex,
        messages: Vec<Message>,
    },
    OracleDegraded {
        turn: TurnIndex,
        call: OracleCall,
        reason: String,
    },
    BeliefUpdated {
        turn: TurnIndex,
        update: BeliefUpdate,
    },
    EnemyActed {
        turn: TurnIndex,
        action: EnemyAction,
    },
    AllyDecided {
        turn: TurnIndex,
        decision: AllyDecision,
        degraded: bool,
    },
    TurnResolved {
        record: Box<TurnRecord>,
    },
    MatchEnded {
        turn: TurnIndex,
        outcome: MatchOutcome,
    },
    MatchAborted {
        turn: TurnIndex,
    },
}

impl MatchEvent {
    pub fn turn(&self) -> TurnIndex {
        match self {
            Self::TurnStarted { turn, .. }
            | Self::OracleDegraded { turn, .. }
            | Self::BeliefUpdated { turn, .. }
            | Self::EnemyActed { turn, .. }
            | Self::AllyDecided { turn, .. }
            | Self::MatchEnded { turn, .. }
            | Self::MatchAborted { turn } => *turn,
            Self::TurnResolved { record } => record.turn,
        }
    }
}
