use crate::belief::FrameEvidence;
use crate::config::MatchConfig;
use crate::distribution::ActionDistribution;
use crate::frame::FrameCandidate;
use crate::outcome::{MatchOutcome, ShotResult};
use crate::policy::{AllyDecision, EnemyAction};
use crate::state::{Board, Message, Sender, TurnIndex};

/// Everything needed to rebuild the state a match started from.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchGenesis {
    pub config: MatchConfig,
    pub board: Board,
}

/// Immutable account of one resolved turn.
///
/// Oracle output is archived rather than recomputed, so replaying a log never
/// calls the oracle again.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnRecord {
    pub turn: TurnIndex,
    pub messages: Vec<Message>,
    pub evidence: Vec<FrameEvidence>,
    /// Belief weights after this turn's update.
    pub belief: Vec<(FrameCandidate, f64)>,
    pub enemy_action: EnemyAction,
    pub ally_distribution: ActionDistribution,
    pub ally_degraded: bool,
    pub ally_decision: AllyDecision,
    pub shot: ShotResult,
    pub outcome: MatchOutcome,
    /// SHA-256 of the committed state after this turn.
    pub digest: [u8; 32],
}

impl TurnRecord {
    pub fn player_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .find(|message| message.sender == Sender::Player)
    }

    pub fn injected_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .find(|message| message.sender == Sender::Enemy)
    }

    pub fn degraded_calls(&self) -> usize {
        self.evidence.iter().filter(|item| item.degraded).count() + usize::from(self.ally_degraded)
    }
}

/// Accumulates a turn's inputs between phases.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct TurnDraft {
    pub turn: TurnIndex,
    pub messages: Vec<Message>,
    pub evidence: Vec<FrameEvidence>,
    pub enemy_action: Option<EnemyAction>,
    pub ally: Option<(ActionDistribution, bool, AllyDecision)>,
}

impl TurnDraft {
    pub fn new(turn: TurnIndex, messages: Vec<Message>) -> Self {
        Self {
            turn,
            messages,
            evidence: Vec::new(),
            enemy_action: None,
            ally: None,
        }
    }
}
