//! Authoritative match state.
//!
//! [`MatchState`] owns the board, the channel log, the enemy's belief and the
//! turn history. Runtime layers clone or query it but mutate it exclusively
//! through [`MatchEngine`](crate::engine::MatchEngine). Every per-role view is
//! a borrow of this one value.

mod board;
mod channel;
pub mod types;

pub use board::{Board, BoardError, CellContent, MAX_COLS};
pub use channel::{ChannelError, ChannelLog, Message, Sender};
pub use types::{
    Cell, CellParseError, Entity, EntityId, EntityKind, TurnIndex, TurnPhase, TurnState,
};

use sha2::{Digest, Sha256};

use crate::belief::BeliefState;
use crate::config::{ConfigError, MatchConfig};
use crate::engine::{TurnDraft, TurnRecord};
use crate::frame::{FrameCandidate, LoreFrame};
use crate::outcome::MatchOutcome;
use crate::policy::EnemyObservation;
use crate::view::{BoardProjection, Visibility};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchState {
    pub(crate) config: MatchConfig,
    /// Known to the player and the ally only.
    pub(crate) declared_frame: Option<LoreFrame>,
    pub(crate) board: Board,
    pub(crate) channel: ChannelLog,
    pub(crate) belief: BeliefState,
    pub(crate) turn: TurnState,
    pub(crate) outcome: MatchOutcome,
    pub(crate) chaff_remaining: u8,
    /// Cell jammed for the turn in flight.
    pub(crate) chaffed: Option<Cell>,
    pub(crate) history: Vec<TurnRecord>,
    pub(crate) draft: Option<TurnDraft>,
}

/// What the player may see: everything except the enemy's belief.
#[derive(Clone, Copy, Debug)]
pub struct PlayerView<'a> {
    pub frame: Option<&'a LoreFrame>,
    pub board: &'a Board,
    pub channel: &'a ChannelLog,
    pub outcome: MatchOutcome,
}

/// What the ally or a spectator may see: the channel and where shots landed.
#[derive(Clone, Debug)]
pub struct AllyView<'a> {
    pub channel: &'a ChannelLog,
    pub board: BoardProjection,
    pub outcome: MatchOutcome,
}

impl MatchState {
    pub fn new(
        config: MatchConfig,
        board: Board,
        declared_frame: Option<LoreFrame>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let belief = BeliefState::from_config(&config);
        let chaff_remaining = config.chaff_charges;
        Ok(Self {
            config,
            declared_frame,
            board,
            channel: ChannelLog::new(),
            belief,
            turn: TurnState::new(),
            outcome: MatchOutcome::Ongoing,
            chaff_remaining,
            chaffed: None,
            history: Vec::new(),
            draft: None,
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn channel(&self) -> &ChannelLog {
        &self.channel
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn outcome(&self) -> MatchOutcome {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn chaff_remaining(&self) -> u8 {
        self.chaff_remaining
    }

    pub fn declared_frame(&self) -> Option<&LoreFrame> {
        self.declared_frame.as_ref()
    }

    pub fn player_view(&self) -> PlayerView<'_> {
        PlayerView {
            frame: self.declared_frame.as_ref(),
            board: &self.board,
            channel: &self.channel,
            outcome: self.outcome,
        }
    }

    pub fn ally_view(&self) -> AllyView<'_> {
        AllyView {
            channel: &self.channel,
            board: self.project(Visibility::Ally),
            outcome: self.outcome,
        }
    }

    pub fn enemy_view(&self) -> EnemyObservation<'_> {
        EnemyObservation {
            belief: &self.belief,
            board: &self.board,
            chaff_remaining: self.chaff_remaining,
        }
    }

    pub fn project(&self, visibility: Visibility) -> BoardProjection {
        BoardProjection::of(&self.board, visibility)
    }

    /// SHA-256 over the replayable parts of the state.
    ///
    /// The declared frame is excluded: replays run without it.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"fireatwill/state/v1");
        hasher.update([self.board.rows(), self.board.cols()]);

        for (_, content) in self.board.cells() {
            let (tag, id) = match content {
                CellContent::Empty => (0u8, 0),
                CellContent::Ship(id) => (1, id.0),
                CellContent::Hostage(id) => (2, id.0),
                CellContent::AlreadyFired => (3, 0),
            };
            hasher.update([tag]);
            hasher.update(id.to_le_bytes());
        }
        for entity in self.board.entities() {
            hasher.update(entity.id.0.to_le_bytes());
            hasher.update([
                entity.kind as u8,
                entity.cell.row,
                entity.cell.col,
                entity.intact as u8,
            ]);
        }

        for frame in self.belief.frames() {
            match &frame.candidate {
                FrameCandidate::Named(label) => {
                    let bytes = label.label().to_lowercase().into_bytes();
                    hasher.update((bytes.len() as u32).to_le_bytes());
                    hasher.update(&bytes);
                }
                FrameCandidate::Residual => hasher.update(u32::MAX.to_le_bytes()),
            }
            hasher.update(frame.weight.to_bits().to_le_bytes());
        }

        hasher.update(self.turn.index.to_le_bytes());
        hasher.update(self.turn.phase.as_ref().as_bytes());
        hasher.update(self.outcome.as_ref().as_bytes());
        hasher.update([self.chaff_remaining]);
        hasher.update((self.channel.len() as u64).to_le_bytes());
        hasher.update((self.history.len() as u64).to_le_bytes());

        hasher.finalize().into()
    }
}
